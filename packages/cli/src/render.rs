//! Plain-text rendering of store data for the terminal.

use std::fmt::Write as _;

use blackout_map_filter::CategoryCount;
use blackout_map_outage_models::{
    AddressInfo, FilterSelection, OutageRecord, format_duration,
};

const TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// One line per outage under a header.
pub fn outage_table(outages: &[OutageRecord]) -> String {
    if outages.is_empty() {
        return "No outages match the current filters.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:<14} {:<16} {:<16} ADDRESS",
        "ID", "TYPE", "START", "END"
    );
    let _ = writeln!(out, "{}", "-".repeat(90));
    for outage in outages {
        let _ = writeln!(
            out,
            "{:<10} {:<14} {:<16} {:<16} {}",
            outage.id,
            outage.category.label(),
            outage.start_date.format(TIME_FORMAT),
            outage.end_date.format(TIME_FORMAT),
            outage.address_line(),
        );
    }
    let _ = writeln!(out, "\n{} outage(s)", outages.len());
    out
}

/// Full detail of one outage.
pub fn outage_detail(outage: &OutageRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", outage.address_line());
    let _ = writeln!(out, "  Type:        {}", outage.category.label());
    let _ = writeln!(
        out,
        "  District:    {} ({}, {})",
        outage.district, outage.folk_district, outage.big_folk_district
    );
    let _ = writeln!(
        out,
        "  Period:      {} - {}",
        outage.start_date.format(TIME_FORMAT),
        outage.end_date.format(TIME_FORMAT)
    );
    let _ = writeln!(out, "  Duration:    {}", format_duration(outage.duration()));
    if let Some(predicted) = outage.predicted_end_date {
        let _ = writeln!(out, "  Predicted:   {}", predicted.format(TIME_FORMAT));
    }
    if !outage.description.is_empty() {
        let _ = writeln!(out, "  Description: {}", outage.description);
    }
    if let Some(building_id) = &outage.building_id {
        let _ = writeln!(out, "  Building id: {building_id}");
    }
    out
}

/// Outages at a building followed by its neighbors.
pub fn address_detail(info: &AddressInfo) -> String {
    if info.is_empty() {
        return "No outages at this address or nearby.\n".to_string();
    }

    let mut out = String::new();
    if info.outages.is_empty() {
        let _ = writeln!(out, "No outages at this address.");
    }
    for outage in &info.outages {
        out.push_str(&outage_detail(outage));
        out.push('\n');
    }

    if !info.neighbors.is_empty() {
        let _ = writeln!(out, "Nearby:");
        for neighbor in &info.neighbors {
            let _ = writeln!(
                out,
                "  {}, д. {}: {}",
                neighbor.street,
                neighbor.building,
                neighbor.category.label()
            );
        }
    }
    out
}

/// Per-category counts with a total line.
pub fn stats(counts: &[CategoryCount]) -> String {
    let mut out = String::new();
    let total: usize = counts.iter().map(|c| c.count).sum();
    for count in counts {
        let _ = writeln!(out, "{:<16} {:>5}", count.category.label(), count.count);
    }
    let _ = writeln!(out, "{:<16} {total:>5}", "Всего");
    out
}

/// One-line summary of the selection, e.g. for the interactive prompt.
pub fn selection_summary(selection: &FilterSelection) -> String {
    let mut parts = vec![selection.date.format("%d.%m.%Y").to_string()];
    if !selection.category.is_all() {
        parts.push(format!("type={}", selection.category));
    }
    if !selection.districts.is_empty() {
        parts.push(format!("districts={}", selection.districts.join(",")));
    }
    if !selection.query.trim().is_empty() {
        parts.push(format!("query={:?}", selection.query.trim()));
    }
    parts.join(" | ")
}
