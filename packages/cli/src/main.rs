#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line viewer for municipal utility outages.
//!
//! Every subcommand drives the same [`OutageStore`] the API server uses.
//! With no subcommand, an interactive menu lets the user browse days,
//! refine filters and look up addresses.
//!
//! Uses `indicatif-log-bridge` (via [`blackout_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and spinners never fight for the terminal.

mod interactive;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use blackout_map_cli_utils::{MultiProgress, with_spinner};
use blackout_map_map::GeoJsonRenderer;
use blackout_map_outage_models::CategoryFilter;
use blackout_map_store::{DEFAULT_NEIGHBOR_LIMIT, OutageStore, Outcome};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blackout_map", about = "Municipal utility outage viewer")]
struct Cli {
    /// Day to show (YYYY-MM-DD). Defaults to the last selected day, or today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct FilterArgs {
    /// Category: `hot_water`, `cold_water`, `electricity`, `heat` or `all`
    #[arg(long)]
    category: Option<CategoryFilter>,
    /// Comma-separated district names (administrative or folk)
    #[arg(long)]
    districts: Option<String>,
    /// Free-text search over address, districts and description
    #[arg(long)]
    query: Option<String>,
}

impl FilterArgs {
    fn apply(self, store: &OutageStore) {
        if let Some(category) = self.category {
            store.set_category_filter(category);
        }
        if let Some(districts) = self.districts {
            store.set_district_filter(
                districts
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(query) = self.query {
            store.set_text_query(query);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the day's outages
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show one outage by id
    Show {
        /// Outage identifier
        id: String,
    },
    /// Show outages at a building and its neighbors
    Address {
        /// Backend building identifier (see `suggest`)
        building_id: String,
        /// Number of neighboring buildings to include
        #[arg(long, default_value_t = DEFAULT_NEIGHBOR_LIMIT)]
        limit_neighbors: u32,
    },
    /// Count the day's outages per category
    Stats {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List district names usable with `--districts`
    Districts,
    /// Suggest addresses for a partial input (at least 3 characters)
    Suggest {
        /// Partial street and building
        input: String,
    },
    /// Write the day's outages as a GeoJSON marker layer
    Map {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Start the API server
    Serve,
}

/// Loads the requested (or remembered) day behind a spinner, turning a
/// captured store error into a command error.
async fn load_day(
    store: &OutageStore,
    multi: &MultiProgress,
    date: Option<NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let date = date.unwrap_or_else(|| store.selected_date());
    let message = format!("Loading outages for {date}...");
    with_spinner(multi, &message, store.load_for_date(date)).await;

    match store.error() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = blackout_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let store = blackout_map_server::store_from_env()?;

    let Some(command) = cli.command else {
        if let Some(date) = cli.date {
            store.load_for_date(date).await;
        }
        return interactive::run(&store, &multi).await;
    };

    match command {
        Commands::List { filters } => {
            load_day(&store, &multi, cli.date).await?;
            filters.apply(&store);
            println!("{}", render::selection_summary(&store.selection()));
            print!("{}", render::outage_table(&store.filtered()));
        }
        Commands::Show { id } => {
            load_day(&store, &multi, cli.date).await?;
            let outage = store.lookup_by_id(&id).ok_or_else(|| {
                format!(
                    "Outage {id} not found for {}. It may have ended or belong to another day.",
                    store.selected_date()
                )
            })?;
            print!("{}", render::outage_detail(&outage));
        }
        Commands::Address {
            building_id,
            limit_neighbors,
        } => {
            if let Some(date) = cli.date {
                load_day(&store, &multi, Some(date)).await?;
            }
            let message = format!("Loading address {building_id}...");
            let outcome = with_spinner(
                &multi,
                &message,
                store.load_address_info(&building_id, limit_neighbors),
            )
            .await;
            let state = store.snapshot();
            match (outcome, state.address_info) {
                (Outcome::Applied, Some(info)) => print!("{}", render::address_detail(&info)),
                _ => return Err(state.address_error.unwrap_or_default().into()),
            }
        }
        Commands::Stats { filters } => {
            load_day(&store, &multi, cli.date).await?;
            filters.apply(&store);
            println!("{}", render::selection_summary(&store.selection()));
            print!("{}", render::stats(&store.category_stats()));
        }
        Commands::Districts => {
            if store.fetch_district_options().await == Outcome::Failed {
                return Err(store.snapshot().district_error.unwrap_or_default().into());
            }
            for district in store.snapshot().districts {
                println!("{}", district.name);
            }
        }
        Commands::Suggest { input } => {
            match store.fetch_address_suggestions(&input).await {
                Outcome::Skipped => {
                    println!("Type at least 3 characters to get suggestions.");
                }
                Outcome::Failed => {
                    return Err(store.snapshot().suggestion_error.unwrap_or_default().into());
                }
                Outcome::Applied | Outcome::Superseded => {
                    for suggestion in store.suggestions() {
                        println!("{:<12} {suggestion}", suggestion.building_id);
                    }
                }
            }
        }
        Commands::Map { filters, output } => {
            load_day(&store, &multi, cli.date).await?;
            filters.apply(&store);
            let layer = GeoJsonRenderer::layer_for(&store.filtered());
            let json = serde_json::to_string_pretty(&layer)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!(
                        "Wrote {} marker(s) to {}",
                        layer.markers.features.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
        Commands::Serve => {
            let (bind_addr, port) = blackout_map_server::bind_from_env();
            let store = Arc::clone(&store);
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(blackout_map_server::run_server(
                    store, bind_addr, port,
                ))
            })
            .await??;
        }
    }

    Ok(())
}
