//! In-memory gateway for store tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use blackout_map_gateway::{GatewayError, OutageGateway};
use blackout_map_outage_models::{
    AddressInfo, AddressSuggestion, Coordinate, District, OutageCategory, OutageRecord,
};
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

#[derive(Default)]
struct Calls {
    outages: Vec<NaiveDateTime>,
    suggestions: Vec<String>,
    districts: usize,
    address: Vec<(String, NaiveDateTime, u32)>,
}

#[derive(Default)]
struct Behavior {
    outages: BTreeMap<NaiveDate, Vec<OutageRecord>>,
    holds: BTreeMap<NaiveDate, Arc<Notify>>,
    suggestion_holds: BTreeMap<String, Arc<Notify>>,
    address_holds: BTreeMap<String, Arc<Notify>>,
    district_hold: Option<Arc<Notify>>,
    fail_outages: bool,
    fail_districts: bool,
    fail_address: bool,
}

#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Calls>,
    behavior: Mutex<Behavior>,
}

fn unavailable(what: &str) -> GatewayError {
    GatewayError::Status {
        status: 503,
        url: format!("fake://{what}"),
    }
}

impl FakeGateway {
    fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn behavior(&self) -> std::sync::MutexGuard<'_, Behavior> {
        self.behavior.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_outages(&self, date: NaiveDate, outages: Vec<OutageRecord>) {
        self.behavior().outages.insert(date, outages);
    }

    /// Makes outage requests for `date` wait until the returned handle is
    /// notified.
    pub fn hold_outages(&self, date: NaiveDate) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.behavior().holds.insert(date, Arc::clone(&notify));
        notify
    }

    /// Makes suggestion requests for `input` wait until notified.
    pub fn hold_suggestions(&self, input: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.behavior()
            .suggestion_holds
            .insert(input.to_string(), Arc::clone(&notify));
        notify
    }

    /// Makes address detail requests for `building_id` wait until notified.
    pub fn hold_address(&self, building_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.behavior()
            .address_holds
            .insert(building_id.to_string(), Arc::clone(&notify));
        notify
    }

    /// Makes district requests wait until notified.
    pub fn hold_districts(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.behavior().district_hold = Some(Arc::clone(&notify));
        notify
    }

    pub fn fail_outages(&self, fail: bool) {
        self.behavior().fail_outages = fail;
    }

    pub fn fail_districts(&self, fail: bool) {
        self.behavior().fail_districts = fail;
    }

    pub fn fail_address(&self, fail: bool) {
        self.behavior().fail_address = fail;
    }

    pub fn outage_requests(&self) -> Vec<NaiveDateTime> {
        self.calls().outages.clone()
    }

    pub fn suggestion_requests(&self) -> Vec<String> {
        self.calls().suggestions.clone()
    }

    pub fn district_requests(&self) -> usize {
        self.calls().districts
    }

    pub fn address_requests(&self) -> Vec<(String, NaiveDateTime, u32)> {
        self.calls().address.clone()
    }
}

#[async_trait]
impl OutageGateway for FakeGateway {
    async fn fetch_outages(&self, as_of: NaiveDateTime) -> Result<Vec<OutageRecord>, GatewayError> {
        self.calls().outages.push(as_of);
        let date = as_of.date();

        let hold = self.behavior().holds.get(&date).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let behavior = self.behavior();
        if behavior.fail_outages {
            return Err(unavailable("outages"));
        }
        Ok(behavior.outages.get(&date).cloned().unwrap_or_default())
    }

    async fn fetch_address_suggestions(
        &self,
        input: &str,
    ) -> Result<Vec<AddressSuggestion>, GatewayError> {
        self.calls().suggestions.push(input.to_string());

        let hold = self.behavior().suggestion_holds.get(input).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        Ok(vec![AddressSuggestion {
            street: format!("{input}ская"),
            building: "1".to_string(),
            building_id: format!("{input}-1"),
        }])
    }

    async fn fetch_districts(&self) -> Result<Vec<District>, GatewayError> {
        self.calls().districts += 1;

        let hold = self.behavior().district_hold.clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if self.behavior().fail_districts {
            return Err(unavailable("districts"));
        }
        Ok(vec![
            District {
                name: "Ленинский".to_string(),
            },
            District {
                name: "Советский".to_string(),
            },
        ])
    }

    async fn fetch_address_info(
        &self,
        building_id: &str,
        as_of: NaiveDateTime,
        limit_neighbors: u32,
    ) -> Result<AddressInfo, GatewayError> {
        self.calls()
            .address
            .push((building_id.to_string(), as_of, limit_neighbors));

        let hold = self.behavior().address_holds.get(building_id).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if self.behavior().fail_address {
            return Err(unavailable("address"));
        }
        Ok(AddressInfo {
            outages: vec![outage(
                &format!("{building_id}-1"),
                OutageCategory::Heat,
                "Ленинский",
            )],
            neighbors: Vec::new(),
        })
    }
}

pub fn outage(id: &str, category: OutageCategory, district: &str) -> OutageRecord {
    let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    OutageRecord {
        id: id.to_string(),
        start_date: day.and_hms_opt(8, 0, 0).unwrap(),
        end_date: day.and_hms_opt(20, 0, 0).unwrap(),
        description: "Плановые работы".to_string(),
        category,
        building_id: Some(format!("b{id}")),
        building_number: "10".to_string(),
        street: "Светланская".to_string(),
        district: district.to_string(),
        folk_district: String::new(),
        big_folk_district: String::new(),
        city: "Владивосток".to_string(),
        coordinates: Coordinate {
            latitude: 43.115,
            longitude: 131.885,
        },
        predicted_end_date: None,
    }
}
