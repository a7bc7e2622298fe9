//! HTTP handler functions for the blackout map API.
//!
//! Every request answers for its own day and building. Handlers read the
//! store through its per-request queries and never touch the shared
//! selection, so concurrent browsers on different days cannot see each
//! other's data.

use actix_web::{HttpResponse, web};
use blackout_map_filter::{category_counts, filter_outages};
use blackout_map_map::GeoJsonRenderer;
use blackout_map_outage_models::OutageRecord;
use blackout_map_server_models::{
    AddressQueryParams, ApiAddressDetail, ApiCategoryCount, ApiError, ApiHealth, ApiOutage,
    ApiOutageList, ApiStatsSummary, ApiSuggestion, OutageQueryParams, SuggestionQueryParams,
};
use blackout_map_store::{DEFAULT_NEIGHBOR_LIMIT, Outcome};
use chrono::NaiveDate;

use crate::AppState;

const NOT_FOUND: &str = "Отключение не найдено";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The requested day (the store's selected day when absent) and its
/// outages, or the error response to send.
async fn day_outages(
    state: &AppState,
    date: Option<NaiveDate>,
) -> Result<(NaiveDate, Vec<OutageRecord>), HttpResponse> {
    let date = date.unwrap_or_else(|| state.store.selected_date());
    match state.store.outages_on(date).await {
        Ok(outages) => Ok((date, outages)),
        Err(error) => Err(HttpResponse::BadGateway().json(ApiError::new(error))),
    }
}

/// `GET /api/outages`
///
/// The day's outages narrowed by `category`, `districts` and `query`.
pub async fn outages(
    state: web::Data<AppState>,
    params: web::Query<OutageQueryParams>,
) -> HttpResponse {
    let (date, outages) = match day_outages(&state, params.date).await {
        Ok(day) => day,
        Err(response) => return response,
    };

    let selection = params.selection(date);
    let filtered = filter_outages(&outages, &selection);

    HttpResponse::Ok().json(ApiOutageList {
        date,
        total_count: outages.len(),
        has_active_filters: selection.has_active_filters(),
        outages: filtered.into_iter().map(ApiOutage::from).collect(),
    })
}

/// `GET /api/outages/{id}`
///
/// A single outage of the requested day. Unknown ids (stale links, other
/// days) are a 404.
pub async fn outage_by_id(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<OutageQueryParams>,
) -> HttpResponse {
    let (_, outages) = match day_outages(&state, params.date).await {
        Ok(day) => day,
        Err(response) => return response,
    };

    let id = path.into_inner();
    outages.into_iter().find(|outage| outage.id == id).map_or_else(
        || {
            log::debug!("Outage {id} not found");
            HttpResponse::NotFound().json(ApiError::new(NOT_FOUND))
        },
        |outage| HttpResponse::Ok().json(ApiOutage::from(outage)),
    )
}

/// `GET /api/map`
///
/// The filtered outages as a GeoJSON marker layer with fitted bounds.
pub async fn map(
    state: web::Data<AppState>,
    params: web::Query<OutageQueryParams>,
) -> HttpResponse {
    let (date, outages) = match day_outages(&state, params.date).await {
        Ok(day) => day,
        Err(response) => return response,
    };

    let filtered = filter_outages(&outages, &params.selection(date));
    HttpResponse::Ok().json(GeoJsonRenderer::layer_for(&filtered))
}

/// `GET /api/stats`
///
/// Per-category counts of the filtered outages.
pub async fn stats(
    state: web::Data<AppState>,
    params: web::Query<OutageQueryParams>,
) -> HttpResponse {
    let (date, outages) = match day_outages(&state, params.date).await {
        Ok(day) => day,
        Err(response) => return response,
    };

    let filtered = filter_outages(&outages, &params.selection(date));
    HttpResponse::Ok().json(ApiStatsSummary {
        date,
        total_count: filtered.len(),
        by_category: category_counts(&filtered)
            .into_iter()
            .map(ApiCategoryCount::from)
            .collect(),
    })
}

/// `GET /api/address/{building_id}`
///
/// Outages at one building and its neighbors for the requested day.
pub async fn address(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<AddressQueryParams>,
) -> HttpResponse {
    let building_id = path.into_inner();
    let date = params
        .date
        .unwrap_or_else(|| state.store.selected_date());
    let limit = params.limit_neighbors.unwrap_or(DEFAULT_NEIGHBOR_LIMIT);

    match state.store.address_info_on(&building_id, date, limit).await {
        Ok(info) => HttpResponse::Ok().json(ApiAddressDetail::new(building_id, date, info)),
        Err(error) => HttpResponse::BadGateway().json(ApiError::new(error)),
    }
}

/// `GET /api/suggestions`
///
/// Address candidates for a partial input. Inputs under three characters
/// return an empty list without contacting the backend. Debouncing
/// keystrokes is left to the client.
pub async fn suggestions(
    state: web::Data<AppState>,
    params: web::Query<SuggestionQueryParams>,
) -> HttpResponse {
    match state.store.suggestions_for(&params.input).await {
        Ok(suggestions) => HttpResponse::Ok().json(
            suggestions
                .into_iter()
                .map(ApiSuggestion::from)
                .collect::<Vec<_>>(),
        ),
        Err(error) => HttpResponse::BadGateway().json(ApiError::new(error)),
    }
}

/// `GET /api/districts`
///
/// District options for the filter UI.
pub async fn districts(state: web::Data<AppState>) -> HttpResponse {
    if state.store.fetch_district_options().await == Outcome::Failed {
        return HttpResponse::BadGateway().json(ApiError::new(
            state.store.snapshot().district_error.unwrap_or_default(),
        ));
    }
    HttpResponse::Ok().json(state.store.snapshot().districts)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use blackout_map_gateway::{GatewayConfig, HttpGateway};
    use blackout_map_store::{MemoryDateStore, OutageStore};
    use httpmock::prelude::*;

    use super::*;

    fn outage_json(id: &str, category: &str, district: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "start_date": "2024-01-15T08:00:00",
            "end_date": "2024-01-16T11:00:00",
            "description": "Плановые работы",
            "type": category,
            "building_number": 12,
            "street": "Светланская",
            "district": district,
            "folk_district": "Центр",
            "big_folk_district": "Центр",
            "city": "Владивосток",
            "coordinates": { "latitude": 43.11, "longitude": 131.88 }
        })
    }

    fn state_for(server: &MockServer) -> web::Data<AppState> {
        let mut config = GatewayConfig::default();
        config.base_url = server.base_url();
        let gateway = HttpGateway::new(config).unwrap();
        let store = OutageStore::new(
            Arc::new(gateway),
            Arc::new(MemoryDateStore::with_raw("2024-01-15")),
        );
        web::Data::new(AppState {
            store: Arc::new(store),
        })
    }

    async fn mock_outages(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/blackout/");
                then.status(200).json_body(serde_json::json!([
                    outage_json("1", "heat", "Ленинский"),
                    outage_json("2", "electricity", "Ленинский"),
                    outage_json("3", "heat", "Первомайский"),
                ]));
            })
            .await;
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn lists_filtered_outages() {
        let server = MockServer::start_async().await;
        mock_outages(&server).await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/outages?category=heat&districts=%D0%BB%D0%B5%D0%BD%D0%B8%D0%BD%D1%81%D0%BA%D0%B8%D0%B9")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["totalCount"], 3);
        assert_eq!(body["hasActiveFilters"], true);
        assert_eq!(body["outages"].as_array().unwrap().len(), 1);
        assert_eq!(body["outages"][0]["id"], "1");
        assert_eq!(body["outages"][0]["duration"], "1 дн. 3 ч.");
    }

    #[actix_web::test]
    async fn unknown_outage_id_is_404() {
        let server = MockServer::start_async().await;
        mock_outages(&server).await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/outages/nonexistent")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/outages/2").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["category"], "electricity");
    }

    #[actix_web::test]
    async fn backend_failure_is_bad_gateway() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/blackout/");
                then.status(500);
            })
            .await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/outages").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Ошибка при загрузке данных");
    }

    #[actix_web::test]
    async fn stats_and_map_follow_filters() {
        let server = MockServer::start_async().await;
        mock_outages(&server).await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalCount"], 3);
        assert_eq!(body["byCategory"][0]["category"], "electricity");
        assert_eq!(body["byCategory"][1]["count"], 2);

        let req = test::TestRequest::get()
            .uri("/api/map?category=electricity")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["markers"]["features"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["bounds"],
            serde_json::json!([131.88, 43.11, 131.88, 43.11])
        );
    }

    #[actix_web::test]
    async fn short_suggestion_input_skips_backend() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/address/");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/suggestions?input=ab")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!([]));
        mock.assert_calls_async(0).await;
    }

    fn day_json(id: &str) -> serde_json::Value {
        serde_json::json!([outage_json(id, "heat", "Ленинский")])
    }

    #[actix_web::test]
    async fn concurrent_requests_for_different_days_get_their_own_day() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/blackout/")
                    .query_param("date", "2024-01-10T23:59:59");
                then.status(200)
                    .delay(std::time::Duration::from_millis(300))
                    .json_body(day_json("day10"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/blackout/")
                    .query_param("date", "2024-01-11T23:59:59");
                then.status(200).json_body(day_json("day11"));
            })
            .await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let earlier = test::TestRequest::get()
            .uri("/api/outages?date=2024-01-10")
            .to_request();
        let later = test::TestRequest::get()
            .uri("/api/outages?date=2024-01-11")
            .to_request();
        let (earlier, later) = tokio::join!(test::call_service(&app, earlier), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            test::call_service(&app, later).await
        });

        let earlier: serde_json::Value = test::read_body_json(earlier).await;
        let later: serde_json::Value = test::read_body_json(later).await;
        assert_eq!(earlier["date"], "2024-01-10");
        assert_eq!(earlier["outages"][0]["id"], "day10");
        assert_eq!(later["date"], "2024-01-11");
        assert_eq!(later["outages"][0]["id"], "day11");
    }

    #[actix_web::test]
    async fn outage_by_id_looks_in_the_requested_day() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/blackout/")
                    .query_param("date", "2024-01-10T23:59:59");
                then.status(200).json_body(day_json("day10"));
            })
            .await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/outages/day10?date=2024-01-10")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    fn address_json(outage_id: &str) -> serde_json::Value {
        serde_json::json!({
            "blackouts": [outage_json(outage_id, "electricity", "Ленинский")],
            "neighbor_blackouts": []
        })
    }

    #[actix_web::test]
    async fn concurrent_address_requests_both_succeed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/blackout/by_address")
                    .query_param("building_id", "b1");
                then.status(200)
                    .delay(std::time::Duration::from_millis(300))
                    .json_body(address_json("at-b1"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/blackout/by_address")
                    .query_param("building_id", "b2");
                then.status(200).json_body(address_json("at-b2"));
            })
            .await;
        let app = test::init_service(
            App::new()
                .app_data(state_for(&server))
                .configure(crate::configure),
        )
        .await;

        let first = test::TestRequest::get()
            .uri("/api/address/b1?date=2024-01-10")
            .to_request();
        let second = test::TestRequest::get().uri("/api/address/b2").to_request();
        let (first, second) = tokio::join!(test::call_service(&app, first), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            test::call_service(&app, second).await
        });

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        let first: serde_json::Value = test::read_body_json(first).await;
        let second: serde_json::Value = test::read_body_json(second).await;
        assert_eq!(first["buildingId"], "b1");
        assert_eq!(first["date"], "2024-01-10");
        assert_eq!(second["buildingId"], "b2");
        assert_eq!(second["date"], "2024-01-15");
    }
}
