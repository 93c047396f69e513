use aerodesk_core::airline::ServedAirports;
use aerodesk_core::inventory::Availability;
use aerodesk_core::search::{FlightDetails, SearchCriteria};
use aerodesk_core::{Flight, FlightKey, SessionContext};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

/// Raw query string; every field is required but checked here so a missing
/// one is a 400 with a readable message rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

impl SearchParams {
    fn into_criteria(self) -> Result<SearchCriteria, AppError> {
        let missing = |field: &str| AppError::ValidationError(format!("{} is required", field));
        Ok(SearchCriteria {
            source: self.source.ok_or_else(|| missing("source"))?,
            destination: self.destination.ok_or_else(|| missing("destination"))?,
            date: self.date.ok_or_else(|| missing("date"))?,
        })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(list_flights))
        .route("/v1/flights/search", get(search_flights))
        .route("/v1/flights/{airline}/{num}", get(flight_details))
        .route("/v1/flights/{airline}/{num}/availability", get(flight_availability))
        .route("/v1/airports/served", get(served_airports))
}

/// GET /v1/flights
async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(state.search.list_flights().await?))
}

/// GET /v1/flights/search?source=&destination=&date=
async fn search_flights(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let criteria = params.into_criteria()?;
    let ctx = session.as_ref().map(|Extension(ctx)| ctx);
    Ok(Json(state.search.search(ctx, &criteria).await?))
}

/// GET /v1/flights/{airline}/{num}
async fn flight_details(
    State(state): State<AppState>,
    Path((airline, num)): Path<(String, i32)>,
) -> Result<Json<FlightDetails>, AppError> {
    let key = FlightKey::new(airline, num);
    Ok(Json(state.search.flight_details(&key).await?))
}

/// GET /v1/flights/{airline}/{num}/availability
async fn flight_availability(
    State(state): State<AppState>,
    Path((airline, num)): Path<(String, i32)>,
) -> Result<Json<Availability>, AppError> {
    let key = FlightKey::new(airline, num);
    Ok(Json(state.inventory.availability(&key).await?))
}

/// GET /v1/airports/served
async fn served_airports(State(state): State<AppState>) -> Result<Json<ServedAirports>, AppError> {
    Ok(Json(state.search.served_airports().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_search_field_is_a_validation_error() {
        let params = SearchParams {
            source: Some("JFK".to_string()),
            destination: None,
            date: NaiveDate::from_ymd_opt(2026, 11, 1),
        };
        match params.into_criteria() {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "destination is required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
