use aerodesk_core::purchase::{BookedFlight, FlightScope, Purchase};
use aerodesk_core::repository::today;
use aerodesk_core::user::CustomerProfile;
use aerodesk_core::{FlightKey, SessionContext};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::{error::AppError, params::RangeQuery, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    pub airline_name: String,
    pub flight_num: i32,
}

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    #[serde(default = "default_scope")]
    pub scope: FlightScope,
}

fn default_scope() -> FlightScope {
    FlightScope::Upcoming
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/customer/profile", get(profile))
        .route("/v1/customer/flights", get(my_flights))
        .route("/v1/customer/spending", get(spending))
        .route("/v1/customer/purchases", post(purchase))
}

/// GET /v1/customer/profile
async fn profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<CustomerProfile>, AppError> {
    Ok(Json(state.credentials.profile(&ctx).await?))
}

/// GET /v1/customer/flights?scope=upcoming|history
async fn my_flights(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Vec<BookedFlight>>, AppError> {
    Ok(Json(state.purchases.customer_flights(&ctx, query.scope).await?))
}

/// GET /v1/customer/spending
///
/// Without a window: last-year total plus the last six months by month.
/// With `start` and `end`: total and monthly breakdown for that window.
async fn spending(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, AppError> {
    let response = match query.into_range()? {
        Some(range) => Json(state.reports.spending_between(&ctx, range).await?).into_response(),
        None => Json(state.reports.spending_overview(&ctx, today()).await?).into_response(),
    };
    Ok(response)
}

/// POST /v1/customer/purchases
async fn purchase(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<PurchaseBody>,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    let key = FlightKey::new(body.airline_name, body.flight_num);
    let purchase = state.purchases.purchase(&ctx, &key, None).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}
