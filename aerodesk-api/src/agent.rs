use aerodesk_core::purchase::{BookedFlight, Purchase};
use aerodesk_core::reports::{AgentTopCustomers, CommissionSummary};
use aerodesk_core::repository::today;
use aerodesk_core::{FlightKey, SessionContext};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::{error::AppError, params::RangeQuery, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AgentPurchaseBody {
    pub airline_name: String,
    pub flight_num: i32,
    pub customer_email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/agent/purchases", post(purchase_for_customer))
        .route("/v1/agent/bookings", get(bookings))
        .route("/v1/agent/commission", get(commission))
        .route("/v1/agent/top-customers", get(top_customers))
}

/// POST /v1/agent/purchases
async fn purchase_for_customer(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<AgentPurchaseBody>,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    let key = FlightKey::new(body.airline_name, body.flight_num);
    let purchase = state
        .purchases
        .purchase(&ctx, &key, Some(&body.customer_email))
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// GET /v1/agent/bookings
async fn bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<BookedFlight>>, AppError> {
    Ok(Json(state.purchases.agent_bookings(&ctx).await?))
}

/// GET /v1/agent/commission?start=&end=
async fn commission(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<CommissionSummary>, AppError> {
    let range = query.into_range()?;
    Ok(Json(state.reports.agent_commission(&ctx, today(), range).await?))
}

/// GET /v1/agent/top-customers
async fn top_customers(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<AgentTopCustomers>, AppError> {
    Ok(Json(state.reports.agent_top_customers(&ctx, today()).await?))
}
