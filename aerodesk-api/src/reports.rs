use aerodesk_core::reports::{CustomerTickets, RevenueComparison, TicketSales, TopAgents, TopDestinations};
use aerodesk_core::repository::today;
use aerodesk_core::{Flight, SessionContext};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};

use crate::{error::AppError, params::RangeQuery, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/staff/reports/top-agents", get(top_agents))
        .route("/v1/staff/reports/frequent-customers", get(frequent_customers))
        .route("/v1/staff/reports/customers/{email}/flights", get(customer_flights))
        .route("/v1/staff/reports/ticket-sales", get(ticket_sales))
        .route("/v1/staff/reports/revenue", get(revenue))
        .route("/v1/staff/reports/destinations", get(destinations))
}

/// GET /v1/staff/reports/top-agents
async fn top_agents(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<TopAgents>, AppError> {
    Ok(Json(state.reports.top_agents(&ctx, today()).await?))
}

/// GET /v1/staff/reports/frequent-customers
async fn frequent_customers(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<CustomerTickets>>, AppError> {
    Ok(Json(state.reports.frequent_customers(&ctx, today()).await?))
}

/// GET /v1/staff/reports/customers/{email}/flights
async fn customer_flights(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(state.reports.customer_flights(&ctx, &email).await?))
}

/// GET /v1/staff/reports/ticket-sales?start=&end=
async fn ticket_sales(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<TicketSales>, AppError> {
    let range = query.into_range()?;
    Ok(Json(state.reports.ticket_sales(&ctx, today(), range).await?))
}

/// GET /v1/staff/reports/revenue
async fn revenue(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<RevenueComparison>, AppError> {
    Ok(Json(state.reports.revenue_comparison(&ctx, today()).await?))
}

/// GET /v1/staff/reports/destinations
async fn destinations(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<TopDestinations>, AppError> {
    Ok(Json(state.reports.top_destinations(&ctx, today()).await?))
}
