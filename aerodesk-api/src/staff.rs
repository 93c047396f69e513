use aerodesk_core::airline::{FlightLoad, NewFlight};
use aerodesk_core::staff::{CreatedFlight, FlightQuery};
use aerodesk_core::user::{AgentDetails, CustomerContact, StaffMember};
use aerodesk_core::{Airplane, Airport, FlightStatus, PermissionKind, PermissionSet, SessionContext};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: FlightStatus,
}

#[derive(Debug, Deserialize)]
pub struct AirplaneBody {
    pub airplane_id: i32,
    pub seats: u32,
}

#[derive(Debug, Deserialize)]
pub struct AgentBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionBody {
    pub username: String,
    pub permission: String,
}

impl PermissionBody {
    fn kind(&self) -> Result<PermissionKind, AppError> {
        Ok(self.permission.parse::<PermissionKind>()?)
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    #[serde(flatten)]
    pub permissions: PermissionSet,
    pub description: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/me/permissions", get(my_permissions))
        .route("/v1/staff/flights", post(create_flight).get(upcoming_flights))
        .route("/v1/staff/flights/{num}/status", post(change_status))
        .route("/v1/staff/flights/{num}/customers", get(flight_customers))
        .route("/v1/staff/airplanes", post(add_airplane).get(list_airplanes))
        .route("/v1/staff/airports", post(add_airport).get(list_airports))
        .route("/v1/staff/agents", post(add_agent))
        .route("/v1/staff/permissions", post(grant_permission).delete(revoke_permission))
        .route("/v1/staff/members", get(list_members))
}

/// GET /v1/me/permissions
async fn my_permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<PermissionsResponse>, AppError> {
    state.gate.require_staff(&ctx)?;
    let permissions = state.gate.permissions(&ctx).await?;
    Ok(Json(PermissionsResponse {
        description: permissions.describe(),
        permissions,
    }))
}

/// POST /v1/staff/flights
async fn create_flight(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<NewFlight>,
) -> Result<(StatusCode, Json<CreatedFlight>), AppError> {
    let created = state.staff.create_flight(&ctx, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/staff/flights?start_date=&end_date=&source_airport=&destination_airport=
async fn upcoming_flights(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<FlightLoad>>, AppError> {
    let flights = state.staff.upcoming_flights(&ctx, chrono::Utc::now(), query).await?;
    Ok(Json(flights))
}

/// POST /v1/staff/flights/{num}/status
async fn change_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(flight_num): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Result<StatusCode, AppError> {
    state.staff.change_flight_status(&ctx, flight_num, body.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/staff/flights/{num}/customers
async fn flight_customers(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(flight_num): Path<i32>,
) -> Result<Json<Vec<CustomerContact>>, AppError> {
    Ok(Json(state.staff.flight_customers(&ctx, flight_num).await?))
}

/// POST /v1/staff/airplanes
async fn add_airplane(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<AirplaneBody>,
) -> Result<(StatusCode, Json<Airplane>), AppError> {
    let airplane = state.staff.add_airplane(&ctx, body.airplane_id, body.seats).await?;
    Ok((StatusCode::CREATED, Json(airplane)))
}

/// GET /v1/staff/airplanes
async fn list_airplanes(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<Airplane>>, AppError> {
    Ok(Json(state.staff.list_airplanes(&ctx).await?))
}

/// POST /v1/staff/airports
async fn add_airport(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<Airport>,
) -> Result<(StatusCode, Json<Airport>), AppError> {
    let airport = state.staff.add_airport(&ctx, body).await?;
    Ok((StatusCode::CREATED, Json(airport)))
}

/// GET /v1/staff/airports
async fn list_airports(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<Airport>>, AppError> {
    Ok(Json(state.staff.list_airports(&ctx).await?))
}

/// POST /v1/staff/agents
async fn add_agent(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<AgentBody>,
) -> Result<(StatusCode, Json<AgentDetails>), AppError> {
    let agent = state.staff.add_booking_agent(&ctx, &body.email).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// POST /v1/staff/permissions
async fn grant_permission(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<PermissionBody>,
) -> Result<StatusCode, AppError> {
    let kind = body.kind()?;
    state.staff.grant_permission(&ctx, &body.username, kind).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/staff/permissions
async fn revoke_permission(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<PermissionBody>,
) -> Result<StatusCode, AppError> {
    let kind = body.kind()?;
    state.staff.revoke_permission(&ctx, &body.username, kind).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/staff/members
async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Vec<StaffMember>>, AppError> {
    Ok(Json(state.staff.list_staff(&ctx).await?))
}
