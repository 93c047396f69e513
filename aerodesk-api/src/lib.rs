use axum::{http::Method, middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod agent;
pub mod auth;
pub mod customer;
pub mod error;
pub mod middleware;
pub mod params;
pub mod reports;
pub mod search;
pub mod staff;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Anyone may call these; a presented token still narrows agent searches.
    let public = Router::new()
        .merge(auth::routes())
        .merge(search::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::optional_session_middleware));

    let protected = Router::new()
        .merge(customer::routes())
        .merge(agent::routes())
        .merge(staff::routes())
        .merge(reports::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::session_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
