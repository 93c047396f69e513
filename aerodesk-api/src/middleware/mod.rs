pub mod auth;

pub use auth::{issue_token, optional_session_middleware, session_middleware, SessionClaims};
