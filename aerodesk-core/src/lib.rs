pub mod airline;
pub mod authz;
pub mod credentials;
pub mod identity;
pub mod inventory;
pub mod purchase;
pub mod reports;
pub mod repository;
pub mod search;
pub mod staff;
pub mod user;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use airline::{Airplane, Airport, Flight, FlightKey, FlightStatus};
pub use authz::AuthorizationGate;
pub use credentials::{BcryptHasher, CredentialStore, PasswordHasher};
pub use identity::{PermissionKind, PermissionSet, Principal, Role, SessionContext};
pub use inventory::TicketInventory;
pub use purchase::PurchaseRecorder;
pub use reports::ReportService;
pub use repository::Repositories;
pub use search::FlightSearch;
pub use staff::StaffConsole;

/// Error taxonomy shared by every core operation.
///
/// Store adapters translate driver errors into these kinds; the HTTP layer maps
/// each kind to a status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        CoreError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CoreError::InternalError(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

pub(crate) fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{} is required", field)));
    }
    Ok(())
}
