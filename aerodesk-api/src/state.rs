use aerodesk_core::credentials::PasswordHasher;
use aerodesk_core::{
    AuthorizationGate, CredentialStore, FlightSearch, PurchaseRecorder, ReportService, Repositories, StaffConsole,
    TicketInventory,
};
use aerodesk_shared::Masked;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub gate: AuthorizationGate,
    pub inventory: Arc<TicketInventory>,
    pub search: Arc<FlightSearch>,
    pub purchases: Arc<PurchaseRecorder>,
    pub staff: Arc<StaffConsole>,
    pub reports: Arc<ReportService>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wires every service to the same set of repository ports.
    pub fn new(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        agent_initial_password: Masked<String>,
        auth: AuthConfig,
    ) -> Self {
        let gate = AuthorizationGate::new(repos.permissions.clone());
        let inventory = Arc::new(TicketInventory::new(repos.inventory.clone()));
        Self {
            credentials: Arc::new(CredentialStore::new(repos.users.clone(), hasher.clone())),
            search: Arc::new(FlightSearch::new(
                repos.users.clone(),
                repos.catalog.clone(),
                inventory.clone(),
            )),
            purchases: Arc::new(PurchaseRecorder::new(
                repos.users.clone(),
                repos.catalog.clone(),
                repos.purchases.clone(),
            )),
            reports: Arc::new(ReportService::new(repos.reports.clone())),
            staff: Arc::new(StaffConsole::new(
                gate.clone(),
                repos,
                inventory.clone(),
                hasher,
                agent_initial_password,
            )),
            inventory,
            gate,
            auth,
        }
    }
}
