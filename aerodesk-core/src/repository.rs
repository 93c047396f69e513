use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::airline::{Airplane, Airport, DepartureFilter, Flight, FlightKey, FlightLoad, FlightStatus, ServedAirports};
use crate::identity::{PermissionKind, PermissionSet, Role};
use crate::inventory::{Availability, Ticket};
use crate::purchase::{BookedFlight, FlightScope, Purchase, PurchaseRequest};
use crate::reports::{
    AgentAmount, AgentTickets, CommissionSummary, CustomerAmount, CustomerTickets, DateRange, Destination,
    MonthlyAmount, MonthlyCount, RevenueSplit,
};
use crate::search::SearchCriteria;
use crate::user::{CustomerContact, CustomerProfile, StaffMember, UserDetails, UserRecord};
use crate::CoreResult;

/// Accounts of all three roles plus the agent-to-airline affiliation.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, role: Role, identifier: &str) -> CoreResult<Option<UserRecord>>;

    /// Fails with `Conflict` when the identifier is taken for that role.
    async fn insert_user(&self, details: &UserDetails, password_hash: &str) -> CoreResult<()>;

    async fn airline_exists(&self, airline_name: &str) -> CoreResult<bool>;

    async fn customer_exists(&self, email: &str) -> CoreResult<bool>;

    async fn customer_profile(&self, email: &str) -> CoreResult<Option<CustomerProfile>>;

    async fn agent_airline(&self, email: &str) -> CoreResult<Option<String>>;

    /// Creates the agent and links it to the airline atomically.
    async fn insert_affiliated_agent(
        &self,
        email: &str,
        password_hash: &str,
        booking_agent_id: i32,
        airline_name: &str,
    ) -> CoreResult<()>;

    async fn staff_airline(&self, username: &str) -> CoreResult<Option<String>>;

    async fn list_staff(&self, airline_name: &str) -> CoreResult<Vec<StaffMember>>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn has_permission(&self, username: &str, kind: PermissionKind) -> CoreResult<bool>;

    async fn permissions_of(&self, username: &str) -> CoreResult<PermissionSet>;

    /// Fails with `Conflict` when already held.
    async fn grant(&self, username: &str, kind: PermissionKind) -> CoreResult<()>;

    /// Fails with `NotFound` when not held.
    async fn revoke(&self, username: &str, kind: PermissionKind) -> CoreResult<()>;
}

/// Reference data and flight schedule.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn insert_airport(&self, airport: &Airport) -> CoreResult<()>;

    async fn airport_exists(&self, airport_name: &str) -> CoreResult<bool>;

    async fn list_airports(&self) -> CoreResult<Vec<Airport>>;

    async fn insert_airplane(&self, airplane: &Airplane) -> CoreResult<()>;

    async fn find_airplane(&self, airline_name: &str, airplane_id: i32) -> CoreResult<Option<Airplane>>;

    async fn list_airplanes(&self, airline_name: &str) -> CoreResult<Vec<Airplane>>;

    async fn find_flight(&self, key: &FlightKey) -> CoreResult<Option<Flight>>;

    async fn list_flights(&self) -> CoreResult<Vec<Flight>>;

    /// `airline` narrows results to one carrier when set.
    async fn search_flights(&self, criteria: &SearchCriteria, airline: Option<&str>) -> CoreResult<Vec<Flight>>;

    async fn served_airports(&self) -> CoreResult<ServedAirports>;

    /// Fails with `NotFound` for an unknown flight.
    async fn update_flight_status(&self, key: &FlightKey, status: FlightStatus) -> CoreResult<()>;

    async fn airline_flights(&self, airline_name: &str, filter: &DepartureFilter) -> CoreResult<Vec<FlightLoad>>;

    async fn flight_customers(&self, key: &FlightKey) -> CoreResult<Vec<CustomerContact>>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Inserts the flight and one ticket per seat in a single transaction.
    async fn create_flight_with_tickets(&self, flight: &Flight, seat_count: u32) -> CoreResult<u32>;

    /// `NotFound` for an unknown flight, `Conflict` if it already has tickets.
    async fn create_tickets_for_flight(&self, key: &FlightKey, seat_count: u32) -> CoreResult<u32>;

    async fn find_available_ticket(&self, key: &FlightKey) -> CoreResult<Option<Ticket>>;

    async fn availability(&self, key: &FlightKey) -> CoreResult<Availability>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Claims the lowest free ticket of the flight and records the purchase in
    /// one transaction.
    ///
    /// `NotFound` when the customer is unknown or no ticket is free; `Conflict`
    /// when the ticket was claimed concurrently. Nothing is written on error.
    async fn record_purchase(&self, request: &PurchaseRequest) -> CoreResult<Purchase>;

    async fn customer_flights(&self, email: &str, scope: FlightScope) -> CoreResult<Vec<BookedFlight>>;

    async fn agent_bookings(&self, booking_agent_id: i32, airline_name: &str) -> CoreResult<Vec<BookedFlight>>;
}

/// Read-only aggregations. Every window is inclusive on both ends.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn customer_monthly_spending(&self, email: &str, range: &DateRange) -> CoreResult<Vec<MonthlyAmount>>;

    async fn agent_commission(&self, booking_agent_id: i32, range: &DateRange) -> CoreResult<CommissionSummary>;

    async fn agent_top_customers_by_tickets(
        &self,
        booking_agent_id: i32,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerTickets>>;

    async fn agent_top_customers_by_commission(
        &self,
        booking_agent_id: i32,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerAmount>>;

    async fn top_agents_by_tickets(&self, airline_name: &str, range: &DateRange, limit: i64)
        -> CoreResult<Vec<AgentTickets>>;

    async fn top_agents_by_commission(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<AgentAmount>>;

    async fn frequent_customers(&self, airline_name: &str, range: &DateRange, limit: i64)
        -> CoreResult<Vec<CustomerTickets>>;

    async fn customer_flights_on_airline(&self, airline_name: &str, email: &str) -> CoreResult<Vec<Flight>>;

    async fn monthly_ticket_sales(&self, airline_name: &str, range: &DateRange) -> CoreResult<Vec<MonthlyCount>>;

    async fn revenue_split(&self, airline_name: &str, range: &DateRange) -> CoreResult<RevenueSplit>;

    /// Ranked by number of flights scheduled to arrive there.
    async fn top_destinations(&self, airline_name: &str, range: &DateRange, limit: i64)
        -> CoreResult<Vec<Destination>>;
}

/// One handle per port. Adapters usually hand out the same object for all of
/// them.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub reports: Arc<dyn ReportRepository>,
}

impl Repositories {
    pub fn from_adapter<T>(adapter: Arc<T>) -> Self
    where
        T: UserRepository
            + PermissionRepository
            + CatalogRepository
            + InventoryRepository
            + PurchaseRepository
            + ReportRepository
            + 'static,
    {
        Self {
            users: adapter.clone(),
            permissions: adapter.clone(),
            catalog: adapter.clone(),
            inventory: adapter.clone(),
            purchases: adapter.clone(),
            reports: adapter,
        }
    }
}

/// Today's date in UTC, the reference point of every purchase and report.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
