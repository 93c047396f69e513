//! In-memory adapters for every repository port.
//!
//! A single `RwLock` guards all state, so each port call is atomic the same
//! way a store transaction is. Used by unit tests here and by the API
//! integration tests through the `test-utils` feature.

use aerodesk_shared::Money;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::airline::{Airplane, Airport, DepartureFilter, Flight, FlightKey, FlightLoad, FlightStatus, ServedAirports};
use crate::identity::{PermissionKind, PermissionSet, Principal, Role};
use crate::inventory::{Availability, Ticket};
use crate::purchase::{BookedFlight, FlightScope, Purchase, PurchaseRequest};
use crate::reports::{
    month_key, AgentAmount, AgentTickets, CommissionSummary, CustomerAmount, CustomerTickets, DateRange, Destination,
    MonthlyAmount, MonthlyCount, RevenueSplit,
};
use crate::repository::{
    CatalogRepository, InventoryRepository, PermissionRepository, PurchaseRepository, ReportRepository,
    UserRepository,
};
use crate::search::SearchCriteria;
use crate::user::{CustomerContact, CustomerDetails, CustomerProfile, StaffDetails, StaffMember, UserDetails, UserRecord};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone)]
struct AgentRow {
    booking_agent_id: i32,
    password_hash: String,
}

#[derive(Default)]
struct State {
    airlines: BTreeSet<String>,
    customers: BTreeMap<String, (CustomerDetails, String)>,
    agents: BTreeMap<String, AgentRow>,
    agent_airlines: BTreeMap<String, String>,
    staff: BTreeMap<String, (StaffDetails, String)>,
    permissions: BTreeSet<(String, PermissionKind)>,
    airports: BTreeMap<String, Airport>,
    airplanes: BTreeMap<(String, i32), Airplane>,
    flights: BTreeMap<FlightKey, Flight>,
    tickets: BTreeMap<i64, Ticket>,
    next_ticket_id: i64,
    // keyed by ticket id, one purchase per ticket
    purchases: BTreeMap<i64, Purchase>,
}

impl State {
    fn agent_id_taken(&self, booking_agent_id: i32) -> bool {
        self.agents.values().any(|a| a.booking_agent_id == booking_agent_id)
    }

    fn agent_email(&self, booking_agent_id: i32) -> Option<&str> {
        self.agents
            .iter()
            .find(|(_, a)| a.booking_agent_id == booking_agent_id)
            .map(|(email, _)| email.as_str())
    }

    fn customer_name(&self, email: &str) -> Option<String> {
        self.customers.get(email).map(|(c, _)| c.name.clone())
    }

    fn insert_tickets(&mut self, key: &FlightKey, seat_count: u32) -> u32 {
        for _ in 0..seat_count {
            self.next_ticket_id += 1;
            self.tickets.insert(
                self.next_ticket_id,
                Ticket {
                    ticket_id: self.next_ticket_id,
                    airline_name: key.airline_name.clone(),
                    flight_num: key.flight_num,
                },
            );
        }
        seat_count
    }

    fn has_tickets(&self, key: &FlightKey) -> bool {
        self.tickets.values().any(|t| t.flight_key() == *key)
    }

    /// Purchases joined with their flight.
    fn sold(&self) -> impl Iterator<Item = (&Purchase, &Flight)> {
        self.purchases.values().filter_map(move |p| {
            self.flights
                .get(&FlightKey::new(p.airline_name.clone(), p.flight_num))
                .map(|f| (p, f))
        })
    }

    fn booked(&self, purchase: &Purchase, flight: &Flight) -> BookedFlight {
        BookedFlight {
            airline_name: flight.airline_name.clone(),
            flight_num: flight.flight_num,
            departure_airport: flight.departure_airport.clone(),
            departure_time: flight.departure_time,
            arrival_airport: flight.arrival_airport.clone(),
            arrival_time: flight.arrival_time,
            status: flight.status,
            price: flight.price,
            purchase_date: purchase.purchase_date,
            customer_email: purchase.customer_email.clone(),
        }
    }
}

/// Sorts descending by value, then ascending by key, and keeps `limit`.
fn top_n<K: Ord + Clone, V: Ord + Copy>(counts: HashMap<K, V>, limit: i64) -> Vec<(K, V)> {
    let mut rows: Vec<(K, V)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(usize::try_from(limit).unwrap_or(0));
    rows
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn purchase_count(&self) -> usize {
        self.state.read().await.purchases.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, role: Role, identifier: &str) -> CoreResult<Option<UserRecord>> {
        let state = self.state.read().await;
        let record = match role {
            Role::Customer => state.customers.get(identifier).map(|(c, hash)| UserRecord {
                principal: Principal::Customer { email: c.email.clone() },
                password_hash: hash.clone().into(),
            }),
            Role::BookingAgent => state.agents.get(identifier).map(|a| UserRecord {
                principal: Principal::BookingAgent {
                    email: identifier.to_string(),
                    booking_agent_id: a.booking_agent_id,
                },
                password_hash: a.password_hash.clone().into(),
            }),
            Role::AirlineStaff => state.staff.get(identifier).map(|(s, hash)| UserRecord {
                principal: Principal::AirlineStaff {
                    username: s.username.clone(),
                    airline_name: s.airline_name.clone(),
                },
                password_hash: hash.clone().into(),
            }),
        };
        Ok(record)
    }

    async fn insert_user(&self, details: &UserDetails, password_hash: &str) -> CoreResult<()> {
        let mut state = self.state.write().await;
        match details {
            UserDetails::Customer(c) => {
                if state.customers.contains_key(&c.email) {
                    return Err(CoreError::conflict(format!("Customer {} already exists", c.email)));
                }
                state
                    .customers
                    .insert(c.email.clone(), (c.clone(), password_hash.to_string()));
            }
            UserDetails::BookingAgent(a) => {
                if state.agents.contains_key(&a.email) || state.agent_id_taken(a.booking_agent_id) {
                    return Err(CoreError::conflict(format!("Booking agent {} already exists", a.email)));
                }
                state.agents.insert(
                    a.email.clone(),
                    AgentRow {
                        booking_agent_id: a.booking_agent_id,
                        password_hash: password_hash.to_string(),
                    },
                );
            }
            UserDetails::AirlineStaff(s) => {
                if state.staff.contains_key(&s.username) {
                    return Err(CoreError::conflict(format!("Staff member {} already exists", s.username)));
                }
                if !state.airlines.contains(&s.airline_name) {
                    return Err(CoreError::not_found(format!("Airline {} not found", s.airline_name)));
                }
                state
                    .staff
                    .insert(s.username.clone(), (s.clone(), password_hash.to_string()));
            }
        }
        Ok(())
    }

    async fn airline_exists(&self, airline_name: &str) -> CoreResult<bool> {
        Ok(self.state.read().await.airlines.contains(airline_name))
    }

    async fn customer_exists(&self, email: &str) -> CoreResult<bool> {
        Ok(self.state.read().await.customers.contains_key(email))
    }

    async fn customer_profile(&self, email: &str) -> CoreResult<Option<CustomerProfile>> {
        let state = self.state.read().await;
        Ok(state.customers.get(email).map(|(c, _)| CustomerProfile::from(c)))
    }

    async fn agent_airline(&self, email: &str) -> CoreResult<Option<String>> {
        Ok(self.state.read().await.agent_airlines.get(email).cloned())
    }

    async fn insert_affiliated_agent(
        &self,
        email: &str,
        password_hash: &str,
        booking_agent_id: i32,
        airline_name: &str,
    ) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if state.agents.contains_key(email) || state.agent_id_taken(booking_agent_id) {
            return Err(CoreError::conflict(format!("Booking agent {} already exists", email)));
        }
        if !state.airlines.contains(airline_name) {
            return Err(CoreError::not_found(format!("Airline {} not found", airline_name)));
        }
        state.agents.insert(
            email.to_string(),
            AgentRow {
                booking_agent_id,
                password_hash: password_hash.to_string(),
            },
        );
        state
            .agent_airlines
            .insert(email.to_string(), airline_name.to_string());
        Ok(())
    }

    async fn staff_airline(&self, username: &str) -> CoreResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state.staff.get(username).map(|(s, _)| s.airline_name.clone()))
    }

    async fn list_staff(&self, airline_name: &str) -> CoreResult<Vec<StaffMember>> {
        let state = self.state.read().await;
        Ok(state
            .staff
            .values()
            .filter(|(s, _)| s.airline_name == airline_name)
            .map(|(s, _)| StaffMember {
                username: s.username.clone(),
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl PermissionRepository for MemoryStore {
    async fn has_permission(&self, username: &str, kind: PermissionKind) -> CoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.permissions.contains(&(username.to_string(), kind)))
    }

    async fn permissions_of(&self, username: &str) -> CoreResult<PermissionSet> {
        let state = self.state.read().await;
        Ok(PermissionSet::from_kinds(
            state
                .permissions
                .iter()
                .filter(|(user, _)| user == username)
                .map(|(_, kind)| *kind),
        ))
    }

    async fn grant(&self, username: &str, kind: PermissionKind) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if !state.staff.contains_key(username) {
            return Err(CoreError::not_found(format!("Staff member {} not found", username)));
        }
        if !state.permissions.insert((username.to_string(), kind)) {
            return Err(CoreError::conflict(format!("{} already holds {}", username, kind)));
        }
        Ok(())
    }

    async fn revoke(&self, username: &str, kind: PermissionKind) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if !state.permissions.remove(&(username.to_string(), kind)) {
            return Err(CoreError::not_found(format!("{} does not hold {}", username, kind)));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn insert_airport(&self, airport: &Airport) -> CoreResult<()> {
        let mut state = self.state.write().await;
        if state.airports.contains_key(&airport.airport_name) {
            return Err(CoreError::conflict(format!("Airport {} already exists", airport.airport_name)));
        }
        state.airports.insert(airport.airport_name.clone(), airport.clone());
        Ok(())
    }

    async fn airport_exists(&self, airport_name: &str) -> CoreResult<bool> {
        Ok(self.state.read().await.airports.contains_key(airport_name))
    }

    async fn list_airports(&self) -> CoreResult<Vec<Airport>> {
        Ok(self.state.read().await.airports.values().cloned().collect())
    }

    async fn insert_airplane(&self, airplane: &Airplane) -> CoreResult<()> {
        let mut state = self.state.write().await;
        let key = (airplane.airline_name.clone(), airplane.airplane_id);
        if state.airplanes.contains_key(&key) {
            return Err(CoreError::conflict(format!("Airplane {} already exists", airplane.airplane_id)));
        }
        state.airplanes.insert(key, airplane.clone());
        Ok(())
    }

    async fn find_airplane(&self, airline_name: &str, airplane_id: i32) -> CoreResult<Option<Airplane>> {
        let state = self.state.read().await;
        Ok(state.airplanes.get(&(airline_name.to_string(), airplane_id)).cloned())
    }

    async fn list_airplanes(&self, airline_name: &str) -> CoreResult<Vec<Airplane>> {
        let state = self.state.read().await;
        Ok(state
            .airplanes
            .values()
            .filter(|a| a.airline_name == airline_name)
            .cloned()
            .collect())
    }

    async fn find_flight(&self, key: &FlightKey) -> CoreResult<Option<Flight>> {
        Ok(self.state.read().await.flights.get(key).cloned())
    }

    async fn list_flights(&self) -> CoreResult<Vec<Flight>> {
        let state = self.state.read().await;
        let mut flights: Vec<Flight> = state.flights.values().cloned().collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn search_flights(&self, criteria: &SearchCriteria, airline: Option<&str>) -> CoreResult<Vec<Flight>> {
        let state = self.state.read().await;
        let mut flights: Vec<Flight> = state
            .flights
            .values()
            .filter(|f| criteria.matches(f))
            .filter(|f| airline.map_or(true, |a| f.airline_name == a))
            .cloned()
            .collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn served_airports(&self) -> CoreResult<ServedAirports> {
        let state = self.state.read().await;
        let departures: BTreeSet<String> = state.flights.values().map(|f| f.departure_airport.clone()).collect();
        let arrivals: BTreeSet<String> = state.flights.values().map(|f| f.arrival_airport.clone()).collect();
        Ok(ServedAirports {
            departure_airports: departures.into_iter().collect(),
            arrival_airports: arrivals.into_iter().collect(),
        })
    }

    async fn update_flight_status(&self, key: &FlightKey, status: FlightStatus) -> CoreResult<()> {
        let mut state = self.state.write().await;
        let flight = state
            .flights
            .get_mut(key)
            .ok_or_else(|| CoreError::not_found(format!("Flight {} not found", key)))?;
        flight.status = status;
        Ok(())
    }

    async fn airline_flights(&self, airline_name: &str, filter: &DepartureFilter) -> CoreResult<Vec<FlightLoad>> {
        let state = self.state.read().await;
        let mut loads: Vec<FlightLoad> = state
            .flights
            .values()
            .filter(|f| f.airline_name == airline_name && filter.matches(f))
            .map(|f| {
                let passengers: BTreeSet<&str> = state
                    .purchases
                    .values()
                    .filter(|p| p.airline_name == f.airline_name && p.flight_num == f.flight_num)
                    .map(|p| p.customer_email.as_str())
                    .collect();
                FlightLoad {
                    flight: f.clone(),
                    num_customers: passengers.len() as i64,
                }
            })
            .collect();
        loads.sort_by_key(|l| l.flight.departure_time);
        Ok(loads)
    }

    async fn flight_customers(&self, key: &FlightKey) -> CoreResult<Vec<CustomerContact>> {
        let state = self.state.read().await;
        let emails: BTreeSet<&str> = state
            .purchases
            .values()
            .filter(|p| p.airline_name == key.airline_name && p.flight_num == key.flight_num)
            .map(|p| p.customer_email.as_str())
            .collect();
        Ok(emails
            .into_iter()
            .map(|email| CustomerContact {
                name: state.customer_name(email).unwrap_or_default(),
                email: email.to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn create_flight_with_tickets(&self, flight: &Flight, seat_count: u32) -> CoreResult<u32> {
        let mut state = self.state.write().await;
        let key = flight.key();
        if state.flights.contains_key(&key) {
            return Err(CoreError::conflict(format!("Flight {} already exists", key)));
        }
        if !state
            .airplanes
            .contains_key(&(flight.airline_name.clone(), flight.airplane_id))
        {
            return Err(CoreError::not_found(format!("Airplane {} not found", flight.airplane_id)));
        }
        for airport in [&flight.departure_airport, &flight.arrival_airport] {
            if !state.airports.contains_key(airport) {
                return Err(CoreError::not_found(format!("Airport {} not found", airport)));
            }
        }
        state.flights.insert(key.clone(), flight.clone());
        Ok(state.insert_tickets(&key, seat_count))
    }

    async fn create_tickets_for_flight(&self, key: &FlightKey, seat_count: u32) -> CoreResult<u32> {
        let mut state = self.state.write().await;
        if !state.flights.contains_key(key) {
            return Err(CoreError::not_found(format!("Flight {} not found", key)));
        }
        if state.has_tickets(key) {
            return Err(CoreError::conflict(format!("Flight {} already has tickets", key)));
        }
        Ok(state.insert_tickets(key, seat_count))
    }

    async fn find_available_ticket(&self, key: &FlightKey) -> CoreResult<Option<Ticket>> {
        let state = self.state.read().await;
        Ok(state
            .tickets
            .values()
            .find(|t| t.flight_key() == *key && !state.purchases.contains_key(&t.ticket_id))
            .cloned())
    }

    async fn availability(&self, key: &FlightKey) -> CoreResult<Availability> {
        let state = self.state.read().await;
        let (total, sold) = state
            .tickets
            .values()
            .filter(|t| t.flight_key() == *key)
            .fold((0i64, 0i64), |(total, sold), t| {
                (total + 1, sold + i64::from(state.purchases.contains_key(&t.ticket_id)))
            });
        Ok(Availability::new(total, sold))
    }
}

#[async_trait]
impl PurchaseRepository for MemoryStore {
    async fn record_purchase(&self, request: &PurchaseRequest) -> CoreResult<Purchase> {
        let mut state = self.state.write().await;
        if !state.customers.contains_key(&request.customer_email) {
            return Err(CoreError::not_found(format!("Customer {} not found", request.customer_email)));
        }
        let ticket_id = state
            .tickets
            .values()
            .find(|t| t.flight_key() == request.flight && !state.purchases.contains_key(&t.ticket_id))
            .map(|t| t.ticket_id)
            .ok_or_else(|| {
                CoreError::not_found(format!("No tickets are available for flight {}", request.flight))
            })?;

        let purchase = request.clone().into_purchase(ticket_id);
        state.purchases.insert(ticket_id, purchase.clone());
        Ok(purchase)
    }

    async fn customer_flights(&self, email: &str, scope: FlightScope) -> CoreResult<Vec<BookedFlight>> {
        let state = self.state.read().await;
        let mut flights: Vec<BookedFlight> = state
            .sold()
            .filter(|(p, f)| p.customer_email == email && scope.includes(f.status))
            .map(|(p, f)| state.booked(p, f))
            .collect();
        flights.sort_by_key(|b| b.departure_time);
        Ok(flights)
    }

    async fn agent_bookings(&self, booking_agent_id: i32, airline_name: &str) -> CoreResult<Vec<BookedFlight>> {
        let state = self.state.read().await;
        let mut flights: Vec<BookedFlight> = state
            .sold()
            .filter(|(p, f)| {
                p.booking_agent_id == Some(booking_agent_id)
                    && f.airline_name == airline_name
                    && f.status == FlightStatus::Upcoming
            })
            .map(|(p, f)| state.booked(p, f))
            .collect();
        flights.sort_by_key(|b| b.departure_time);
        Ok(flights)
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn customer_monthly_spending(&self, email: &str, range: &DateRange) -> CoreResult<Vec<MonthlyAmount>> {
        let state = self.state.read().await;
        let mut months: BTreeMap<String, Money> = BTreeMap::new();
        for (p, f) in state.sold() {
            if p.customer_email == email && range.contains(p.purchase_date) {
                let entry = months.entry(month_key(p.purchase_date)).or_default();
                *entry = *entry + f.price;
            }
        }
        Ok(months
            .into_iter()
            .map(|(month, total)| MonthlyAmount { month, total })
            .collect())
    }

    async fn agent_commission(&self, booking_agent_id: i32, range: &DateRange) -> CoreResult<CommissionSummary> {
        let state = self.state.read().await;
        let (total, count) = state
            .sold()
            .filter(|(p, _)| p.booking_agent_id == Some(booking_agent_id) && range.contains(p.purchase_date))
            .fold((Money::ZERO, 0i64), |(total, count), (_, f)| {
                (total + f.price.commission(), count + 1)
            });
        Ok(CommissionSummary::from_totals(total, count))
    }

    async fn agent_top_customers_by_tickets(
        &self,
        booking_agent_id: i32,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerTickets>> {
        let state = self.state.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (p, _) in state.sold() {
            if p.booking_agent_id == Some(booking_agent_id) && range.contains(p.purchase_date) {
                *counts.entry(p.customer_email.clone()).or_default() += 1;
            }
        }
        Ok(top_n(counts, limit)
            .into_iter()
            .map(|(email, tickets)| CustomerTickets {
                name: state.customer_name(&email),
                email,
                tickets,
            })
            .collect())
    }

    async fn agent_top_customers_by_commission(
        &self,
        booking_agent_id: i32,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerAmount>> {
        let state = self.state.read().await;
        let mut sums: HashMap<String, Money> = HashMap::new();
        for (p, f) in state.sold() {
            if p.booking_agent_id == Some(booking_agent_id) && range.contains(p.purchase_date) {
                let entry = sums.entry(p.customer_email.clone()).or_default();
                *entry = *entry + f.price.commission();
            }
        }
        Ok(top_n(sums, limit)
            .into_iter()
            .map(|(email, amount)| CustomerAmount { email, amount })
            .collect())
    }

    async fn top_agents_by_tickets(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<AgentTickets>> {
        let state = self.state.read().await;
        let mut counts: HashMap<i32, i64> = HashMap::new();
        for (p, f) in state.sold() {
            if let Some(agent) = p.booking_agent_id {
                if f.airline_name == airline_name && range.contains(p.purchase_date) {
                    *counts.entry(agent).or_default() += 1;
                }
            }
        }
        Ok(top_n(counts, limit)
            .into_iter()
            .map(|(booking_agent_id, tickets_sold)| AgentTickets {
                email: state.agent_email(booking_agent_id).unwrap_or_default().to_string(),
                booking_agent_id,
                tickets_sold,
            })
            .collect())
    }

    async fn top_agents_by_commission(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<AgentAmount>> {
        let state = self.state.read().await;
        let mut sums: HashMap<i32, Money> = HashMap::new();
        for (p, f) in state.sold() {
            if let Some(agent) = p.booking_agent_id {
                if f.airline_name == airline_name && range.contains(p.purchase_date) {
                    let entry = sums.entry(agent).or_default();
                    *entry = *entry + f.price.commission();
                }
            }
        }
        Ok(top_n(sums, limit)
            .into_iter()
            .map(|(booking_agent_id, commission)| AgentAmount {
                email: state.agent_email(booking_agent_id).unwrap_or_default().to_string(),
                booking_agent_id,
                commission,
            })
            .collect())
    }

    async fn frequent_customers(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerTickets>> {
        let state = self.state.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (p, f) in state.sold() {
            if f.airline_name == airline_name && range.contains(p.purchase_date) {
                *counts.entry(p.customer_email.clone()).or_default() += 1;
            }
        }
        Ok(top_n(counts, limit)
            .into_iter()
            .map(|(email, tickets)| CustomerTickets {
                name: state.customer_name(&email),
                email,
                tickets,
            })
            .collect())
    }

    async fn customer_flights_on_airline(&self, airline_name: &str, email: &str) -> CoreResult<Vec<Flight>> {
        let state = self.state.read().await;
        let keys: BTreeSet<FlightKey> = state
            .sold()
            .filter(|(p, f)| p.customer_email == email && f.airline_name == airline_name)
            .map(|(_, f)| f.key())
            .collect();
        let mut flights: Vec<Flight> = keys
            .iter()
            .filter_map(|k| state.flights.get(k).cloned())
            .collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn monthly_ticket_sales(&self, airline_name: &str, range: &DateRange) -> CoreResult<Vec<MonthlyCount>> {
        let state = self.state.read().await;
        let mut months: BTreeMap<String, i64> = BTreeMap::new();
        for (p, f) in state.sold() {
            if f.airline_name == airline_name && range.contains(p.purchase_date) {
                *months.entry(month_key(p.purchase_date)).or_default() += 1;
            }
        }
        Ok(months
            .into_iter()
            .map(|(month, tickets_sold)| MonthlyCount { month, tickets_sold })
            .collect())
    }

    async fn revenue_split(&self, airline_name: &str, range: &DateRange) -> CoreResult<RevenueSplit> {
        let state = self.state.read().await;
        let mut split = RevenueSplit::default();
        for (p, f) in state.sold() {
            if f.airline_name != airline_name || !range.contains(p.purchase_date) {
                continue;
            }
            match p.booking_agent_id {
                Some(_) => split.indirect = split.indirect + f.price,
                None => split.direct = split.direct + f.price,
            }
        }
        Ok(split)
    }

    async fn top_destinations(&self, airline_name: &str, range: &DateRange, limit: i64) -> CoreResult<Vec<Destination>> {
        let state = self.state.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for f in state.flights.values() {
            if f.airline_name == airline_name && range.contains(f.departure_date()) {
                *counts.entry(f.arrival_airport.clone()).or_default() += 1;
            }
        }
        Ok(top_n(counts, limit)
            .into_iter()
            .map(|(airport_name, num_flights)| Destination {
                airport_city: state
                    .airports
                    .get(&airport_name)
                    .map(|a| a.airport_city.clone())
                    .unwrap_or_default(),
                airport_name,
                num_flights,
            })
            .collect())
    }
}

/// Seed helpers that write straight into the store, bypassing authorization.
pub mod fixtures {
    use super::*;
    use crate::user::{Address, Passport};
    use chrono::{Days, NaiveDate, NaiveTime, Utc};

    pub const DEFAULT_PRICE: Money = Money(50_000);

    pub fn customer_details(email: &str) -> CustomerDetails {
        CustomerDetails {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            address: Address {
                building_number: "12".to_string(),
                street: "Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
            },
            phone_number: "555-0100".to_string(),
            passport: Passport {
                number: "X1234567".to_string().into(),
                expiration: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap_or_default(),
                country: "US".to_string(),
            },
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
        }
    }

    pub async fn seed_airline(store: &MemoryStore, airline_name: &str) {
        store.state.write().await.airlines.insert(airline_name.to_string());
    }

    pub async fn seed_customer(store: &MemoryStore, email: &str) {
        let mut state = store.state.write().await;
        state
            .customers
            .insert(email.to_string(), (customer_details(email), "!".to_string()));
    }

    pub async fn seed_agent(store: &MemoryStore, email: &str, booking_agent_id: i32, airline: Option<&str>) {
        let mut state = store.state.write().await;
        state.agents.insert(
            email.to_string(),
            AgentRow {
                booking_agent_id,
                password_hash: "!".to_string(),
            },
        );
        if let Some(airline) = airline {
            state.airlines.insert(airline.to_string());
            state.agent_airlines.insert(email.to_string(), airline.to_string());
        }
    }

    pub async fn seed_staff(store: &MemoryStore, airline_name: &str, username: &str) {
        let mut state = store.state.write().await;
        state.airlines.insert(airline_name.to_string());
        let details = StaffDetails {
            username: username.to_string(),
            first_name: username.to_string(),
            last_name: "Staff".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 1).unwrap_or_default(),
            airline_name: airline_name.to_string(),
        };
        state.staff.insert(username.to_string(), (details, "!".to_string()));
    }

    /// JFK to PVG a week from today, on an airplane with `seats` seats.
    pub async fn seed_flight_without_tickets(
        store: &MemoryStore,
        airline_name: &str,
        flight_num: i32,
        seats: u32,
    ) -> FlightKey {
        insert_flight(store, airline_name, flight_num, seats, DEFAULT_PRICE).await
    }

    pub async fn seed_flight(store: &MemoryStore, airline_name: &str, flight_num: i32, seats: u32) -> FlightKey {
        seed_priced_flight(store, airline_name, flight_num, seats, DEFAULT_PRICE).await
    }

    pub async fn seed_priced_flight(
        store: &MemoryStore,
        airline_name: &str,
        flight_num: i32,
        seats: u32,
        price: Money,
    ) -> FlightKey {
        let key = insert_flight(store, airline_name, flight_num, seats, price).await;
        store.state.write().await.insert_tickets(&key, seats);
        key
    }

    async fn insert_flight(
        store: &MemoryStore,
        airline_name: &str,
        flight_num: i32,
        seats: u32,
        price: Money,
    ) -> FlightKey {
        let mut state = store.state.write().await;
        state.airlines.insert(airline_name.to_string());
        for (name, city) in [("JFK", "New York"), ("PVG", "Shanghai")] {
            state.airports.entry(name.to_string()).or_insert_with(|| Airport {
                airport_name: name.to_string(),
                airport_city: city.to_string(),
            });
        }
        state.airplanes.insert(
            (airline_name.to_string(), flight_num),
            Airplane {
                airline_name: airline_name.to_string(),
                airplane_id: flight_num,
                seats,
            },
        );

        let departure_day = Utc::now().date_naive() + Days::new(7);
        let departure_time = departure_day
            .and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN))
            .and_utc();
        let flight = Flight {
            airline_name: airline_name.to_string(),
            flight_num,
            departure_airport: "JFK".to_string(),
            departure_time,
            arrival_airport: "PVG".to_string(),
            arrival_time: departure_time + chrono::Duration::hours(15),
            price,
            status: FlightStatus::Upcoming,
            airplane_id: flight_num,
        };
        let key = flight.key();
        state.flights.insert(key.clone(), flight);
        key
    }

    /// Claims a ticket with an arbitrary purchase date.
    ///
    /// # Panics
    ///
    /// When the customer is unknown or the flight is sold out.
    pub async fn seed_purchase(
        store: &MemoryStore,
        flight: &FlightKey,
        customer_email: &str,
        booking_agent_id: Option<i32>,
        purchase_date: NaiveDate,
    ) -> Purchase {
        let request = PurchaseRequest {
            flight: flight.clone(),
            customer_email: customer_email.to_string(),
            booking_agent_id,
            purchase_date,
        };
        match store.record_purchase(&request).await {
            Ok(purchase) => purchase,
            Err(e) => panic!("seed purchase on {} failed: {}", flight, e),
        }
    }
}
