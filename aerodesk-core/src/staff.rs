use aerodesk_shared::models::AuditEvent;
use aerodesk_shared::Masked;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::airline::{Airplane, Airport, DepartureFilter, Flight, FlightKey, FlightLoad, FlightStatus, NewFlight};
use crate::authz::AuthorizationGate;
use crate::credentials::PasswordHasher;
use crate::identity::{PermissionKind, Role, SessionContext};
use crate::inventory::TicketInventory;
use crate::repository::Repositories;
use crate::user::{validate_email, AgentDetails, CustomerContact, StaffMember};
use crate::{CoreError, CoreResult};

const AGENT_ID_ATTEMPTS: usize = 5;
const UPCOMING_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFlight {
    #[serde(flatten)]
    pub flight: Flight,
    pub tickets_created: u32,
}

/// Optional dashboard filter. Without dates the next 30 days are shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FlightQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub source_airport: Option<String>,
    pub destination_airport: Option<String>,
}

impl FlightQuery {
    fn into_filter(self, now: DateTime<Utc>) -> CoreResult<DepartureFilter> {
        let default_end = now
            .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let from = self.start_date.map(start_of_day).unwrap_or(now);
        let to = self.end_date.map(end_of_day).unwrap_or(default_end);
        if from > to {
            return Err(CoreError::validation("start_date is after end_date"));
        }
        Ok(DepartureFilter {
            from,
            to,
            source_airport: self.source_airport.unwrap_or_default(),
            destination_airport: self.destination_airport.unwrap_or_default(),
        })
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    date.and_time(last).and_utc()
}

/// Airline staff operations, always scoped to the caller's airline.
pub struct StaffConsole {
    gate: AuthorizationGate,
    repos: Repositories,
    inventory: Arc<TicketInventory>,
    hasher: Arc<dyn PasswordHasher>,
    agent_initial_password: Masked<String>,
}

impl StaffConsole {
    pub fn new(
        gate: AuthorizationGate,
        repos: Repositories,
        inventory: Arc<TicketInventory>,
        hasher: Arc<dyn PasswordHasher>,
        agent_initial_password: Masked<String>,
    ) -> Self {
        Self {
            gate,
            repos,
            inventory,
            hasher,
            agent_initial_password,
        }
    }

    /// Creates the flight and one ticket per airplane seat, atomically.
    pub async fn create_flight(&self, ctx: &SessionContext, input: NewFlight) -> CoreResult<CreatedFlight> {
        let staff = self.gate.require_admin(ctx).await?;
        input.validate()?;

        let airplane = self
            .repos
            .catalog
            .find_airplane(staff.airline_name, input.airplane_id)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "Airplane {} does not belong to {}",
                    input.airplane_id, staff.airline_name
                ))
            })?;
        for airport in [&input.departure_airport, &input.arrival_airport] {
            if !self.repos.catalog.airport_exists(airport).await? {
                return Err(CoreError::not_found(format!("Airport {} not found", airport)));
            }
        }

        let flight = input.into_flight(staff.airline_name);
        if self.repos.catalog.find_flight(&flight.key()).await?.is_some() {
            return Err(CoreError::conflict(format!("Flight {} already exists", flight.key())));
        }

        let tickets_created = self.inventory.create_flight_with_tickets(&flight, airplane.seats).await?;

        tracing::info!(flight = %flight.key(), tickets_created, "Flight created");
        AuditEvent::FlightCreated {
            airline_name: flight.airline_name.clone(),
            flight_num: flight.flight_num,
            tickets_created,
            created_by: staff.username.to_string(),
        }
        .emit();

        Ok(CreatedFlight { flight, tickets_created })
    }

    pub async fn change_flight_status(
        &self,
        ctx: &SessionContext,
        flight_num: i32,
        status: FlightStatus,
    ) -> CoreResult<()> {
        let staff = self.gate.require_operator(ctx).await?;
        let key = FlightKey::new(staff.airline_name, flight_num);
        self.repos.catalog.update_flight_status(&key, status).await?;

        tracing::info!(flight = %key, status = %status, "Flight status changed");
        AuditEvent::FlightStatusChanged {
            airline_name: key.airline_name,
            flight_num,
            status: status.to_string(),
            changed_by: staff.username.to_string(),
        }
        .emit();
        Ok(())
    }

    pub async fn add_airplane(&self, ctx: &SessionContext, airplane_id: i32, seats: u32) -> CoreResult<Airplane> {
        let staff = self.gate.require_admin(ctx).await?;
        if airplane_id <= 0 {
            return Err(CoreError::validation("airplane_id must be positive"));
        }
        if seats == 0 {
            return Err(CoreError::validation("seats must be positive"));
        }
        if self
            .repos
            .catalog
            .find_airplane(staff.airline_name, airplane_id)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "Airplane {} already exists for {}",
                airplane_id, staff.airline_name
            )));
        }

        let airplane = Airplane {
            airline_name: staff.airline_name.to_string(),
            airplane_id,
            seats,
        };
        self.repos.catalog.insert_airplane(&airplane).await?;
        tracing::info!(airline = staff.airline_name, airplane_id, seats, "Airplane added");
        Ok(airplane)
    }

    pub async fn list_airplanes(&self, ctx: &SessionContext) -> CoreResult<Vec<Airplane>> {
        let staff = self.gate.require_admin(ctx).await?;
        self.repos.catalog.list_airplanes(staff.airline_name).await
    }

    pub async fn add_airport(&self, ctx: &SessionContext, airport: Airport) -> CoreResult<Airport> {
        self.gate.require_admin(ctx).await?;
        airport.validate()?;
        if self.repos.catalog.airport_exists(&airport.airport_name).await? {
            return Err(CoreError::conflict(format!("Airport {} already exists", airport.airport_name)));
        }
        self.repos.catalog.insert_airport(&airport).await?;
        tracing::info!(airport = %airport.airport_name, city = %airport.airport_city, "Airport added");
        Ok(airport)
    }

    pub async fn list_airports(&self, ctx: &SessionContext) -> CoreResult<Vec<Airport>> {
        self.gate.require_admin(ctx).await?;
        self.repos.catalog.list_airports().await
    }

    /// Creates an agent account working for the caller's airline, with a
    /// random four-digit id and the configured initial password.
    pub async fn add_booking_agent(&self, ctx: &SessionContext, email: &str) -> CoreResult<AgentDetails> {
        let staff = self.gate.require_admin(ctx).await?;
        validate_email(email)?;
        if self.repos.users.find_user(Role::BookingAgent, email).await?.is_some() {
            return Err(CoreError::conflict(format!("Booking agent {} already exists", email)));
        }

        let digest = self.hasher.hash(self.agent_initial_password.expose()).await?;

        for _ in 0..AGENT_ID_ATTEMPTS {
            let booking_agent_id = random_agent_id();
            match self
                .repos
                .users
                .insert_affiliated_agent(email, &digest, booking_agent_id, staff.airline_name)
                .await
            {
                Ok(()) => {
                    tracing::info!(email, booking_agent_id, airline = staff.airline_name, "Booking agent added");
                    AuditEvent::BookingAgentAdded {
                        email: email.to_string(),
                        booking_agent_id,
                        airline_name: staff.airline_name.to_string(),
                        added_by: staff.username.to_string(),
                    }
                    .emit();
                    return Ok(AgentDetails {
                        email: email.to_string(),
                        booking_agent_id,
                    });
                }
                Err(CoreError::Conflict(msg)) => {
                    if self.repos.users.find_user(Role::BookingAgent, email).await?.is_some() {
                        return Err(CoreError::Conflict(msg));
                    }
                    tracing::debug!(booking_agent_id, "Agent id taken, drawing another");
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::conflict("Could not allocate a free booking agent id"))
    }

    pub async fn grant_permission(&self, ctx: &SessionContext, username: &str, kind: PermissionKind) -> CoreResult<()> {
        let staff = self.gate.require_admin(ctx).await?;
        self.require_colleague(staff.airline_name, username).await?;
        self.repos.permissions.grant(username, kind).await?;

        tracing::info!(username, permission = %kind, "Permission granted");
        AuditEvent::PermissionGranted {
            username: username.to_string(),
            permission: kind.to_string(),
            granted_by: staff.username.to_string(),
        }
        .emit();
        Ok(())
    }

    pub async fn revoke_permission(&self, ctx: &SessionContext, username: &str, kind: PermissionKind) -> CoreResult<()> {
        let staff = self.gate.require_admin(ctx).await?;
        self.require_colleague(staff.airline_name, username).await?;
        self.repos.permissions.revoke(username, kind).await?;

        tracing::info!(username, permission = %kind, "Permission revoked");
        AuditEvent::PermissionRevoked {
            username: username.to_string(),
            permission: kind.to_string(),
            revoked_by: staff.username.to_string(),
        }
        .emit();
        Ok(())
    }

    pub async fn list_staff(&self, ctx: &SessionContext) -> CoreResult<Vec<StaffMember>> {
        let staff = self.gate.require_admin(ctx).await?;
        self.repos.users.list_staff(staff.airline_name).await
    }

    pub async fn upcoming_flights(
        &self,
        ctx: &SessionContext,
        now: DateTime<Utc>,
        query: FlightQuery,
    ) -> CoreResult<Vec<FlightLoad>> {
        let staff = self.gate.require_staff(ctx)?;
        let filter = query.into_filter(now)?;
        self.repos.catalog.airline_flights(staff.airline_name, &filter).await
    }

    pub async fn flight_customers(&self, ctx: &SessionContext, flight_num: i32) -> CoreResult<Vec<CustomerContact>> {
        let staff = self.gate.require_staff(ctx)?;
        let key = FlightKey::new(staff.airline_name, flight_num);
        if self.repos.catalog.find_flight(&key).await?.is_none() {
            return Err(CoreError::not_found(format!("Flight {} not found", key)));
        }
        self.repos.catalog.flight_customers(&key).await
    }

    async fn require_colleague(&self, airline_name: &str, username: &str) -> CoreResult<()> {
        match self.repos.users.staff_airline(username).await? {
            None => Err(CoreError::not_found(format!("Staff member {} not found", username))),
            Some(other) if other != airline_name => Err(CoreError::forbidden(format!(
                "{} does not work for {}",
                username, airline_name
            ))),
            Some(_) => Ok(()),
        }
    }
}

fn random_agent_id() -> i32 {
    rand::thread_rng().gen_range(1000..=9999)
}
