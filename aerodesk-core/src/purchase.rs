use aerodesk_shared::models::AuditEvent;
use aerodesk_shared::Money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::airline::{FlightKey, FlightStatus};
use crate::identity::{Principal, SessionContext};
use crate::repository::{today, CatalogRepository, PurchaseRepository, UserRepository};
use crate::user::validate_email;
use crate::{CoreError, CoreResult};

/// A ticket bound to a customer. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub purchase_id: Uuid,
    pub ticket_id: i64,
    pub airline_name: String,
    pub flight_num: i32,
    pub customer_email: String,
    pub booking_agent_id: Option<i32>,
    pub purchase_date: NaiveDate,
}

/// What the store needs to claim a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub flight: FlightKey,
    pub customer_email: String,
    pub booking_agent_id: Option<i32>,
    pub purchase_date: NaiveDate,
}

impl PurchaseRequest {
    pub fn into_purchase(self, ticket_id: i64) -> Purchase {
        Purchase {
            purchase_id: Uuid::new_v4(),
            ticket_id,
            airline_name: self.flight.airline_name,
            flight_num: self.flight.flight_num,
            customer_email: self.customer_email,
            booking_agent_id: self.booking_agent_id,
            purchase_date: self.purchase_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightScope {
    /// Flights still in `upcoming` status.
    Upcoming,
    /// Everything else.
    History,
}

impl FlightScope {
    pub fn includes(&self, status: FlightStatus) -> bool {
        match self {
            FlightScope::Upcoming => status == FlightStatus::Upcoming,
            FlightScope::History => status != FlightStatus::Upcoming,
        }
    }
}

/// A purchased seat joined with its flight, for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedFlight {
    pub airline_name: String,
    pub flight_num: i32,
    pub departure_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_airport: String,
    pub arrival_time: DateTime<Utc>,
    pub status: FlightStatus,
    pub price: Money,
    pub purchase_date: NaiveDate,
    pub customer_email: String,
}

/// Binds one available ticket to one customer, optionally through an agent.
pub struct PurchaseRecorder {
    users: Arc<dyn UserRepository>,
    catalog: Arc<dyn CatalogRepository>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl PurchaseRecorder {
    pub fn new(
        users: Arc<dyn UserRepository>,
        catalog: Arc<dyn CatalogRepository>,
        purchases: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self {
            users,
            catalog,
            purchases,
        }
    }

    /// Purchases one seat on `flight`.
    ///
    /// Customers buy for themselves. Booking agents name the customer and may
    /// only sell seats of the airline they work for. Staff cannot purchase.
    pub async fn purchase(
        &self,
        ctx: &SessionContext,
        flight: &FlightKey,
        customer_email: Option<&str>,
    ) -> CoreResult<Purchase> {
        let (customer_email, booking_agent_id) = match &ctx.principal {
            Principal::Customer { email } => {
                if let Some(other) = customer_email {
                    if other != email {
                        return Err(CoreError::forbidden("Customers can only purchase tickets for themselves"));
                    }
                }
                (email.clone(), None)
            }
            Principal::BookingAgent { email, booking_agent_id } => {
                let customer = customer_email
                    .ok_or_else(|| CoreError::validation("customer_email is required for agent purchases"))?;
                validate_email(customer)?;

                let airline = self
                    .users
                    .agent_airline(email)
                    .await?
                    .ok_or_else(|| CoreError::forbidden("No airline association found for this booking agent"))?;
                if airline != flight.airline_name {
                    return Err(CoreError::forbidden(format!(
                        "Booking agents of {} cannot sell {} flights",
                        airline, flight.airline_name
                    )));
                }
                (customer.to_string(), Some(*booking_agent_id))
            }
            Principal::AirlineStaff { .. } => {
                return Err(CoreError::forbidden("Airline staff cannot purchase tickets"));
            }
        };

        if self.catalog.find_flight(flight).await?.is_none() {
            return Err(CoreError::not_found(format!("Flight {} not found", flight)));
        }

        let request = PurchaseRequest {
            flight: flight.clone(),
            customer_email,
            booking_agent_id,
            purchase_date: today(),
        };

        let purchase = self.purchases.record_purchase(&request).await.map_err(|e| {
            tracing::warn!(flight = %flight, buyer = ctx.identifier(), "Purchase failed: {}", e);
            e
        })?;

        tracing::info!(
            purchase_id = %purchase.purchase_id,
            ticket_id = purchase.ticket_id,
            flight = %flight,
            "Ticket purchased"
        );
        AuditEvent::TicketPurchased {
            purchase_id: purchase.purchase_id,
            ticket_id: purchase.ticket_id,
            airline_name: purchase.airline_name.clone(),
            flight_num: purchase.flight_num,
            customer_email: purchase.customer_email.clone(),
            booking_agent_id: purchase.booking_agent_id,
            purchase_date: purchase.purchase_date,
        }
        .emit();

        Ok(purchase)
    }

    /// The customer's own flights, upcoming or past.
    pub async fn customer_flights(&self, ctx: &SessionContext, scope: FlightScope) -> CoreResult<Vec<BookedFlight>> {
        match &ctx.principal {
            Principal::Customer { email } => self.purchases.customer_flights(email, scope).await,
            _ => Err(CoreError::forbidden("This action requires the customer role")),
        }
    }

    /// Seats this agent sold on its airline's upcoming flights.
    pub async fn agent_bookings(&self, ctx: &SessionContext) -> CoreResult<Vec<BookedFlight>> {
        let (email, booking_agent_id) = match &ctx.principal {
            Principal::BookingAgent { email, booking_agent_id } => (email, *booking_agent_id),
            _ => return Err(CoreError::forbidden("This action requires the booking_agent role")),
        };
        let airline = self
            .users
            .agent_airline(email)
            .await?
            .ok_or_else(|| CoreError::forbidden("No airline association found for this booking agent"))?;
        self.purchases.agent_bookings(booking_agent_id, &airline).await
    }
}
