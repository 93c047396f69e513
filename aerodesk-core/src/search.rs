use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::airline::{Flight, FlightKey, ServedAirports};
use crate::identity::{Principal, SessionContext};
use crate::inventory::{Availability, TicketInventory};
use crate::repository::{CatalogRepository, UserRepository};
use crate::{require_non_empty, CoreError, CoreResult};

/// Search form input. All three fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub source: String,
    pub destination: String,
    pub date: NaiveDate,
}

impl SearchCriteria {
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("source", &self.source)?;
        require_non_empty("destination", &self.destination)
    }

    pub fn matches(&self, flight: &Flight) -> bool {
        flight.departure_airport == self.source
            && flight.arrival_airport == self.destination
            && flight.departure_date() == self.date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDetails {
    #[serde(flatten)]
    pub flight: Flight,
    pub availability: Availability,
}

/// Public flight lookups. Booking agents only ever see their own airline.
pub struct FlightSearch {
    users: Arc<dyn UserRepository>,
    catalog: Arc<dyn CatalogRepository>,
    inventory: Arc<TicketInventory>,
}

impl FlightSearch {
    pub fn new(
        users: Arc<dyn UserRepository>,
        catalog: Arc<dyn CatalogRepository>,
        inventory: Arc<TicketInventory>,
    ) -> Self {
        Self {
            users,
            catalog,
            inventory,
        }
    }

    /// `ctx` is `None` for anonymous visitors.
    pub async fn search(&self, ctx: Option<&SessionContext>, criteria: &SearchCriteria) -> CoreResult<Vec<Flight>> {
        criteria.validate()?;

        let airline = match ctx.map(|c| &c.principal) {
            Some(Principal::BookingAgent { email, .. }) => Some(
                self.users
                    .agent_airline(email)
                    .await?
                    .ok_or_else(|| CoreError::forbidden("No airline association found for this booking agent"))?,
            ),
            _ => None,
        };

        let flights = self.catalog.search_flights(criteria, airline.as_deref()).await?;
        tracing::debug!(
            source = %criteria.source,
            destination = %criteria.destination,
            date = %criteria.date,
            results = flights.len(),
            "Flight search"
        );
        Ok(flights)
    }

    pub async fn list_flights(&self) -> CoreResult<Vec<Flight>> {
        self.catalog.list_flights().await
    }

    pub async fn flight_details(&self, key: &FlightKey) -> CoreResult<FlightDetails> {
        let flight = self
            .catalog
            .find_flight(key)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Flight {} not found", key)))?;
        let availability = self.inventory.availability(key).await?;
        Ok(FlightDetails { flight, availability })
    }

    pub async fn served_airports(&self) -> CoreResult<ServedAirports> {
        self.catalog.served_airports().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{fixtures, MemoryStore};

    async fn setup() -> (Arc<MemoryStore>, FlightSearch, SearchCriteria) {
        let store = MemoryStore::new();
        let delta = fixtures::seed_flight(&store, "Delta", 100, 5).await;
        fixtures::seed_flight(&store, "United", 200, 5).await;
        let search = FlightSearch::new(store.clone(), store.clone(), Arc::new(TicketInventory::new(store.clone())));
        let flight = store.find_flight(&delta).await.unwrap().unwrap();
        let criteria = SearchCriteria {
            source: flight.departure_airport.clone(),
            destination: flight.arrival_airport.clone(),
            date: flight.departure_date(),
        };
        (store, search, criteria)
    }

    #[tokio::test]
    async fn test_anonymous_and_customer_see_all_airlines() {
        let (_store, search, criteria) = setup().await;
        assert_eq!(search.search(None, &criteria).await.unwrap().len(), 2);

        let customer = SessionContext::new(Principal::Customer {
            email: "a@example.com".to_string(),
        });
        assert_eq!(search.search(Some(&customer), &criteria).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_agent_sees_only_own_airline() {
        let (store, search, criteria) = setup().await;
        fixtures::seed_agent(&store, "agent@travel.example", 1001, Some("United")).await;
        fixtures::seed_agent(&store, "free@travel.example", 1002, None).await;

        let agent = SessionContext::new(Principal::BookingAgent {
            email: "agent@travel.example".to_string(),
            booking_agent_id: 1001,
        });
        let flights = search.search(Some(&agent), &criteria).await.unwrap();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].airline_name, "United");

        let unaffiliated = SessionContext::new(Principal::BookingAgent {
            email: "free@travel.example".to_string(),
            booking_agent_id: 1002,
        });
        assert!(matches!(
            search.search(Some(&unaffiliated), &criteria).await,
            Err(CoreError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_and_no_match() {
        let (_store, search, criteria) = setup().await;
        let blank = SearchCriteria {
            source: String::new(),
            ..criteria.clone()
        };
        assert!(matches!(search.search(None, &blank).await, Err(CoreError::ValidationError(_))));

        let next_day = SearchCriteria {
            date: criteria.date.succ_opt().unwrap(),
            ..criteria
        };
        assert!(search.search(None, &next_day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flight_details_include_availability() {
        let (_store, search, _criteria) = setup().await;
        let details = search.flight_details(&FlightKey::new("Delta", 100)).await.unwrap();
        assert_eq!(details.availability.available, 5);
        assert!(matches!(
            search.flight_details(&FlightKey::new("Delta", 999)).await,
            Err(CoreError::NotFound(_))
        ));

        let served = search.served_airports().await.unwrap();
        assert!(!served.departure_airports.is_empty());
        assert_eq!(search.list_flights().await.unwrap().len(), 2);
    }
}
