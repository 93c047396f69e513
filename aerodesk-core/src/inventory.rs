use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::airline::{Flight, FlightKey};
use crate::repository::InventoryRepository;
use crate::{CoreError, CoreResult};

/// One seat's worth of inventory on a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: i64,
    pub airline_name: String,
    pub flight_num: i32,
}

impl Ticket {
    pub fn flight_key(&self) -> FlightKey {
        FlightKey::new(self.airline_name.clone(), self.flight_num)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub total: i64,
    pub sold: i64,
    pub available: i64,
}

impl Availability {
    pub fn new(total: i64, sold: i64) -> Self {
        Self {
            total,
            sold,
            available: total - sold,
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.available <= 0
    }
}

/// Flight-to-ticket inventory.
///
/// Tickets are only ever created together with their flight. A ticket is
/// available while no purchase references it.
pub struct TicketInventory {
    repo: Arc<dyn InventoryRepository>,
}

impl TicketInventory {
    pub fn new(repo: Arc<dyn InventoryRepository>) -> Self {
        Self { repo }
    }

    /// Lowest-id unpurchased ticket of the flight.
    pub async fn find_available_ticket(&self, flight: &FlightKey) -> CoreResult<Ticket> {
        self.repo
            .find_available_ticket(flight)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("No tickets are available for flight {}", flight)))
    }

    /// Inserts the flight together with `seat_count` tickets, in one write.
    pub async fn create_flight_with_tickets(&self, flight: &Flight, seat_count: u32) -> CoreResult<u32> {
        if seat_count == 0 {
            return Err(CoreError::validation("seat_count must be positive"));
        }
        let created = self.repo.create_flight_with_tickets(flight, seat_count).await?;
        tracing::info!(flight = %flight.key(), created, "Tickets created");
        Ok(created)
    }

    /// Fans out `seat_count` tickets for a flight that has none yet.
    ///
    /// A second call for the same flight is rejected with `Conflict` instead of
    /// allocating another batch.
    pub async fn create_tickets_for_flight(&self, flight: &FlightKey, seat_count: u32) -> CoreResult<u32> {
        if seat_count == 0 {
            return Err(CoreError::validation("seat_count must be positive"));
        }
        let created = self.repo.create_tickets_for_flight(flight, seat_count).await?;
        tracing::info!(flight = %flight, created, "Tickets created");
        Ok(created)
    }

    pub async fn availability(&self, flight: &FlightKey) -> CoreResult<Availability> {
        self.repo.availability(flight).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{fixtures, MemoryStore};
    use crate::repository::CatalogRepository;

    async fn setup(seats: u32) -> (Arc<MemoryStore>, TicketInventory, FlightKey) {
        let store = MemoryStore::new();
        let key = fixtures::seed_flight_without_tickets(&store, "Delta", 100, seats).await;
        let inventory = TicketInventory::new(store.clone());
        (store, inventory, key)
    }

    #[tokio::test]
    async fn test_creates_exactly_seat_count_available_tickets() {
        for seats in [1u32, 2, 7, 150] {
            let (_store, inventory, key) = setup(seats).await;

            let created = inventory.create_tickets_for_flight(&key, seats).await.unwrap();
            assert_eq!(created, seats);

            let availability = inventory.availability(&key).await.unwrap();
            assert_eq!(availability, Availability::new(seats as i64, 0));
        }
    }

    #[tokio::test]
    async fn test_second_allocation_is_rejected() {
        let (_store, inventory, key) = setup(3).await;
        inventory.create_tickets_for_flight(&key, 3).await.unwrap();

        let again = inventory.create_tickets_for_flight(&key, 3).await;
        assert!(matches!(again, Err(CoreError::Conflict(_))));
        assert_eq!(inventory.availability(&key).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_zero_seats_and_unknown_flight() {
        let (_store, inventory, key) = setup(3).await;
        assert!(matches!(
            inventory.create_tickets_for_flight(&key, 0).await,
            Err(CoreError::ValidationError(_))
        ));

        let missing = FlightKey::new("Delta", 999);
        assert!(matches!(
            inventory.create_tickets_for_flight(&missing, 2).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_flight_created_with_its_tickets() {
        let (store, inventory, key) = setup(2).await;
        let mut flight = store.find_flight(&key).await.unwrap().unwrap();
        flight.flight_num = 101;

        assert!(matches!(
            inventory.create_flight_with_tickets(&flight, 0).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(store.find_flight(&flight.key()).await.unwrap().is_none());

        assert_eq!(inventory.create_flight_with_tickets(&flight, 2).await.unwrap(), 2);
        assert_eq!(inventory.availability(&flight.key()).await.unwrap(), Availability::new(2, 0));
        assert!(matches!(
            inventory.create_tickets_for_flight(&flight.key(), 2).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_find_available_ticket_prefers_lowest_id() {
        let (_store, inventory, key) = setup(4).await;
        inventory.create_tickets_for_flight(&key, 4).await.unwrap();

        let first = inventory.find_available_ticket(&key).await.unwrap();
        let again = inventory.find_available_ticket(&key).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first.flight_key(), key);
    }

    #[tokio::test]
    async fn test_flight_without_tickets_has_none_available() {
        let (_store, inventory, key) = setup(4).await;
        assert!(matches!(
            inventory.find_available_ticket(&key).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
