use aerodesk_core::inventory::{Availability, Ticket};
use aerodesk_core::repository::InventoryRepository;
use aerodesk_core::{CoreError, CoreResult, Flight, FlightKey};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::DbResultExt;

pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    ticket_id: i64,
    airline_name: String,
    flight_num: i32,
}

#[derive(sqlx::FromRow)]
struct AvailabilityRow {
    total: i64,
    sold: i64,
}

async fn insert_tickets(tx: &mut Transaction<'_, Postgres>, key: &FlightKey, seat_count: u32) -> CoreResult<u32> {
    let seats = i32::try_from(seat_count).map_err(|_| CoreError::validation("seat_count is too large"))?;
    let result = sqlx::query(
        "INSERT INTO ticket (airline_name, flight_num) SELECT $1, $2 FROM generate_series(1, $3)",
    )
    .bind(&key.airline_name)
    .bind(key.flight_num)
    .bind(seats)
    .execute(&mut **tx)
    .await
    .db_context("insert tickets")?;

    u32::try_from(result.rows_affected()).map_err(|_| CoreError::internal("ticket count overflow"))
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn create_flight_with_tickets(&self, flight: &Flight, seat_count: u32) -> CoreResult<u32> {
        let mut tx = self.pool.begin().await.db_context("begin flight insert")?;

        sqlx::query(
            r#"
            INSERT INTO flight (airline_name, flight_num, departure_airport, departure_time, arrival_airport,
                                arrival_time, price_cents, status, airplane_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&flight.airline_name)
        .bind(flight.flight_num)
        .bind(&flight.departure_airport)
        .bind(flight.departure_time)
        .bind(&flight.arrival_airport)
        .bind(flight.arrival_time)
        .bind(flight.price.cents())
        .bind(flight.status.as_str())
        .bind(flight.airplane_id)
        .execute(&mut *tx)
        .await
        .db_context("insert flight")?;

        let created = insert_tickets(&mut tx, &flight.key(), seat_count).await?;
        tx.commit().await.db_context("commit flight insert")?;
        Ok(created)
    }

    async fn create_tickets_for_flight(&self, key: &FlightKey, seat_count: u32) -> CoreResult<u32> {
        let mut tx = self.pool.begin().await.db_context("begin ticket insert")?;

        // Locking the flight row serialises concurrent allocations for it.
        let locked = sqlx::query_scalar::<_, i32>(
            "SELECT flight_num FROM flight WHERE airline_name = $1 AND flight_num = $2 FOR UPDATE",
        )
        .bind(&key.airline_name)
        .bind(key.flight_num)
        .fetch_optional(&mut *tx)
        .await
        .db_context("lock flight")?;
        if locked.is_none() {
            return Err(CoreError::not_found(format!("Flight {} not found", key)));
        }

        let existing = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM ticket WHERE airline_name = $1 AND flight_num = $2)",
        )
        .bind(&key.airline_name)
        .bind(key.flight_num)
        .fetch_one(&mut *tx)
        .await
        .db_context("check tickets")?;
        if existing {
            return Err(CoreError::conflict(format!("Flight {} already has tickets", key)));
        }

        let created = insert_tickets(&mut tx, key, seat_count).await?;
        tx.commit().await.db_context("commit ticket insert")?;
        Ok(created)
    }

    async fn find_available_ticket(&self, key: &FlightKey) -> CoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT t.ticket_id, t.airline_name, t.flight_num
            FROM ticket t
            WHERE t.airline_name = $1 AND t.flight_num = $2
              AND NOT EXISTS (SELECT 1 FROM purchases p WHERE p.ticket_id = t.ticket_id)
            ORDER BY t.ticket_id
            LIMIT 1
            "#,
        )
        .bind(&key.airline_name)
        .bind(key.flight_num)
        .fetch_optional(&self.pool)
        .await
        .db_context("find available ticket")?;

        Ok(row.map(|r| Ticket {
            ticket_id: r.ticket_id,
            airline_name: r.airline_name,
            flight_num: r.flight_num,
        }))
    }

    async fn availability(&self, key: &FlightKey) -> CoreResult<Availability> {
        let row = sqlx::query_as::<_, AvailabilityRow>(
            r#"
            SELECT COUNT(t.ticket_id) AS total, COUNT(p.ticket_id) AS sold
            FROM ticket t
            LEFT JOIN purchases p ON p.ticket_id = t.ticket_id
            WHERE t.airline_name = $1 AND t.flight_num = $2
            "#,
        )
        .bind(&key.airline_name)
        .bind(key.flight_num)
        .fetch_one(&self.pool)
        .await
        .db_context("count tickets")?;

        Ok(Availability::new(row.total, row.sold))
    }
}
