use aerodesk_core::purchase::{BookedFlight, FlightScope, Purchase, PurchaseRequest};
use aerodesk_core::repository::PurchaseRepository;
use aerodesk_core::{CoreError, CoreResult};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::DbResultExt;
use crate::rows::{BookedFlightRow, FLIGHT_COLUMNS};

pub struct PgPurchaseRepository {
    pool: PgPool,
}

impl PgPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn scope_clause(scope: FlightScope) -> &'static str {
    match scope {
        FlightScope::Upcoming => "f.status = 'upcoming'",
        FlightScope::History => "f.status <> 'upcoming'",
    }
}

#[async_trait]
impl PurchaseRepository for PgPurchaseRepository {
    async fn record_purchase(&self, request: &PurchaseRequest) -> CoreResult<Purchase> {
        let mut tx = self.pool.begin().await.db_context("begin purchase")?;

        let customer_known = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM customer WHERE email = $1)")
            .bind(&request.customer_email)
            .fetch_one(&mut *tx)
            .await
            .db_context("check customer")?;
        if !customer_known {
            return Err(CoreError::not_found(format!("Customer {} not found", request.customer_email)));
        }

        // Rows locked by an in-flight purchase are skipped, so concurrent buyers
        // never wait on or claim the same seat.
        let ticket_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT t.ticket_id
            FROM ticket t
            WHERE t.airline_name = $1 AND t.flight_num = $2
              AND NOT EXISTS (SELECT 1 FROM purchases p WHERE p.ticket_id = t.ticket_id)
            ORDER BY t.ticket_id
            LIMIT 1
            FOR UPDATE OF t SKIP LOCKED
            "#,
        )
        .bind(&request.flight.airline_name)
        .bind(request.flight.flight_num)
        .fetch_optional(&mut *tx)
        .await
        .db_context("claim ticket")?
        .ok_or_else(|| CoreError::not_found(format!("No tickets are available for flight {}", request.flight)))?;

        let purchase = request.clone().into_purchase(ticket_id);
        sqlx::query(
            r#"
            INSERT INTO purchases (purchase_id, ticket_id, customer_email, booking_agent_id, purchase_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(purchase.purchase_id)
        .bind(purchase.ticket_id)
        .bind(&purchase.customer_email)
        .bind(purchase.booking_agent_id)
        .bind(purchase.purchase_date)
        .execute(&mut *tx)
        .await
        .db_context("record purchase")?;

        tx.commit().await.db_context("commit purchase")?;
        Ok(purchase)
    }

    async fn customer_flights(&self, email: &str, scope: FlightScope) -> CoreResult<Vec<BookedFlight>> {
        let sql = format!(
            r#"
            SELECT {}, p.purchase_date, p.customer_email
            FROM purchases p
            JOIN ticket t ON t.ticket_id = p.ticket_id
            JOIN flight f ON f.airline_name = t.airline_name AND f.flight_num = t.flight_num
            WHERE p.customer_email = $1 AND {}
            ORDER BY f.departure_time
            "#,
            FLIGHT_COLUMNS,
            scope_clause(scope)
        );
        let rows = sqlx::query_as::<_, BookedFlightRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .db_context("list customer flights")?;
        rows.into_iter().map(BookedFlight::try_from).collect()
    }

    async fn agent_bookings(&self, booking_agent_id: i32, airline_name: &str) -> CoreResult<Vec<BookedFlight>> {
        let sql = format!(
            r#"
            SELECT {}, p.purchase_date, p.customer_email
            FROM purchases p
            JOIN ticket t ON t.ticket_id = p.ticket_id
            JOIN flight f ON f.airline_name = t.airline_name AND f.flight_num = t.flight_num
            WHERE p.booking_agent_id = $1 AND f.airline_name = $2 AND {}
            ORDER BY f.departure_time
            "#,
            FLIGHT_COLUMNS,
            scope_clause(FlightScope::Upcoming)
        );
        let rows = sqlx::query_as::<_, BookedFlightRow>(&sql)
            .bind(booking_agent_id)
            .bind(airline_name)
            .fetch_all(&self.pool)
            .await
            .db_context("list agent bookings")?;
        rows.into_iter().map(BookedFlight::try_from).collect()
    }
}
