use aerodesk_core::reports::{
    AgentAmount, AgentTickets, CommissionSummary, CustomerAmount, CustomerTickets, DateRange, Destination,
    MonthlyAmount, MonthlyCount, RevenueSplit,
};
use aerodesk_core::repository::ReportRepository;
use aerodesk_core::{CoreResult, Flight};
use aerodesk_shared::money::COMMISSION_RATE_PERCENT;
use aerodesk_shared::Money;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::DbResultExt;
use crate::rows::{into_flights, FlightRow, FLIGHT_COLUMNS};

/// Purchases joined through their ticket to the flight.
const SOLD: &str = "FROM purchases p \
     JOIN ticket t ON t.ticket_id = p.ticket_id \
     JOIN flight f ON f.airline_name = t.airline_name AND f.flight_num = t.flight_num";

/// Per-ticket commission in cents, rounded half up. Rate is bound as `$rate`.
fn commission_expr(rate_param: usize) -> String {
    format!("(f.price_cents * ${} + 50) / 100", rate_param)
}

pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MonthlyAmountRow {
    month: String,
    total: i64,
}

#[derive(sqlx::FromRow)]
struct MonthlyCountRow {
    month: String,
    tickets_sold: i64,
}

#[derive(sqlx::FromRow)]
struct CommissionRow {
    total_commission: i64,
    tickets_sold: i64,
}

#[derive(sqlx::FromRow)]
struct CustomerTicketsRow {
    email: String,
    name: Option<String>,
    tickets: i64,
}

impl From<CustomerTicketsRow> for CustomerTickets {
    fn from(row: CustomerTicketsRow) -> Self {
        CustomerTickets {
            email: row.email,
            name: row.name,
            tickets: row.tickets,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerAmountRow {
    email: String,
    amount: i64,
}

#[derive(sqlx::FromRow)]
struct AgentTicketsRow {
    email: String,
    booking_agent_id: i32,
    tickets_sold: i64,
}

#[derive(sqlx::FromRow)]
struct AgentAmountRow {
    email: String,
    booking_agent_id: i32,
    commission: i64,
}

#[derive(sqlx::FromRow)]
struct RevenueRow {
    direct: i64,
    indirect: i64,
}

#[derive(sqlx::FromRow)]
struct DestinationRow {
    airport_name: String,
    airport_city: String,
    num_flights: i64,
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn customer_monthly_spending(&self, email: &str, range: &DateRange) -> CoreResult<Vec<MonthlyAmount>> {
        let sql = format!(
            r#"
            SELECT to_char(p.purchase_date, 'YYYY-MM') AS month, SUM(f.price_cents)::BIGINT AS total
            {}
            WHERE p.customer_email = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY month
            ORDER BY month
            "#,
            SOLD
        );
        let rows = sqlx::query_as::<_, MonthlyAmountRow>(&sql)
            .bind(email)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .db_context("customer spending")?;
        Ok(rows
            .into_iter()
            .map(|r| MonthlyAmount {
                month: r.month,
                total: Money::from_cents(r.total),
            })
            .collect())
    }

    async fn agent_commission(&self, booking_agent_id: i32, range: &DateRange) -> CoreResult<CommissionSummary> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM({}), 0)::BIGINT AS total_commission, COUNT(*) AS tickets_sold
            {}
            WHERE p.booking_agent_id = $1 AND p.purchase_date BETWEEN $2 AND $3
            "#,
            commission_expr(4),
            SOLD
        );
        let row = sqlx::query_as::<_, CommissionRow>(&sql)
            .bind(booking_agent_id)
            .bind(range.start)
            .bind(range.end)
            .bind(COMMISSION_RATE_PERCENT)
            .fetch_one(&self.pool)
            .await
            .db_context("agent commission")?;
        Ok(CommissionSummary::from_totals(
            Money::from_cents(row.total_commission),
            row.tickets_sold,
        ))
    }

    async fn agent_top_customers_by_tickets(
        &self,
        booking_agent_id: i32,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerTickets>> {
        let rows = sqlx::query_as::<_, CustomerTicketsRow>(
            r#"
            SELECT p.customer_email AS email, c.name AS name, COUNT(*) AS tickets
            FROM purchases p
            JOIN customer c ON c.email = p.customer_email
            WHERE p.booking_agent_id = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY p.customer_email, c.name
            ORDER BY tickets DESC, email
            LIMIT $4
            "#,
        )
        .bind(booking_agent_id)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .db_context("agent top customers by tickets")?;
        Ok(rows.into_iter().map(CustomerTickets::from).collect())
    }

    async fn agent_top_customers_by_commission(
        &self,
        booking_agent_id: i32,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerAmount>> {
        let sql = format!(
            r#"
            SELECT p.customer_email AS email, SUM({})::BIGINT AS amount
            {}
            WHERE p.booking_agent_id = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY p.customer_email
            ORDER BY amount DESC, email
            LIMIT $4
            "#,
            commission_expr(5),
            SOLD
        );
        let rows = sqlx::query_as::<_, CustomerAmountRow>(&sql)
            .bind(booking_agent_id)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .bind(COMMISSION_RATE_PERCENT)
            .fetch_all(&self.pool)
            .await
            .db_context("agent top customers by commission")?;
        Ok(rows
            .into_iter()
            .map(|r| CustomerAmount {
                email: r.email,
                amount: Money::from_cents(r.amount),
            })
            .collect())
    }

    async fn top_agents_by_tickets(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<AgentTickets>> {
        let sql = format!(
            r#"
            SELECT a.email, a.booking_agent_id, COUNT(*) AS tickets_sold
            {}
            JOIN booking_agent a ON a.booking_agent_id = p.booking_agent_id
            WHERE f.airline_name = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY a.email, a.booking_agent_id
            ORDER BY tickets_sold DESC, a.email
            LIMIT $4
            "#,
            SOLD
        );
        let rows = sqlx::query_as::<_, AgentTicketsRow>(&sql)
            .bind(airline_name)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .db_context("top agents by tickets")?;
        Ok(rows
            .into_iter()
            .map(|r| AgentTickets {
                email: r.email,
                booking_agent_id: r.booking_agent_id,
                tickets_sold: r.tickets_sold,
            })
            .collect())
    }

    async fn top_agents_by_commission(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<AgentAmount>> {
        let sql = format!(
            r#"
            SELECT a.email, a.booking_agent_id, SUM({})::BIGINT AS commission
            {}
            JOIN booking_agent a ON a.booking_agent_id = p.booking_agent_id
            WHERE f.airline_name = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY a.email, a.booking_agent_id
            ORDER BY commission DESC, a.email
            LIMIT $4
            "#,
            commission_expr(5),
            SOLD
        );
        let rows = sqlx::query_as::<_, AgentAmountRow>(&sql)
            .bind(airline_name)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .bind(COMMISSION_RATE_PERCENT)
            .fetch_all(&self.pool)
            .await
            .db_context("top agents by commission")?;
        Ok(rows
            .into_iter()
            .map(|r| AgentAmount {
                email: r.email,
                booking_agent_id: r.booking_agent_id,
                commission: Money::from_cents(r.commission),
            })
            .collect())
    }

    async fn frequent_customers(
        &self,
        airline_name: &str,
        range: &DateRange,
        limit: i64,
    ) -> CoreResult<Vec<CustomerTickets>> {
        let sql = format!(
            r#"
            SELECT p.customer_email AS email, c.name AS name, COUNT(*) AS tickets
            {}
            JOIN customer c ON c.email = p.customer_email
            WHERE f.airline_name = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY p.customer_email, c.name
            ORDER BY tickets DESC, email
            LIMIT $4
            "#,
            SOLD
        );
        let rows = sqlx::query_as::<_, CustomerTicketsRow>(&sql)
            .bind(airline_name)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .db_context("frequent customers")?;
        Ok(rows.into_iter().map(CustomerTickets::from).collect())
    }

    async fn customer_flights_on_airline(&self, airline_name: &str, email: &str) -> CoreResult<Vec<Flight>> {
        let sql = format!(
            r#"
            SELECT DISTINCT {}
            {}
            WHERE f.airline_name = $1 AND p.customer_email = $2
            ORDER BY f.departure_time
            "#,
            FLIGHT_COLUMNS, SOLD
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(airline_name)
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .db_context("customer flights on airline")?;
        into_flights(rows)
    }

    async fn monthly_ticket_sales(&self, airline_name: &str, range: &DateRange) -> CoreResult<Vec<MonthlyCount>> {
        let sql = format!(
            r#"
            SELECT to_char(p.purchase_date, 'YYYY-MM') AS month, COUNT(*) AS tickets_sold
            {}
            WHERE f.airline_name = $1 AND p.purchase_date BETWEEN $2 AND $3
            GROUP BY month
            ORDER BY month
            "#,
            SOLD
        );
        let rows = sqlx::query_as::<_, MonthlyCountRow>(&sql)
            .bind(airline_name)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .db_context("monthly ticket sales")?;
        Ok(rows
            .into_iter()
            .map(|r| MonthlyCount {
                month: r.month,
                tickets_sold: r.tickets_sold,
            })
            .collect())
    }

    async fn revenue_split(&self, airline_name: &str, range: &DateRange) -> CoreResult<RevenueSplit> {
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(f.price_cents) FILTER (WHERE p.booking_agent_id IS NULL), 0)::BIGINT AS direct,
                COALESCE(SUM(f.price_cents) FILTER (WHERE p.booking_agent_id IS NOT NULL), 0)::BIGINT AS indirect
            {}
            WHERE f.airline_name = $1 AND p.purchase_date BETWEEN $2 AND $3
            "#,
            SOLD
        );
        let row = sqlx::query_as::<_, RevenueRow>(&sql)
            .bind(airline_name)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.pool)
            .await
            .db_context("revenue split")?;
        Ok(RevenueSplit {
            direct: Money::from_cents(row.direct),
            indirect: Money::from_cents(row.indirect),
        })
    }

    async fn top_destinations(&self, airline_name: &str, range: &DateRange, limit: i64) -> CoreResult<Vec<Destination>> {
        let rows = sqlx::query_as::<_, DestinationRow>(
            r#"
            SELECT f.arrival_airport AS airport_name, a.airport_city, COUNT(*) AS num_flights
            FROM flight f
            JOIN airport a ON a.airport_name = f.arrival_airport
            WHERE f.airline_name = $1
              AND (f.departure_time AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
            GROUP BY f.arrival_airport, a.airport_city
            ORDER BY num_flights DESC, f.arrival_airport
            LIMIT $4
            "#,
        )
        .bind(airline_name)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .db_context("top destinations")?;
        Ok(rows
            .into_iter()
            .map(|r| Destination {
                airport_name: r.airport_name,
                airport_city: r.airport_city,
                num_flights: r.num_flights,
            })
            .collect())
    }
}
