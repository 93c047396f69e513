use aerodesk_core::airline::{DepartureFilter, FlightLoad, ServedAirports};
use aerodesk_core::repository::CatalogRepository;
use aerodesk_core::search::SearchCriteria;
use aerodesk_core::user::CustomerContact;
use aerodesk_core::{Airplane, Airport, CoreError, CoreResult, Flight, FlightKey, FlightStatus};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::DbResultExt;
use crate::rows::{into_flights, FlightLoadRow, FlightRow, FLIGHT_COLUMNS};

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    airport_name: String,
    airport_city: String,
}

#[derive(sqlx::FromRow)]
struct AirplaneRow {
    airline_name: String,
    airplane_id: i32,
    seats: i32,
}

impl From<AirplaneRow> for Airplane {
    fn from(row: AirplaneRow) -> Self {
        Airplane {
            airline_name: row.airline_name,
            airplane_id: row.airplane_id,
            seats: u32::try_from(row.seats).unwrap_or(0),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    name: String,
    email: String,
}

/// `%needle%` with LIKE wildcards in the input escaped.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn insert_airport(&self, airport: &Airport) -> CoreResult<()> {
        sqlx::query("INSERT INTO airport (airport_name, airport_city) VALUES ($1, $2)")
            .bind(&airport.airport_name)
            .bind(&airport.airport_city)
            .execute(&self.pool)
            .await
            .db_context("insert airport")?;
        Ok(())
    }

    async fn airport_exists(&self, airport_name: &str) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM airport WHERE airport_name = $1)")
            .bind(airport_name)
            .fetch_one(&self.pool)
            .await
            .db_context("check airport")
    }

    async fn list_airports(&self) -> CoreResult<Vec<Airport>> {
        let rows = sqlx::query_as::<_, AirportRow>("SELECT airport_name, airport_city FROM airport ORDER BY airport_name")
            .fetch_all(&self.pool)
            .await
            .db_context("list airports")?;
        Ok(rows
            .into_iter()
            .map(|r| Airport {
                airport_name: r.airport_name,
                airport_city: r.airport_city,
            })
            .collect())
    }

    async fn insert_airplane(&self, airplane: &Airplane) -> CoreResult<()> {
        let seats = i32::try_from(airplane.seats).map_err(|_| CoreError::validation("seats is too large"))?;
        sqlx::query("INSERT INTO airplane (airline_name, airplane_id, seats) VALUES ($1, $2, $3)")
            .bind(&airplane.airline_name)
            .bind(airplane.airplane_id)
            .bind(seats)
            .execute(&self.pool)
            .await
            .db_context("insert airplane")?;
        Ok(())
    }

    async fn find_airplane(&self, airline_name: &str, airplane_id: i32) -> CoreResult<Option<Airplane>> {
        let row = sqlx::query_as::<_, AirplaneRow>(
            "SELECT airline_name, airplane_id, seats FROM airplane WHERE airline_name = $1 AND airplane_id = $2",
        )
        .bind(airline_name)
        .bind(airplane_id)
        .fetch_optional(&self.pool)
        .await
        .db_context("load airplane")?;
        Ok(row.map(Airplane::from))
    }

    async fn list_airplanes(&self, airline_name: &str) -> CoreResult<Vec<Airplane>> {
        let rows = sqlx::query_as::<_, AirplaneRow>(
            "SELECT airline_name, airplane_id, seats FROM airplane WHERE airline_name = $1 ORDER BY airplane_id",
        )
        .bind(airline_name)
        .fetch_all(&self.pool)
        .await
        .db_context("list airplanes")?;
        Ok(rows.into_iter().map(Airplane::from).collect())
    }

    async fn find_flight(&self, key: &FlightKey) -> CoreResult<Option<Flight>> {
        let sql = format!(
            "SELECT {} FROM flight f WHERE f.airline_name = $1 AND f.flight_num = $2",
            FLIGHT_COLUMNS
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(&key.airline_name)
            .bind(key.flight_num)
            .fetch_optional(&self.pool)
            .await
            .db_context("load flight")?;
        row.map(Flight::try_from).transpose()
    }

    async fn list_flights(&self) -> CoreResult<Vec<Flight>> {
        let sql = format!("SELECT {} FROM flight f ORDER BY f.departure_time", FLIGHT_COLUMNS);
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .db_context("list flights")?;
        into_flights(rows)
    }

    async fn search_flights(&self, criteria: &SearchCriteria, airline: Option<&str>) -> CoreResult<Vec<Flight>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM flight f
            WHERE f.departure_airport = $1
              AND f.arrival_airport = $2
              AND (f.departure_time AT TIME ZONE 'UTC')::date = $3
              AND ($4::text IS NULL OR f.airline_name = $4)
            ORDER BY f.departure_time
            "#,
            FLIGHT_COLUMNS
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(&criteria.source)
            .bind(&criteria.destination)
            .bind(criteria.date)
            .bind(airline)
            .fetch_all(&self.pool)
            .await
            .db_context("search flights")?;
        into_flights(rows)
    }

    async fn served_airports(&self) -> CoreResult<ServedAirports> {
        let departure_airports = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT departure_airport FROM flight ORDER BY departure_airport",
        )
        .fetch_all(&self.pool)
        .await
        .db_context("list departure airports")?;
        let arrival_airports =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT arrival_airport FROM flight ORDER BY arrival_airport")
                .fetch_all(&self.pool)
                .await
                .db_context("list arrival airports")?;
        Ok(ServedAirports {
            departure_airports,
            arrival_airports,
        })
    }

    async fn update_flight_status(&self, key: &FlightKey, status: FlightStatus) -> CoreResult<()> {
        let result = sqlx::query("UPDATE flight SET status = $1 WHERE airline_name = $2 AND flight_num = $3")
            .bind(status.as_str())
            .bind(&key.airline_name)
            .bind(key.flight_num)
            .execute(&self.pool)
            .await
            .db_context("update flight status")?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("Flight {} not found", key)));
        }
        Ok(())
    }

    async fn airline_flights(&self, airline_name: &str, filter: &DepartureFilter) -> CoreResult<Vec<FlightLoad>> {
        let sql = format!(
            r#"
            SELECT {}, COUNT(DISTINCT p.customer_email) AS num_customers
            FROM flight f
            LEFT JOIN ticket t ON t.airline_name = f.airline_name AND t.flight_num = f.flight_num
            LEFT JOIN purchases p ON p.ticket_id = t.ticket_id
            WHERE f.airline_name = $1
              AND f.departure_time BETWEEN $2 AND $3
              AND f.departure_airport LIKE $4
              AND f.arrival_airport LIKE $5
            GROUP BY f.airline_name, f.flight_num
            ORDER BY f.departure_time
            "#,
            FLIGHT_COLUMNS
        );
        let rows = sqlx::query_as::<_, FlightLoadRow>(&sql)
            .bind(airline_name)
            .bind(filter.from)
            .bind(filter.to)
            .bind(contains_pattern(&filter.source_airport))
            .bind(contains_pattern(&filter.destination_airport))
            .fetch_all(&self.pool)
            .await
            .db_context("list airline flights")?;
        rows.into_iter().map(FlightLoad::try_from).collect()
    }

    async fn flight_customers(&self, key: &FlightKey) -> CoreResult<Vec<CustomerContact>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT DISTINCT c.name, c.email
            FROM purchases p
            JOIN ticket t ON t.ticket_id = p.ticket_id
            JOIN customer c ON c.email = p.customer_email
            WHERE t.airline_name = $1 AND t.flight_num = $2
            ORDER BY c.email
            "#,
        )
        .bind(&key.airline_name)
        .bind(key.flight_num)
        .fetch_all(&self.pool)
        .await
        .db_context("list flight customers")?;
        Ok(rows
            .into_iter()
            .map(|r| CustomerContact {
                name: r.name,
                email: r.email,
            })
            .collect())
    }
}
