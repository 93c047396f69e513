use aerodesk_core::airline::FlightLoad;
use aerodesk_core::purchase::BookedFlight;
use aerodesk_core::{Flight, FlightStatus};
use aerodesk_core::{CoreError, CoreResult};
use aerodesk_shared::Money;
use chrono::{DateTime, NaiveDate, Utc};

/// Column list matching [`FlightRow`], for a `flight` aliased as `f`.
pub(crate) const FLIGHT_COLUMNS: &str = "f.airline_name, f.flight_num, f.departure_airport, f.departure_time, \
     f.arrival_airport, f.arrival_time, f.price_cents, f.status, f.airplane_id";

#[derive(sqlx::FromRow)]
pub(crate) struct FlightRow {
    airline_name: String,
    flight_num: i32,
    departure_airport: String,
    departure_time: DateTime<Utc>,
    arrival_airport: String,
    arrival_time: DateTime<Utc>,
    price_cents: i64,
    status: String,
    airplane_id: i32,
}

impl TryFrom<FlightRow> for Flight {
    type Error = CoreError;

    fn try_from(row: FlightRow) -> CoreResult<Self> {
        Ok(Flight {
            airline_name: row.airline_name,
            flight_num: row.flight_num,
            departure_airport: row.departure_airport,
            departure_time: row.departure_time,
            arrival_airport: row.arrival_airport,
            arrival_time: row.arrival_time,
            price: Money::from_cents(row.price_cents),
            status: row.status.parse::<FlightStatus>()?,
            airplane_id: row.airplane_id,
        })
    }
}

pub(crate) fn into_flights(rows: Vec<FlightRow>) -> CoreResult<Vec<Flight>> {
    rows.into_iter().map(Flight::try_from).collect()
}

#[derive(sqlx::FromRow)]
pub(crate) struct FlightLoadRow {
    #[sqlx(flatten)]
    flight: FlightRow,
    num_customers: i64,
}

impl TryFrom<FlightLoadRow> for FlightLoad {
    type Error = CoreError;

    fn try_from(row: FlightLoadRow) -> CoreResult<Self> {
        Ok(FlightLoad {
            flight: row.flight.try_into()?,
            num_customers: row.num_customers,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookedFlightRow {
    #[sqlx(flatten)]
    flight: FlightRow,
    purchase_date: NaiveDate,
    customer_email: String,
}

impl TryFrom<BookedFlightRow> for BookedFlight {
    type Error = CoreError;

    fn try_from(row: BookedFlightRow) -> CoreResult<Self> {
        let flight = Flight::try_from(row.flight)?;
        Ok(BookedFlight {
            airline_name: flight.airline_name,
            flight_num: flight.flight_num,
            departure_airport: flight.departure_airport,
            departure_time: flight.departure_time,
            arrival_airport: flight.arrival_airport,
            arrival_time: flight.arrival_time,
            status: flight.status,
            price: flight.price,
            purchase_date: row.purchase_date,
            customer_email: row.customer_email,
        })
    }
}
