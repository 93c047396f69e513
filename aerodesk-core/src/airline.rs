use aerodesk_shared::money::MAX_TICKET_PRICE;
use aerodesk_shared::Money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{require_non_empty, CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub airport_name: String,
    pub airport_city: String,
}

impl Airport {
    pub fn validate(&self) -> CoreResult<()> {
        require_non_empty("airport_name", &self.airport_name)?;
        require_non_empty("airport_city", &self.airport_city)
    }
}

/// Seat count decides how many tickets a flight on this airplane gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airplane {
    pub airline_name: String,
    pub airplane_id: i32,
    pub seats: u32,
}

/// Composite flight identity: flight numbers are only unique per airline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline_name: String,
    pub flight_num: i32,
}

impl FlightKey {
    pub fn new(airline_name: impl Into<String>, flight_num: i32) -> Self {
        Self {
            airline_name: airline_name.into(),
            flight_num,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.airline_name, self.flight_num)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Upcoming,
    InProgress,
    Delayed,
    Completed,
    Cancelled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Upcoming => "upcoming",
            FlightStatus::InProgress => "in_progress",
            FlightStatus::Delayed => "delayed",
            FlightStatus::Completed => "completed",
            FlightStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(FlightStatus::Upcoming),
            // the legacy forms wrote "in progress" with a space
            "in_progress" | "in progress" => Ok(FlightStatus::InProgress),
            "delayed" => Ok(FlightStatus::Delayed),
            "completed" => Ok(FlightStatus::Completed),
            "cancelled" => Ok(FlightStatus::Cancelled),
            other => Err(CoreError::validation(format!("Unknown flight status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub airline_name: String,
    pub flight_num: i32,
    pub departure_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_airport: String,
    pub arrival_time: DateTime<Utc>,
    pub price: Money,
    pub status: FlightStatus,
    pub airplane_id: i32,
}

impl Flight {
    pub fn key(&self) -> FlightKey {
        FlightKey::new(self.airline_name.clone(), self.flight_num)
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_time.date_naive()
    }
}

/// Staff input for a new flight; the airline comes from the session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFlight {
    pub flight_num: i32,
    pub departure_airport: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_airport: String,
    pub arrival_time: DateTime<Utc>,
    pub price: Money,
    #[serde(default = "default_status")]
    pub status: FlightStatus,
    pub airplane_id: i32,
}

fn default_status() -> FlightStatus {
    FlightStatus::Upcoming
}

impl NewFlight {
    pub fn validate(&self) -> CoreResult<()> {
        if self.flight_num <= 0 {
            return Err(CoreError::validation("flight_num must be positive"));
        }
        require_non_empty("departure_airport", &self.departure_airport)?;
        require_non_empty("arrival_airport", &self.arrival_airport)?;
        if self.departure_airport == self.arrival_airport {
            return Err(CoreError::validation("departure and arrival airports must differ"));
        }
        if self.arrival_time <= self.departure_time {
            return Err(CoreError::validation("arrival_time must be after departure_time"));
        }
        if self.price.is_negative() {
            return Err(CoreError::validation("price must not be negative"));
        }
        if self.price > MAX_TICKET_PRICE {
            return Err(CoreError::validation(format!("price must not exceed {}", MAX_TICKET_PRICE)));
        }
        Ok(())
    }

    pub fn into_flight(self, airline_name: &str) -> Flight {
        Flight {
            airline_name: airline_name.to_string(),
            flight_num: self.flight_num,
            departure_airport: self.departure_airport,
            departure_time: self.departure_time,
            arrival_airport: self.arrival_airport,
            arrival_time: self.arrival_time,
            price: self.price,
            status: self.status,
            airplane_id: self.airplane_id,
        }
    }
}

/// A flight together with how many passengers hold tickets on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightLoad {
    #[serde(flatten)]
    pub flight: Flight,
    pub num_customers: i64,
}

/// Which of an airline's flights the staff dashboard lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureFilter {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Substring matches, empty means any.
    pub source_airport: String,
    pub destination_airport: String,
}

impl DepartureFilter {
    pub fn matches(&self, flight: &Flight) -> bool {
        flight.departure_time >= self.from
            && flight.departure_time <= self.to
            && flight.departure_airport.contains(self.source_airport.as_str())
            && flight.arrival_airport.contains(self.destination_airport.as_str())
    }
}

/// Distinct airports used by existing flights, for search forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedAirports {
    pub departure_airports: Vec<String>,
    pub arrival_airports: Vec<String>,
}
