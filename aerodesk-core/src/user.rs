use aerodesk_shared::Masked;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::{Principal, Role};
use crate::{require_non_empty, CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub building_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
}

impl Address {
    /// Single-line form, e.g. `12 Main St, Springfield, IL`.
    pub fn one_line(&self) -> String {
        format!("{} {}, {}, {}", self.building_number, self.street, self.city, self.state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passport {
    pub number: Masked<String>,
    pub expiration: NaiveDate,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    pub name: String,
    pub address: Address,
    pub phone_number: String,
    pub passport: Passport,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDetails {
    pub email: String,
    pub booking_agent_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffDetails {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub airline_name: String,
}

/// Role-specific account attributes supplied at signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum UserDetails {
    Customer(CustomerDetails),
    BookingAgent(AgentDetails),
    AirlineStaff(StaffDetails),
}

impl UserDetails {
    pub fn role(&self) -> Role {
        match self {
            UserDetails::Customer(_) => Role::Customer,
            UserDetails::BookingAgent(_) => Role::BookingAgent,
            UserDetails::AirlineStaff(_) => Role::AirlineStaff,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            UserDetails::Customer(c) => &c.email,
            UserDetails::BookingAgent(a) => &a.email,
            UserDetails::AirlineStaff(s) => &s.username,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        match self {
            UserDetails::Customer(c) => {
                validate_email(&c.email)?;
                require_non_empty("name", &c.name)?;
                require_non_empty("phone_number", &c.phone_number)?;
                require_non_empty("passport_number", c.passport.number.expose())?;
                require_non_empty("passport_country", &c.passport.country)
            }
            UserDetails::BookingAgent(a) => {
                validate_email(&a.email)?;
                if a.booking_agent_id <= 0 {
                    return Err(CoreError::validation("booking_agent_id must be positive"));
                }
                Ok(())
            }
            UserDetails::AirlineStaff(s) => {
                require_non_empty("username", &s.username)?;
                require_non_empty("first_name", &s.first_name)?;
                require_non_empty("last_name", &s.last_name)?;
                require_non_empty("airline_name", &s.airline_name)
            }
        }
    }
}

pub(crate) fn validate_email(email: &str) -> CoreResult<()> {
    require_non_empty("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(CoreError::validation(format!("Malformed email: {}", email))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(flatten)]
    pub details: UserDetails,
    pub password: Masked<String>,
}

/// A stored account as the credential store needs it for login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub principal: Principal,
    pub password_hash: Masked<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub passport_number: Masked<String>,
    pub passport_expiration: NaiveDate,
    pub passport_country: String,
    pub phone_number: String,
    pub address: String,
}

impl From<&CustomerDetails> for CustomerProfile {
    fn from(c: &CustomerDetails) -> Self {
        Self {
            name: c.name.clone(),
            email: c.email.clone(),
            date_of_birth: c.date_of_birth,
            passport_number: c.passport.number.clone(),
            passport_expiration: c.passport.expiration,
            passport_country: c.passport.country.clone(),
            phone_number: c.phone_number.clone(),
            address: c.address.one_line(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
}
