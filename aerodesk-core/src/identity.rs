use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// The three kinds of account that can hold a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    BookingAgent,
    AirlineStaff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::BookingAgent => "booking_agent",
            Role::AirlineStaff => "airline_staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "booking_agent" => Ok(Role::BookingAgent),
            "airline_staff" => Ok(Role::AirlineStaff),
            other => Err(CoreError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// Who is acting, with the attributes each role needs for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Principal {
    Customer { email: String },
    BookingAgent { email: String, booking_agent_id: i32 },
    AirlineStaff { username: String, airline_name: String },
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Customer { .. } => Role::Customer,
            Principal::BookingAgent { .. } => Role::BookingAgent,
            Principal::AirlineStaff { .. } => Role::AirlineStaff,
        }
    }

    /// Email for customers and agents, username for staff.
    pub fn identifier(&self) -> &str {
        match self {
            Principal::Customer { email } => email,
            Principal::BookingAgent { email, .. } => email,
            Principal::AirlineStaff { username, .. } => username,
        }
    }
}

/// Request-scoped session, built by the HTTP boundary and handed to every
/// core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub principal: Principal,
}

impl SessionContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn role(&self) -> Role {
        self.principal.role()
    }

    pub fn identifier(&self) -> &str {
        self.principal.identifier()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    Admin,
    Operator,
}

impl PermissionKind {
    /// Spelling used in the `permission.permission_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Admin => "Admin",
            PermissionKind::Operator => "Operator",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" | "admin" => Ok(PermissionKind::Admin),
            "Operator" | "operator" => Ok(PermissionKind::Operator),
            other => Err(CoreError::validation(format!("Unknown permission: {}", other))),
        }
    }
}

/// Point-in-time view of a staff member's grants. Display only; checks go
/// through the gate, which re-reads the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub admin: bool,
    pub operator: bool,
}

impl PermissionSet {
    pub fn from_kinds(kinds: impl IntoIterator<Item = PermissionKind>) -> Self {
        kinds.into_iter().fold(Self::default(), |mut set, kind| {
            match kind {
                PermissionKind::Admin => set.admin = true,
                PermissionKind::Operator => set.operator = true,
            }
            set
        })
    }

    pub fn contains(&self, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::Admin => self.admin,
            PermissionKind::Operator => self.operator,
        }
    }

    pub fn describe(&self) -> &'static str {
        match (self.admin, self.operator) {
            (true, true) => "admin and operator",
            (true, false) => "admin",
            (false, true) => "operator",
            (false, false) => "regular airline staff member",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_serializes_with_role_tag() {
        let principal = Principal::AirlineStaff {
            username: "jane".to_string(),
            airline_name: "Delta".to_string(),
        };
        let value = serde_json::to_value(&principal).unwrap();
        assert_eq!(value["role"], "airline_staff");
        assert_eq!(value["airline_name"], "Delta");

        let back: Principal = serde_json::from_value(value).unwrap();
        assert_eq!(back.identifier(), "jane");
        assert_eq!(back.role(), Role::AirlineStaff);
    }

    #[test]
    fn test_permission_set_description() {
        let both = PermissionSet::from_kinds([PermissionKind::Operator, PermissionKind::Admin]);
        assert_eq!(both.describe(), "admin and operator");
        assert!(both.contains(PermissionKind::Admin));
        assert_eq!(PermissionSet::default().describe(), "regular airline staff member");
    }

    #[test]
    fn test_parse_role_and_permission() {
        assert_eq!("booking_agent".parse::<Role>().unwrap(), Role::BookingAgent);
        assert!("pilot".parse::<Role>().is_err());
        assert_eq!("Operator".parse::<PermissionKind>().unwrap(), PermissionKind::Operator);
    }
}
