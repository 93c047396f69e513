use chrono::NaiveDate;
use uuid::Uuid;

/// Append-only audit trail of state changes made by the booking core.
///
/// Events are rendered as a single JSON field so log shippers can index them
/// without parsing the message text.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    TicketPurchased {
        purchase_id: Uuid,
        ticket_id: i64,
        airline_name: String,
        flight_num: i32,
        customer_email: String,
        booking_agent_id: Option<i32>,
        purchase_date: NaiveDate,
    },
    FlightCreated {
        airline_name: String,
        flight_num: i32,
        tickets_created: u32,
        created_by: String,
    },
    FlightStatusChanged {
        airline_name: String,
        flight_num: i32,
        status: String,
        changed_by: String,
    },
    PermissionGranted {
        username: String,
        permission: String,
        granted_by: String,
    },
    PermissionRevoked {
        username: String,
        permission: String,
        revoked_by: String,
    },
    BookingAgentAdded {
        email: String,
        booking_agent_id: i32,
        airline_name: String,
        added_by: String,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::TicketPurchased { .. } => "ticket_purchased",
            AuditEvent::FlightCreated { .. } => "flight_created",
            AuditEvent::FlightStatusChanged { .. } => "flight_status_changed",
            AuditEvent::PermissionGranted { .. } => "permission_granted",
            AuditEvent::PermissionRevoked { .. } => "permission_revoked",
            AuditEvent::BookingAgentAdded { .. } => "booking_agent_added",
        }
    }

    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(payload) => tracing::info!(target: "aerodesk::audit", kind = self.kind(), %payload, "audit"),
            Err(e) => tracing::warn!(target: "aerodesk::audit", kind = self.kind(), "Failed to serialize audit event: {}", e),
        }
    }
}
