use std::sync::Arc;

use crate::identity::{PermissionKind, PermissionSet, Principal, Role, SessionContext};
use crate::repository::PermissionRepository;
use crate::{CoreError, CoreResult};

/// Borrowed view of a staff session that passed a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffRef<'a> {
    pub username: &'a str,
    pub airline_name: &'a str,
}

/// Role and permission checks in front of every operation.
///
/// Permission checks read the store each time; grants and revocations take
/// effect on the next call.
#[derive(Clone)]
pub struct AuthorizationGate {
    permissions: Arc<dyn PermissionRepository>,
}

impl AuthorizationGate {
    pub fn new(permissions: Arc<dyn PermissionRepository>) -> Self {
        Self { permissions }
    }

    pub fn require_role<'a>(&self, ctx: &'a SessionContext, expected: Role) -> CoreResult<&'a Principal> {
        if ctx.role() != expected {
            return Err(CoreError::forbidden(format!(
                "This action requires the {} role",
                expected
            )));
        }
        Ok(&ctx.principal)
    }

    pub fn require_staff<'a>(&self, ctx: &'a SessionContext) -> CoreResult<StaffRef<'a>> {
        match &ctx.principal {
            Principal::AirlineStaff { username, airline_name } => Ok(StaffRef {
                username,
                airline_name,
            }),
            Principal::Customer { .. } | Principal::BookingAgent { .. } => {
                Err(CoreError::forbidden("This action requires the airline_staff role"))
            }
        }
    }

    pub async fn require_admin<'a>(&self, ctx: &'a SessionContext) -> CoreResult<StaffRef<'a>> {
        self.require_permission(ctx, PermissionKind::Admin).await
    }

    pub async fn require_operator<'a>(&self, ctx: &'a SessionContext) -> CoreResult<StaffRef<'a>> {
        self.require_permission(ctx, PermissionKind::Operator).await
    }

    async fn require_permission<'a>(&self, ctx: &'a SessionContext, kind: PermissionKind) -> CoreResult<StaffRef<'a>> {
        let staff = self.require_staff(ctx)?;
        if !self.permissions.has_permission(staff.username, kind).await? {
            tracing::debug!(username = staff.username, permission = %kind, "Permission check failed");
            return Err(CoreError::forbidden(format!("{} permission required", kind)));
        }
        Ok(staff)
    }

    /// Snapshot for display. Non-staff sessions hold no permissions.
    pub async fn permissions(&self, ctx: &SessionContext) -> CoreResult<PermissionSet> {
        match &ctx.principal {
            Principal::AirlineStaff { username, .. } => self.permissions.permissions_of(username).await,
            Principal::Customer { .. } | Principal::BookingAgent { .. } => Ok(PermissionSet::default()),
        }
    }
}
