use aerodesk_core::repository::PermissionRepository;
use aerodesk_core::{CoreError, CoreResult, PermissionKind, PermissionSet};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::DbResultExt;

pub struct PgPermissionRepository {
    pool: PgPool,
}

impl PgPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn has_permission(&self, username: &str, kind: PermissionKind) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM permission WHERE username = $1 AND permission_type = $2)",
        )
        .bind(username)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await
        .db_context("check permission")
    }

    async fn permissions_of(&self, username: &str) -> CoreResult<PermissionSet> {
        let kinds = sqlx::query_scalar::<_, String>("SELECT permission_type FROM permission WHERE username = $1")
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .db_context("list permissions")?;

        let kinds = kinds
            .iter()
            .map(|k| k.parse::<PermissionKind>())
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(PermissionSet::from_kinds(kinds))
    }

    async fn grant(&self, username: &str, kind: PermissionKind) -> CoreResult<()> {
        sqlx::query("INSERT INTO permission (username, permission_type) VALUES ($1, $2)")
            .bind(username)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .db_context("grant permission")?;
        Ok(())
    }

    async fn revoke(&self, username: &str, kind: PermissionKind) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM permission WHERE username = $1 AND permission_type = $2")
            .bind(username)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .db_context("revoke permission")?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("{} does not hold {}", username, kind)));
        }
        Ok(())
    }
}
