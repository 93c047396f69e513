pub mod app_config;
pub mod catalog_repo;
pub mod database;
mod errors;
pub mod inventory_repo;
pub mod permission_repo;
pub mod purchase_repo;
pub mod report_repo;
mod rows;
pub mod user_repo;

use aerodesk_core::Repositories;
use sqlx::PgPool;
use std::sync::Arc;

pub use database::DbClient;

/// Postgres adapters for every repository port, sharing one pool.
pub fn repositories(pool: &PgPool) -> Repositories {
    Repositories {
        users: Arc::new(user_repo::PgUserRepository::new(pool.clone())),
        permissions: Arc::new(permission_repo::PgPermissionRepository::new(pool.clone())),
        catalog: Arc::new(catalog_repo::PgCatalogRepository::new(pool.clone())),
        inventory: Arc::new(inventory_repo::PgInventoryRepository::new(pool.clone())),
        purchases: Arc::new(purchase_repo::PgPurchaseRepository::new(pool.clone())),
        reports: Arc::new(report_repo::PgReportRepository::new(pool.clone())),
    }
}
