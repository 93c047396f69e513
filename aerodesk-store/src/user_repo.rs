use aerodesk_core::repository::UserRepository;
use aerodesk_core::user::{CustomerProfile, StaffMember, UserDetails, UserRecord};
use aerodesk_core::{CoreResult, Principal, Role};
use aerodesk_shared::Masked;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::errors::DbResultExt;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerLoginRow {
    email: String,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct AgentLoginRow {
    email: String,
    booking_agent_id: i32,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct StaffLoginRow {
    username: String,
    airline_name: String,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    name: String,
    email: String,
    date_of_birth: NaiveDate,
    passport_number: String,
    passport_expiration: NaiveDate,
    passport_country: String,
    phone_number: String,
    building_number: String,
    street: String,
    city: String,
    state: String,
}

#[derive(sqlx::FromRow)]
struct StaffRow {
    username: String,
    first_name: String,
    last_name: String,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_user(&self, role: Role, identifier: &str) -> CoreResult<Option<UserRecord>> {
        let record = match role {
            Role::Customer => sqlx::query_as::<_, CustomerLoginRow>(
                "SELECT email, password_hash FROM customer WHERE email = $1",
            )
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .db_context("load customer")?
            .map(|r| UserRecord {
                principal: Principal::Customer { email: r.email },
                password_hash: Masked::new(r.password_hash),
            }),
            Role::BookingAgent => sqlx::query_as::<_, AgentLoginRow>(
                "SELECT email, booking_agent_id, password_hash FROM booking_agent WHERE email = $1",
            )
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .db_context("load booking agent")?
            .map(|r| UserRecord {
                principal: Principal::BookingAgent {
                    email: r.email,
                    booking_agent_id: r.booking_agent_id,
                },
                password_hash: Masked::new(r.password_hash),
            }),
            Role::AirlineStaff => sqlx::query_as::<_, StaffLoginRow>(
                "SELECT username, airline_name, password_hash FROM airline_staff WHERE username = $1",
            )
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .db_context("load airline staff")?
            .map(|r| UserRecord {
                principal: Principal::AirlineStaff {
                    username: r.username,
                    airline_name: r.airline_name,
                },
                password_hash: Masked::new(r.password_hash),
            }),
        };
        Ok(record)
    }

    async fn insert_user(&self, details: &UserDetails, password_hash: &str) -> CoreResult<()> {
        match details {
            UserDetails::Customer(c) => {
                sqlx::query(
                    r#"
                    INSERT INTO customer (email, name, password_hash, building_number, street, city, state,
                                          phone_number, passport_number, passport_expiration, passport_country,
                                          date_of_birth)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                    "#,
                )
                .bind(&c.email)
                .bind(&c.name)
                .bind(password_hash)
                .bind(&c.address.building_number)
                .bind(&c.address.street)
                .bind(&c.address.city)
                .bind(&c.address.state)
                .bind(&c.phone_number)
                .bind(c.passport.number.expose())
                .bind(c.passport.expiration)
                .bind(&c.passport.country)
                .bind(c.date_of_birth)
                .execute(&self.pool)
                .await
                .db_context("insert customer")?;
            }
            UserDetails::BookingAgent(a) => {
                sqlx::query("INSERT INTO booking_agent (email, password_hash, booking_agent_id) VALUES ($1, $2, $3)")
                    .bind(&a.email)
                    .bind(password_hash)
                    .bind(a.booking_agent_id)
                    .execute(&self.pool)
                    .await
                    .db_context("insert booking agent")?;
            }
            UserDetails::AirlineStaff(s) => {
                sqlx::query(
                    r#"
                    INSERT INTO airline_staff (username, password_hash, first_name, last_name, date_of_birth, airline_name)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(&s.username)
                .bind(password_hash)
                .bind(&s.first_name)
                .bind(&s.last_name)
                .bind(s.date_of_birth)
                .bind(&s.airline_name)
                .execute(&self.pool)
                .await
                .db_context("insert airline staff")?;
            }
        }
        Ok(())
    }

    async fn airline_exists(&self, airline_name: &str) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM airline WHERE airline_name = $1)")
            .bind(airline_name)
            .fetch_one(&self.pool)
            .await
            .db_context("check airline")
    }

    async fn customer_exists(&self, email: &str) -> CoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM customer WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .db_context("check customer")
    }

    async fn customer_profile(&self, email: &str) -> CoreResult<Option<CustomerProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT name, email, date_of_birth, passport_number, passport_expiration, passport_country,
                   phone_number, building_number, street, city, state
            FROM customer
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .db_context("load customer profile")?;

        Ok(row.map(|r| CustomerProfile {
            address: format!("{} {}, {}, {}", r.building_number, r.street, r.city, r.state),
            name: r.name,
            email: r.email,
            date_of_birth: r.date_of_birth,
            passport_number: Masked::new(r.passport_number),
            passport_expiration: r.passport_expiration,
            passport_country: r.passport_country,
            phone_number: r.phone_number,
        }))
    }

    async fn agent_airline(&self, email: &str) -> CoreResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT airline_name FROM booking_agent_work_for WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .db_context("load agent airline")
    }

    async fn insert_affiliated_agent(
        &self,
        email: &str,
        password_hash: &str,
        booking_agent_id: i32,
        airline_name: &str,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.db_context("begin agent insert")?;

        sqlx::query("INSERT INTO booking_agent (email, password_hash, booking_agent_id) VALUES ($1, $2, $3)")
            .bind(email)
            .bind(password_hash)
            .bind(booking_agent_id)
            .execute(&mut *tx)
            .await
            .db_context("insert booking agent")?;

        sqlx::query("INSERT INTO booking_agent_work_for (email, airline_name) VALUES ($1, $2)")
            .bind(email)
            .bind(airline_name)
            .execute(&mut *tx)
            .await
            .db_context("link booking agent")?;

        tx.commit().await.db_context("commit agent insert")
    }

    async fn staff_airline(&self, username: &str) -> CoreResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT airline_name FROM airline_staff WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .db_context("load staff airline")
    }

    async fn list_staff(&self, airline_name: &str) -> CoreResult<Vec<StaffMember>> {
        let rows = sqlx::query_as::<_, StaffRow>(
            "SELECT username, first_name, last_name FROM airline_staff WHERE airline_name = $1 ORDER BY username",
        )
        .bind(airline_name)
        .fetch_all(&self.pool)
        .await
        .db_context("list airline staff")?;

        Ok(rows
            .into_iter()
            .map(|r| StaffMember {
                username: r.username,
                first_name: r.first_name,
                last_name: r.last_name,
            })
            .collect())
    }
}
