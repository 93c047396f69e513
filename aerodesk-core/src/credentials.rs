use async_trait::async_trait;
use std::sync::Arc;

use crate::identity::{Principal, Role, SessionContext};
use crate::repository::UserRepository;
use crate::user::{CustomerProfile, SignupRequest, UserDetails};
use crate::{CoreError, CoreResult};

/// One-way password digests.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> CoreResult<String>;

    async fn verify(&self, password: &str, digest: &str) -> CoreResult<bool>;
}

/// bcrypt with a configurable cost. Work runs on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> CoreResult<String> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| CoreError::internal(format!("Hash task failed: {}", e)))?
            .map_err(|e| CoreError::internal(format!("Hashing failed: {}", e)))
    }

    async fn verify(&self, password: &str, digest: &str) -> CoreResult<bool> {
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
            .await
            .map_err(|e| CoreError::internal(format!("Verify task failed: {}", e)))?
            .map_err(|e| CoreError::internal(format!("Stored digest is unreadable: {}", e)))
    }
}

/// Accounts and login for all three roles.
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    pub async fn signup(&self, request: SignupRequest) -> CoreResult<()> {
        let details = &request.details;
        details.validate()?;
        if request.password.expose().is_empty() {
            return Err(CoreError::validation("password is required"));
        }

        if let UserDetails::AirlineStaff(staff) = details {
            if !self.users.airline_exists(&staff.airline_name).await? {
                return Err(CoreError::validation(format!("Unknown airline: {}", staff.airline_name)));
            }
        }

        let role = details.role();
        if self.users.find_user(role, details.identifier()).await?.is_some() {
            return Err(CoreError::conflict(format!(
                "A {} account already exists for {}",
                role,
                details.identifier()
            )));
        }

        let digest = self.hasher.hash(request.password.expose()).await?;
        self.users.insert_user(details, &digest).await?;

        tracing::info!(role = %role, identifier = details.identifier(), "Account created");
        Ok(())
    }

    /// Unknown accounts and wrong passwords fail the same way.
    pub async fn login(&self, role: Role, identifier: &str, password: &str) -> CoreResult<SessionContext> {
        let Some(record) = self.users.find_user(role, identifier).await? else {
            tracing::debug!(role = %role, identifier, "Login for unknown account");
            return Err(CoreError::InvalidCredentials);
        };

        if !self.hasher.verify(password, record.password_hash.expose()).await? {
            tracing::debug!(role = %role, identifier, "Login with wrong password");
            return Err(CoreError::InvalidCredentials);
        }

        Ok(SessionContext::new(record.principal))
    }

    pub async fn profile(&self, ctx: &SessionContext) -> CoreResult<CustomerProfile> {
        let Principal::Customer { email } = &ctx.principal else {
            return Err(CoreError::forbidden("This action requires the customer role"));
        };
        self.users
            .customer_profile(email)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Customer {} not found", email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{fixtures, MemoryStore};
    use crate::user::{AgentDetails, StaffDetails};
    use aerodesk_shared::Masked;
    use chrono::NaiveDate;

    fn credentials(store: &Arc<MemoryStore>) -> CredentialStore {
        CredentialStore::new(store.clone(), Arc::new(BcryptHasher::new(4)))
    }

    fn customer_signup(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            details: UserDetails::Customer(fixtures::customer_details(email)),
            password: Masked::new(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let store = MemoryStore::new();
        let creds = credentials(&store);
        creds.signup(customer_signup("a@example.com", "s3cret")).await.unwrap();

        let ctx = creds.login(Role::Customer, "a@example.com", "s3cret").await.unwrap();
        assert_eq!(ctx.role(), Role::Customer);
        assert_eq!(ctx.identifier(), "a@example.com");

        let profile = creds.profile(&ctx).await.unwrap();
        assert_eq!(profile.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let store = MemoryStore::new();
        let creds = credentials(&store);
        creds.signup(customer_signup("a@example.com", "s3cret")).await.unwrap();

        let record = store.find_user(Role::Customer, "a@example.com").await.unwrap().unwrap();
        assert_ne!(record.password_hash.expose(), "s3cret");
        assert!(record.password_hash.expose().starts_with("$2"));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let store = MemoryStore::new();
        let creds = credentials(&store);
        creds.signup(customer_signup("a@example.com", "s3cret")).await.unwrap();

        let wrong = creds.login(Role::Customer, "a@example.com", "guess").await;
        let unknown = creds.login(Role::Customer, "nobody@example.com", "s3cret").await;
        assert!(matches!(wrong, Err(CoreError::InvalidCredentials)));
        assert!(matches!(unknown, Err(CoreError::InvalidCredentials)));

        // same email, other role
        let as_agent = creds.login(Role::BookingAgent, "a@example.com", "s3cret").await;
        assert!(matches!(as_agent, Err(CoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let store = MemoryStore::new();
        let creds = credentials(&store);
        creds.signup(customer_signup("a@example.com", "one")).await.unwrap();
        let again = creds.signup(customer_signup("a@example.com", "two")).await;
        assert!(matches!(again, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let store = MemoryStore::new();
        let creds = credentials(&store);

        assert!(matches!(
            creds.signup(customer_signup("not-an-email", "pw")).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            creds.signup(customer_signup("a@example.com", "")).await,
            Err(CoreError::ValidationError(_))
        ));

        let staff = SignupRequest {
            details: UserDetails::AirlineStaff(StaffDetails {
                username: "jane".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                airline_name: "Nowhere Air".to_string(),
            }),
            password: Masked::new("pw".to_string()),
        };
        assert!(matches!(creds.signup(staff).await, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_staff_and_agent_sessions_carry_role_attributes() {
        let store = MemoryStore::new();
        fixtures::seed_airline(&store, "Delta").await;
        let creds = credentials(&store);

        creds
            .signup(SignupRequest {
                details: UserDetails::AirlineStaff(StaffDetails {
                    username: "jane".to_string(),
                    first_name: "Jane".to_string(),
                    last_name: "Doe".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                    airline_name: "Delta".to_string(),
                }),
                password: Masked::new("pw".to_string()),
            })
            .await
            .unwrap();
        let staff = creds.login(Role::AirlineStaff, "jane", "pw").await.unwrap();
        assert_eq!(
            staff.principal,
            Principal::AirlineStaff {
                username: "jane".to_string(),
                airline_name: "Delta".to_string(),
            }
        );

        creds
            .signup(SignupRequest {
                details: UserDetails::BookingAgent(AgentDetails {
                    email: "agent@travel.example".to_string(),
                    booking_agent_id: 4321,
                }),
                password: Masked::new("pw".to_string()),
            })
            .await
            .unwrap();
        let agent = creds.login(Role::BookingAgent, "agent@travel.example", "pw").await.unwrap();
        assert!(matches!(
            agent.principal,
            Principal::BookingAgent { booking_agent_id: 4321, .. }
        ));
    }

    #[tokio::test]
    async fn test_profile_requires_customer() {
        let store = MemoryStore::new();
        let creds = credentials(&store);
        let agent = SessionContext::new(Principal::BookingAgent {
            email: "agent@travel.example".to_string(),
            booking_agent_id: 1,
        });
        assert!(matches!(creds.profile(&agent).await, Err(CoreError::Forbidden(_))));
    }
}
