//! Login and account creation.

use std::sync::Arc;

use domains::validate;
use domains::{CredentialHasher, DomainError, IssuedToken, NewUser, Result, TokenService, User, UserRepository};

const USERNAME_MAX: usize = 150;

#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self { users, hasher, tokens }
    }

    /// Exchanges a username and password for a bearer token. Unknown users,
    /// inactive users, and wrong passwords all fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let rejected = || DomainError::Unauthorized("invalid username or password".into());

        let user = self.users.find_by_username(username).await?.ok_or_else(rejected)?;
        if !user.is_active || !self.hasher.verify_password(password, &user.password_hash) {
            tracing::info!(username, "login rejected");
            return Err(rejected());
        }
        self.tokens.issue(&user.username)
    }

    pub async fn create_user(&self, account: NewAccount) -> Result<User> {
        validate::required("username", &account.username)?;
        validate::max_len("username", &account.username, USERNAME_MAX)?;
        validate::required("password", &account.password)?;
        validate::email("email", &account.email)?;
        if self.users.find_by_username(&account.username).await?.is_some() {
            return Err(DomainError::Conflict(format!("user '{}' already exists", account.username)));
        }

        let password_hash = self.hasher.hash_password(&account.password)?;
        let user = self
            .users
            .insert_user(NewUser {
                username: account.username,
                first_name: account.first_name,
                last_name: account.last_name,
                email: account.email,
                is_staff: account.is_staff,
                password_hash,
            })
            .await?;
        tracing::info!(user = user.id, username = %user.username, staff = user.is_staff, "user created");
        Ok(user)
    }
}
