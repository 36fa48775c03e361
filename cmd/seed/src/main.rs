//! # seed
//!
//! Bootstraps a fresh database: applies migrations, creates a staff account,
//! and loads the standard determination values. Safe to re-run.

use std::sync::Arc;

use anyhow::Context;
use auth_adapters::Argon2Hasher;
use clap::Parser;
use domains::{Actor, CredentialHasher, IssuedToken, Result as DomainResult, TokenService, UserRepository};
use services::{AccountService, LookupService, NewAccount, SystemClock};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-postgres")]
use configs::Settings;
#[cfg(feature = "db-postgres")]
use secrecy::ExposeSecret;

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Create the first staff user and standard lookup values")]
struct Args {
    /// Username of the staff account to create.
    #[arg(long, env = "CBRA_SEED_USERNAME", default_value = "admin")]
    username: String,

    #[arg(long, env = "CBRA_SEED_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, default_value = "")]
    first_name: String,

    #[arg(long, default_value = "")]
    last_name: String,
}

/// Account creation never issues tokens.
struct NoTokens;

impl TokenService for NoTokens {
    fn issue(&self, _username: &str) -> DomainResult<IssuedToken> {
        Err(domains::DomainError::Internal("the seed tool does not issue tokens".into()))
    }

    fn verify(&self, _token: &str) -> DomainResult<String> {
        Err(domains::DomainError::Unauthorized("the seed tool does not verify tokens".into()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    #[cfg(feature = "db-postgres")]
    let store = {
        let settings = Settings::load().context("failed to load configuration")?;
        let url = settings.database.url.as_ref().context("database.url is required")?;
        let store = storage_adapters::PgStore::connect(url.expose_secret(), 2).await?;
        store.migrate().await?;
        Arc::new(store)
    };
    #[cfg(not(feature = "db-postgres"))]
    let store = {
        tracing::warn!("built without db-postgres; seeding an in-memory store has no lasting effect");
        storage_adapters::InMemoryStore::shared()
    };

    let users: Arc<dyn UserRepository> = store.clone();
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new());
    let accounts = AccountService::new(users.clone(), hasher, Arc::new(NoTokens));

    if users.find_by_username(&args.username).await?.is_some() {
        tracing::info!(username = %args.username, "staff user already exists");
    } else {
        let user = accounts
            .create_user(NewAccount {
                username: args.username,
                password: args.password,
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                is_staff: true,
            })
            .await?;
        tracing::info!(id = user.id, username = %user.username, "staff user created");
    }

    let lookups = LookupService::new(store, Arc::new(SystemClock));
    let added = lookups.seed_determinations(&Actor::system()).await?;
    tracing::info!(added, "determinations seeded");
    Ok(())
}
