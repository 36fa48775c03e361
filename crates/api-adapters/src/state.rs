use std::sync::Arc;

use domains::{CredentialHasher, TokenService, UserRepository};
use services::{AccountService, CaseService, DirectoryService, LookupService, Ports, ReviewerPolicy};

use crate::metrics::Metrics;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub cases: CaseService,
    pub directory: DirectoryService,
    pub lookups: LookupService,
    pub accounts: AccountService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        ports: Ports,
        policy: ReviewerPolicy,
        credentials: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            cases: CaseService::new(ports.clone(), policy),
            directory: DirectoryService::new(ports.directory.clone(), ports.clock.clone()),
            lookups: LookupService::new(ports.lookups.clone(), ports.clock.clone()),
            accounts: AccountService::new(ports.users.clone(), credentials, tokens.clone()),
            users: ports.users,
            tokens,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
