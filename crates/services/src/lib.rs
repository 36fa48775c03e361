//! # services
//!
//! Use cases of the case-tracking service, written against the ports in
//! `domains`. Adapters are injected through [`Ports`].

use std::sync::Arc;

use domains::{
    AuditRepository, CaseHasher, CaseRepository, Clock, DirectoryRepository, FileStorage,
    LookupRepository, UserRepository,
};

pub mod access;
pub mod accounts;
pub mod cases;
pub mod directory;
pub mod ids;
pub mod lookups;
pub mod policy;

pub use access::{check_staff, Access, Denial};
pub use accounts::{AccountService, NewAccount};
pub use cases::{CaseFilter, CaseService};
pub use directory::DirectoryService;
pub use ids::{SystemClock, UuidCaseHasher};
pub use lookups::LookupService;
pub use policy::{ReviewerPolicy, ReviewerPolicyMode};

/// The adapters every service draws from. Cheap to clone.
#[derive(Clone)]
pub struct Ports {
    pub cases: Arc<dyn CaseRepository>,
    pub directory: Arc<dyn DirectoryRepository>,
    pub lookups: Arc<dyn LookupRepository>,
    pub users: Arc<dyn UserRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub files: Arc<dyn FileStorage>,
    pub hasher: Arc<dyn CaseHasher>,
    pub clock: Arc<dyn Clock>,
}

impl Ports {
    /// Wires a store that implements every repository port, with UUID case
    /// hashes and the system clock.
    pub fn from_store<S>(store: Arc<S>, files: Arc<dyn FileStorage>) -> Self
    where
        S: CaseRepository
            + DirectoryRepository
            + LookupRepository
            + UserRepository
            + AuditRepository
            + 'static,
    {
        Self {
            cases: store.clone(),
            directory: store.clone(),
            lookups: store.clone(),
            users: store.clone(),
            audit: store,
            files,
            hasher: Arc::new(UuidCaseHasher),
            clock: Arc::new(SystemClock),
        }
    }
}
