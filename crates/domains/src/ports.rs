//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Mutating repository calls take the acting user explicitly and record the
//! matching audit entries in the same unit of work.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use crate::audit::{AuditEntry, EntityKind};
use crate::error::Result;
use crate::models::{
    Actor, Case, CaseFile, CaseQuery, CaseTag, Comment, Determination, FieldOffice, Id, NewUser,
    Property, Requester, SystemMap, SystemUnit, SystemUnitMap, SystemUnitProhibitionDate, Tag,
    User, UserId,
};

/// Persistence contract for cases and the records they own.
///
/// Records passed to `insert_*` carry `id: 0`; the store assigns the identity
/// and returns the saved record.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CaseRepository: Send + Sync {
    // Case Operations
    async fn insert_case(&self, case: Case, actor: &Actor) -> Result<Case>;
    async fn get_case(&self, id: Id) -> Result<Option<Case>>;
    async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>>;
    /// Replaces the stored case with `case`. Fails with `NotFound` when absent.
    async fn update_case(&self, case: Case, actor: &Actor) -> Result<Case>;

    // Tag association Operations
    async fn insert_case_tag(&self, case_tag: CaseTag, actor: &Actor) -> Result<CaseTag>;
    /// Returns false when the case was not tagged with `tag`.
    async fn delete_case_tag(&self, case: Id, tag: Id, actor: &Actor) -> Result<bool>;
    async fn list_case_tags(&self, case: Id) -> Result<Vec<Tag>>;

    // Comment Operations
    async fn insert_comment(&self, comment: Comment, actor: &Actor) -> Result<Comment>;
    async fn list_comments(&self, case: Id) -> Result<Vec<Comment>>;

    // File Operations
    async fn insert_case_file(&self, file: CaseFile, actor: &Actor) -> Result<CaseFile>;
    async fn list_case_files(&self, case: Id) -> Result<Vec<CaseFile>>;
}

/// Persistence contract for properties, requesters, and tags.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn insert_property(&self, property: Property, actor: &Actor) -> Result<Property>;
    async fn get_property(&self, id: Id) -> Result<Option<Property>>;
    async fn list_properties(&self) -> Result<Vec<Property>>;

    async fn insert_requester(&self, requester: Requester, actor: &Actor) -> Result<Requester>;
    async fn get_requester(&self, id: Id) -> Result<Option<Requester>>;
    async fn list_requesters(&self) -> Result<Vec<Requester>>;

    async fn insert_tag(&self, tag: Tag, actor: &Actor) -> Result<Tag>;
    async fn get_tag(&self, id: Id) -> Result<Option<Tag>>;
    async fn list_tags(&self) -> Result<Vec<Tag>>;
}

/// Persistence contract for the lookup tables.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LookupRepository: Send + Sync {
    async fn insert_determination(&self, d: Determination, actor: &Actor) -> Result<Determination>;
    async fn get_determination(&self, id: Id) -> Result<Option<Determination>>;
    async fn list_determinations(&self) -> Result<Vec<Determination>>;

    async fn insert_system_unit(&self, unit: SystemUnit, actor: &Actor) -> Result<SystemUnit>;
    async fn get_system_unit(&self, id: Id) -> Result<Option<SystemUnit>>;
    async fn list_system_units(&self) -> Result<Vec<SystemUnit>>;

    async fn insert_system_map(&self, map: SystemMap, actor: &Actor) -> Result<SystemMap>;
    async fn get_system_map(&self, id: Id) -> Result<Option<SystemMap>>;
    async fn list_system_maps(&self) -> Result<Vec<SystemMap>>;

    async fn insert_system_unit_map(&self, link: SystemUnitMap, actor: &Actor) -> Result<SystemUnitMap>;
    /// Maps linked to a system unit.
    async fn list_unit_maps(&self, unit: Id) -> Result<Vec<SystemMap>>;

    async fn insert_prohibition_date(
        &self,
        date: SystemUnitProhibitionDate,
        actor: &Actor,
    ) -> Result<SystemUnitProhibitionDate>;
    /// Newest first.
    async fn list_prohibition_dates(&self, unit: Id) -> Result<Vec<SystemUnitProhibitionDate>>;

    async fn insert_field_office(&self, office: FieldOffice, actor: &Actor) -> Result<FieldOffice>;
    async fn get_field_office(&self, id: Id) -> Result<Option<FieldOffice>>;
    async fn list_field_offices(&self) -> Result<Vec<FieldOffice>>;
}

/// User records, as supplied by the identity provider.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> Result<User>;
}

/// Read side of the audit trail.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// All entries for one record, oldest first.
    async fn history(&self, entity: EntityKind, id: Id) -> Result<Vec<AuditEntry>>;
}

/// Where a case file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Relative location, recorded on the `CaseFile`.
    pub location: String,
    pub content_type: String,
    pub size: u64,
}

/// Attachment storage. Enforces its own size and type policy.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Saves `data` under the case's folder; requester uploads
    /// (`uploader == None`) go to a separate sub-folder.
    async fn store(
        &self,
        case: Id,
        uploader: Option<UserId>,
        filename: &str,
        data: Bytes,
    ) -> Result<StoredFile>;
    async fn open(&self, location: &str) -> Result<Bytes>;
    /// Deletes a stored file. Removing a location that does not exist is not
    /// an error.
    async fn remove(&self, location: &str) -> Result<()>;
}

/// Produces the public case reference handed to requesters.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CaseHasher: Send + Sync {
    fn case_hash(&self) -> String;
}

/// Supplies "today" so date defaults are testable.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Password hashing for user credentials.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// A bearer token handed out on login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_secs: u64,
}

/// Issues and verifies bearer tokens whose subject is a username.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, username: &str) -> Result<IssuedToken>;
    /// Returns the username the token was issued to.
    fn verify(&self, token: &str) -> Result<String>;
}
