//! crates/domains/src/lib.rs
//!
//! The entities, workflow rules, and port definitions of the case-tracking
//! service. No I/O lives here.

pub mod audit;
pub mod error;
pub mod models;
pub mod ports;
pub mod status;
pub mod validate;

// Re-exporting for easier access in other crates
pub use audit::{AuditAction, AuditEntry, EntityKind};
pub use error::*;
pub use models::*;
pub use ports::*;
pub use status::{CaseStatus, Milestones};
