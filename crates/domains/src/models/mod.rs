//! # Domain Models
//!
//! These structs represent the persisted entities of the case-tracking system.
//! Identities are 64-bit integers handed out by the persistence provider.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub mod case;
pub mod directory;
pub mod lookup;
pub mod user;

pub use case::*;
pub use directory::*;
pub use lookup::*;
pub use user::*;

/// Identity of any persisted record.
pub type Id = i64;
/// Identity of a [`User`].
pub type UserId = i64;

/// Creation/modification stamp carried by every entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    pub created_date: Option<NaiveDate>,
    pub created_by: Option<UserId>,
    pub modified_date: Option<NaiveDate>,
    pub modified_by: Option<UserId>,
}

impl Stamp {
    pub fn created(actor: &Actor, today: NaiveDate) -> Self {
        Self {
            created_date: Some(today),
            created_by: actor.user_id,
            modified_date: Some(today),
            modified_by: actor.user_id,
        }
    }

    pub fn touch(&mut self, actor: &Actor, today: NaiveDate) {
        self.modified_date = Some(today);
        self.modified_by = actor.user_id;
    }
}

/// The user on whose behalf a mutation is performed.
///
/// Always passed explicitly; nothing in the workspace reads the acting
/// user from ambient request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub username: String,
}

impl Actor {
    pub fn user(user: &User) -> Self {
        Self { user_id: Some(user.id), username: user.username.clone() }
    }

    /// Bootstrap and maintenance writes that have no human author.
    pub fn system() -> Self {
        Self { user_id: None, username: "system".to_string() }
    }
}

/// Distinguishes "field absent" (`None`) from "field explicitly null"
/// (`Some(None)`) in partial updates.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
