//! Properties, requesters and tags: plain attribute records with uniqueness
//! constraints enforced by the persistence provider.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Id, Stamp};

/// Postal address shared by properties and requesters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub unit: String,
    pub city: String,
    /// Two-letter USPS code.
    pub state: Option<String>,
    /// `NNNNN` or `NNNNN-NNNN`.
    pub zipcode: Option<String>,
}

/// A real estate property for which a determination has been requested.
/// Unique per address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Id,
    #[serde(flatten)]
    pub address: Address,
    pub subdivision: String,
    pub policy_number: String,
    #[serde(flatten)]
    pub stamp: Stamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProperty {
    #[serde(flatten)]
    pub address: Address,
    pub subdivision: String,
    pub policy_number: String,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.address;
        write!(
            f,
            "{}, {}, {}, {}",
            a.street,
            a.city,
            a.state.as_deref().unwrap_or_default(),
            a.zipcode.as_deref().unwrap_or_default()
        )
    }
}

/// The person asking for a determination. Unique over all contact and
/// address fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requester {
    pub id: Id,
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub email: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(flatten)]
    pub stamp: Stamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewRequester {
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub email: String,
    #[serde(flatten)]
    pub address: Address,
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Keyword used to group similar cases for searching and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub stamp: Stamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTag {
    pub name: String,
    pub description: String,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
