//! Lookup tables: determinations, system units and their maps, prohibition
//! dates, and field offices.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Id, Stamp};

/// Official determination value. The property is always named first, then
/// the structure if relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Determination {
    pub id: Id,
    pub determination: String,
    pub description: String,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl Determination {
    /// Values seeded into a fresh installation.
    pub const STANDARD: [&'static str; 5] = [
        "In",
        "Out",
        "Partially In; Structure In",
        "Partially In; Structure Out",
        "Partially In/No Structure",
    ];
}

impl fmt::Display for Determination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.determination)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDetermination {
    pub determination: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemUnit {
    pub id: Id,
    pub system_unit_number: String,
    pub system_unit_name: String,
    pub field_office: Option<Id>,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl fmt::Display for SystemUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.system_unit_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewSystemUnit {
    pub system_unit_number: String,
    pub system_unit_name: String,
    pub field_office: Option<Id>,
}

/// Date from which the CBRA prohibition applies to a system unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemUnitProhibitionDate {
    pub id: Id,
    pub prohibition_date: NaiveDate,
    pub system_unit: Id,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl fmt::Display for SystemUnitProhibitionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prohibition_date)
    }
}

/// Association between a system unit and a map. Unique per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemUnitMap {
    pub id: Id,
    pub system_unit: Id,
    pub system_map: Id,
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// Unique per (map number, map date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMap {
    pub id: Id,
    pub map_number: String,
    pub map_title: String,
    pub map_date: NaiveDate,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl fmt::Display for SystemMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.map_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSystemMap {
    pub map_number: String,
    #[serde(default)]
    pub map_title: String,
    pub map_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOffice {
    pub id: Id,
    pub field_office_number: String,
    pub field_office_name: String,
    pub field_agent_name: String,
    pub field_agent_email: String,
    pub city: String,
    pub state: Option<String>,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl fmt::Display for FieldOffice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewFieldOffice {
    pub field_office_number: String,
    pub field_office_name: String,
    pub field_agent_name: String,
    pub field_agent_email: String,
    pub city: String,
    pub state: Option<String>,
}
