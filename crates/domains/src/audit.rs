//! # Audit Trail
//!
//! Every mutating repository call appends [`AuditEntry`] rows in the same
//! unit of work as the change itself. Entries are keyed by entity kind,
//! entity id, field, timestamp, and actor.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{Actor, Id, UserId};

/// Stamp fields change on every write; recording them would only add noise.
const UNTRACKED_FIELDS: [&str; 2] = ["modified_date", "modified_by"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Case,
    CaseFile,
    CaseTag,
    Comment,
    Property,
    Requester,
    Tag,
    Determination,
    SystemUnit,
    SystemUnitProhibitionDate,
    SystemUnitMap,
    SystemMap,
    FieldOffice,
    User,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::CaseFile => "case_file",
            Self::CaseTag => "case_tag",
            Self::Comment => "comment",
            Self::Property => "property",
            Self::Requester => "requester",
            Self::Tag => "tag",
            Self::Determination => "determination",
            Self::SystemUnit => "system_unit",
            Self::SystemUnitProhibitionDate => "system_unit_prohibition_date",
            Self::SystemUnitMap => "system_unit_map",
            Self::SystemMap => "system_map",
            Self::FieldOffice => "field_office",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub const ALL: [EntityKind; 14] = [
        Self::Case,
        Self::CaseFile,
        Self::CaseTag,
        Self::Comment,
        Self::Property,
        Self::Requester,
        Self::Tag,
        Self::Determination,
        Self::SystemUnit,
        Self::SystemUnitProhibitionDate,
        Self::SystemUnitMap,
        Self::SystemMap,
        Self::FieldOffice,
        Self::User,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

impl AuditAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// One recorded change. Creation and deletion carry the whole record in
/// `new_value`/`old_value` with no `field`; updates carry one entry per
/// changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entity: EntityKind,
    pub entity_id: Id,
    pub action: AuditAction,
    pub field: Option<String>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<UserId>,
}

pub fn created<T: Serialize>(
    entity: EntityKind,
    entity_id: Id,
    record: &T,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<AuditEntry> {
    Ok(AuditEntry {
        entity,
        entity_id,
        action: AuditAction::Created,
        field: None,
        old_value: None,
        new_value: Some(serde_json::to_value(record)?),
        changed_at: at,
        changed_by: actor.user_id,
    })
}

pub fn deleted<T: Serialize>(
    entity: EntityKind,
    entity_id: Id,
    record: &T,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<AuditEntry> {
    Ok(AuditEntry {
        entity,
        entity_id,
        action: AuditAction::Deleted,
        field: None,
        old_value: Some(serde_json::to_value(record)?),
        new_value: None,
        changed_at: at,
        changed_by: actor.user_id,
    })
}

/// Field-level diff between two versions of a record. Fields are compared on
/// their serialised form; the result is ordered by field name.
pub fn diff<T: Serialize>(
    entity: EntityKind,
    entity_id: Id,
    before: &T,
    after: &T,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<Vec<AuditEntry>> {
    let (Value::Object(before), Value::Object(after)) =
        (serde_json::to_value(before)?, serde_json::to_value(after)?)
    else {
        return Ok(Vec::new());
    };

    let mut fields: Vec<&String> = before.keys().chain(after.keys()).collect();
    fields.sort();
    fields.dedup();

    Ok(fields
        .into_iter()
        .filter(|field| !UNTRACKED_FIELDS.contains(&field.as_str()))
        .filter_map(|field| {
            let old = before.get(field).cloned().unwrap_or(Value::Null);
            let new = after.get(field).cloned().unwrap_or(Value::Null);
            (old != new).then(|| AuditEntry {
                entity,
                entity_id,
                action: AuditAction::Updated,
                field: Some(field.clone()),
                old_value: Some(old),
                new_value: Some(new),
                changed_at: at,
                changed_by: actor.user_id,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actor() -> Actor {
        Actor { user_id: Some(3), username: "alice".into() }
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let before = json!({ "a": 1, "b": "x", "modified_date": "2016-04-01" });
        let after = json!({ "a": 2, "b": "x", "modified_date": "2016-04-02" });
        let entries = diff(EntityKind::Case, 9, &before, &after, &actor(), Utc::now()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field.as_deref(), Some("a"));
        assert_eq!(entries[0].old_value, Some(json!(1)));
        assert_eq!(entries[0].new_value, Some(json!(2)));
        assert_eq!(entries[0].changed_by, Some(3));
    }

    #[test]
    fn created_entry_holds_whole_record() {
        let entry = created(EntityKind::Tag, 1, &json!({ "name": "flood" }), &actor(), Utc::now()).unwrap();
        assert_eq!(entry.action, AuditAction::Created);
        assert!(entry.field.is_none());
        assert_eq!(entry.new_value.unwrap()["name"], "flood");
    }

    #[test]
    fn action_parses_its_own_names() {
        for action in [AuditAction::Created, AuditAction::Updated, AuditAction::Deleted] {
            assert_eq!(AuditAction::parse(action.as_str()), Some(action));
        }
    }
}
