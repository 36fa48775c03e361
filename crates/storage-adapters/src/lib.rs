//! # storage-adapters
//!
//! Persistence and file-storage implementations of the `domains` ports.
//!
//! - [`memory`]: always compiled; backs tests and database-less runs.
//! - `postgres` (feature `db-postgres`): sqlx over PostgreSQL.
//! - `local` (feature `media-local`): case files on the local filesystem.

use domains::{
    Case, CaseFile, CaseTag, Comment, Determination, EntityKind, FieldOffice, Id, Property,
    Requester, SystemMap, SystemUnit, SystemUnitMap, SystemUnitProhibitionDate, Tag, User,
};
use serde::Serialize;

pub mod memory;
pub mod upload;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "media-local")]
pub mod local;

pub use memory::{InMemoryFileStorage, InMemoryStore};
pub use upload::UploadPolicy;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;

#[cfg(feature = "media-local")]
pub use local::LocalFileStorage;

/// A persisted row: its audit kind, identity, and uniqueness key.
pub(crate) trait Record: Clone + Serialize + Send + Sync + 'static {
    const KIND: EntityKind;
    fn id(&self) -> Id;
    fn set_id(&mut self, id: Id);
    /// Values covered by the table's uniqueness constraint, if it has one.
    fn unique_key(&self) -> Option<String>;
}

/// Joins key parts with a separator that cannot appear in user text.
macro_rules! key {
    ($($part:expr),+ $(,)?) => {
        [$($part.to_string()),+].join("\u{1f}")
    };
}

macro_rules! record {
    ($ty:ty, $kind:expr, |$r:ident| $key:expr) => {
        impl Record for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> Id {
                self.id
            }

            fn set_id(&mut self, id: Id) {
                self.id = id;
            }

            fn unique_key(&self) -> Option<String> {
                let $r = self;
                $key
            }
        }
    };
}

record!(Case, EntityKind::Case, |_r| None);
record!(CaseTag, EntityKind::CaseTag, |r| Some(key!(r.case, r.tag)));
record!(Comment, EntityKind::Comment, |r| Some(key!(&r.comment, r.case)));
record!(CaseFile, EntityKind::CaseFile, |r| Some(key!(&r.file, r.case)));
record!(Property, EntityKind::Property, |r| {
    let a = &r.address;
    Some(key!(
        &a.street,
        &a.unit,
        &a.city,
        a.state.as_deref().unwrap_or_default(),
        a.zipcode.as_deref().unwrap_or_default(),
    ))
});
record!(Requester, EntityKind::Requester, |r| {
    let a = &r.address;
    Some(key!(
        &r.salutation,
        &r.first_name,
        &r.last_name,
        &r.organization,
        &r.email,
        &a.street,
        &a.unit,
        &a.city,
        a.state.as_deref().unwrap_or_default(),
        a.zipcode.as_deref().unwrap_or_default(),
    ))
});
record!(Tag, EntityKind::Tag, |r| Some(r.name.clone()));
record!(Determination, EntityKind::Determination, |r| Some(r.determination.clone()));
record!(SystemUnit, EntityKind::SystemUnit, |r| Some(r.system_unit_number.clone()));
record!(SystemMap, EntityKind::SystemMap, |r| {
    Some(key!(&r.map_number, r.map_date))
});
record!(SystemUnitMap, EntityKind::SystemUnitMap, |r| {
    Some(key!(r.system_unit, r.system_map))
});
record!(SystemUnitProhibitionDate, EntityKind::SystemUnitProhibitionDate, |r| {
    Some(key!(r.prohibition_date, r.system_unit))
});
record!(FieldOffice, EntityKind::FieldOffice, |r| Some(r.field_office_number.clone()));
record!(User, EntityKind::User, |r| Some(r.username.clone()));
