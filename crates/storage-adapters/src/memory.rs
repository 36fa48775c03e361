//! # In-memory store
//!
//! A complete, process-local implementation of every repository port.
//! Each table is a `DashMap`; uniqueness constraints are claimed atomically
//! through a shared key index, so concurrent duplicate inserts still fail.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use domains::audit;
use domains::{
    Actor, AuditEntry, AuditRepository, Case, CaseFile, CaseQuery, CaseRepository, CaseTag,
    Comment, Determination, DirectoryRepository, DomainError, EntityKind, FieldOffice, FileStorage,
    Id, LookupRepository, NewUser, Property, Requester, Result, StoredFile, SystemMap, SystemUnit,
    SystemUnitMap, SystemUnitProhibitionDate, Tag, User, UserId, UserRepository,
};

use crate::upload::{self, UploadPolicy};
use crate::Record;

#[derive(Default)]
pub struct InMemoryStore {
    sequences: DashMap<EntityKind, Id>,
    unique: DashMap<(EntityKind, String), Id>,
    audit: DashMap<(EntityKind, Id), Vec<AuditEntry>>,

    cases: DashMap<Id, Case>,
    case_tags: DashMap<Id, CaseTag>,
    comments: DashMap<Id, Comment>,
    case_files: DashMap<Id, CaseFile>,

    properties: DashMap<Id, Property>,
    requesters: DashMap<Id, Requester>,
    tags: DashMap<Id, Tag>,

    determinations: DashMap<Id, Determination>,
    system_units: DashMap<Id, SystemUnit>,
    system_maps: DashMap<Id, SystemMap>,
    unit_maps: DashMap<Id, SystemUnitMap>,
    prohibition_dates: DashMap<Id, SystemUnitProhibitionDate>,
    field_offices: DashMap<Id, FieldOffice>,

    users: DashMap<Id, User>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Per-table identity sequence starting at 1, like a serial column.
    fn next_id(&self, kind: EntityKind) -> Id {
        let mut seq = self.sequences.entry(kind).or_insert(0);
        *seq += 1;
        *seq
    }

    fn claim(&self, kind: EntityKind, key: String, id: Id) -> Result<()> {
        match self.unique.entry((kind, key)) {
            Entry::Occupied(entry) => Err(DomainError::Conflict(format!(
                "{kind} with the same {} already exists",
                describe_key(&entry.key().1)
            ))),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    fn release(&self, kind: EntityKind, key: String) {
        self.unique.remove(&(kind, key));
    }

    fn record_audit(&self, entries: Vec<AuditEntry>) {
        for entry in entries {
            self.audit.entry((entry.entity, entry.entity_id)).or_default().push(entry);
        }
    }

    fn insert<T: Record>(&self, table: &DashMap<Id, T>, mut record: T, actor: &Actor) -> Result<T> {
        let id = self.next_id(T::KIND);
        record.set_id(id);
        if let Some(key) = record.unique_key() {
            self.claim(T::KIND, key, id)?;
        }
        let entry = audit::created(T::KIND, id, &record, actor, Utc::now())?;
        table.insert(id, record.clone());
        self.record_audit(vec![entry]);
        tracing::debug!(kind = T::KIND.as_str(), id, "inserted");
        Ok(record)
    }

    fn update<T: Record>(&self, table: &DashMap<Id, T>, record: T, actor: &Actor) -> Result<T> {
        let id = record.id();
        let mut slot = table
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(T::KIND.as_str(), id))?;

        let (old_key, new_key) = (slot.unique_key(), record.unique_key());
        if old_key != new_key {
            if let Some(key) = new_key {
                self.claim(T::KIND, key, id)?;
            }
            if let Some(key) = old_key {
                self.release(T::KIND, key);
            }
        }

        let entries = audit::diff(T::KIND, id, &*slot, &record, actor, Utc::now())?;
        *slot = record.clone();
        drop(slot);
        self.record_audit(entries);
        Ok(record)
    }

    fn remove<T: Record>(&self, table: &DashMap<Id, T>, id: Id, actor: &Actor) -> Result<Option<T>> {
        let Some((_, record)) = table.remove(&id) else {
            return Ok(None);
        };
        if let Some(key) = record.unique_key() {
            self.release(T::KIND, key);
        }
        self.record_audit(vec![audit::deleted(T::KIND, id, &record, actor, Utc::now())?]);
        Ok(Some(record))
    }

    fn get<T: Record>(table: &DashMap<Id, T>, id: Id) -> Option<T> {
        table.get(&id).map(|r| r.value().clone())
    }

    /// Rows matching `keep`, ordered by identity.
    fn select<T: Record>(table: &DashMap<Id, T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<T> = table
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(Record::id);
        rows
    }
}

fn describe_key(key: &str) -> String {
    key.replace('\u{1f}', " / ")
}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn insert_case(&self, case: Case, actor: &Actor) -> Result<Case> {
        self.insert(&self.cases, case, actor)
    }

    async fn get_case(&self, id: Id) -> Result<Option<Case>> {
        Ok(Self::get(&self.cases, id))
    }

    async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>> {
        let tagged = |case: Id, tag: Id| {
            self.case_tags.iter().any(|ct| ct.case == case && ct.tag == tag)
        };
        Ok(Self::select(&self.cases, |c| {
            query.priority.is_none_or(|p| c.priority == p)
                && query.requester.is_none_or(|r| c.requester == r)
                && query.property.is_none_or(|p| c.property == p)
                && query.tag.is_none_or(|t| tagged(c.id, t))
        }))
    }

    async fn update_case(&self, case: Case, actor: &Actor) -> Result<Case> {
        self.update(&self.cases, case, actor)
    }

    async fn insert_case_tag(&self, case_tag: CaseTag, actor: &Actor) -> Result<CaseTag> {
        self.insert(&self.case_tags, case_tag, actor)
    }

    async fn delete_case_tag(&self, case: Id, tag: Id, actor: &Actor) -> Result<bool> {
        let found = self
            .case_tags
            .iter()
            .find(|ct| ct.case == case && ct.tag == tag)
            .map(|ct| ct.id);
        match found {
            Some(id) => Ok(self.remove(&self.case_tags, id, actor)?.is_some()),
            None => Ok(false),
        }
    }

    async fn list_case_tags(&self, case: Id) -> Result<Vec<Tag>> {
        let tag_ids: Vec<Id> = Self::select(&self.case_tags, |ct| ct.case == case)
            .into_iter()
            .map(|ct| ct.tag)
            .collect();
        let mut tags = Self::select(&self.tags, |t| tag_ids.contains(&t.id));
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn insert_comment(&self, comment: Comment, actor: &Actor) -> Result<Comment> {
        self.insert(&self.comments, comment, actor)
    }

    async fn list_comments(&self, case: Id) -> Result<Vec<Comment>> {
        Ok(Self::select(&self.comments, |c| c.case == case))
    }

    async fn insert_case_file(&self, file: CaseFile, actor: &Actor) -> Result<CaseFile> {
        self.insert(&self.case_files, file, actor)
    }

    async fn list_case_files(&self, case: Id) -> Result<Vec<CaseFile>> {
        Ok(Self::select(&self.case_files, |f| f.case == case))
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryStore {
    async fn insert_property(&self, property: Property, actor: &Actor) -> Result<Property> {
        self.insert(&self.properties, property, actor)
    }

    async fn get_property(&self, id: Id) -> Result<Option<Property>> {
        Ok(Self::get(&self.properties, id))
    }

    async fn list_properties(&self) -> Result<Vec<Property>> {
        Ok(Self::select(&self.properties, |_| true))
    }

    async fn insert_requester(&self, requester: Requester, actor: &Actor) -> Result<Requester> {
        self.insert(&self.requesters, requester, actor)
    }

    async fn get_requester(&self, id: Id) -> Result<Option<Requester>> {
        Ok(Self::get(&self.requesters, id))
    }

    async fn list_requesters(&self) -> Result<Vec<Requester>> {
        Ok(Self::select(&self.requesters, |_| true))
    }

    async fn insert_tag(&self, tag: Tag, actor: &Actor) -> Result<Tag> {
        self.insert(&self.tags, tag, actor)
    }

    async fn get_tag(&self, id: Id) -> Result<Option<Tag>> {
        Ok(Self::get(&self.tags, id))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags = Self::select(&self.tags, |_| true);
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl LookupRepository for InMemoryStore {
    async fn insert_determination(&self, d: Determination, actor: &Actor) -> Result<Determination> {
        self.insert(&self.determinations, d, actor)
    }

    async fn get_determination(&self, id: Id) -> Result<Option<Determination>> {
        Ok(Self::get(&self.determinations, id))
    }

    async fn list_determinations(&self) -> Result<Vec<Determination>> {
        Ok(Self::select(&self.determinations, |_| true))
    }

    async fn insert_system_unit(&self, unit: SystemUnit, actor: &Actor) -> Result<SystemUnit> {
        self.insert(&self.system_units, unit, actor)
    }

    async fn get_system_unit(&self, id: Id) -> Result<Option<SystemUnit>> {
        Ok(Self::get(&self.system_units, id))
    }

    async fn list_system_units(&self) -> Result<Vec<SystemUnit>> {
        Ok(Self::select(&self.system_units, |_| true))
    }

    async fn insert_system_map(&self, map: SystemMap, actor: &Actor) -> Result<SystemMap> {
        self.insert(&self.system_maps, map, actor)
    }

    async fn get_system_map(&self, id: Id) -> Result<Option<SystemMap>> {
        Ok(Self::get(&self.system_maps, id))
    }

    async fn list_system_maps(&self) -> Result<Vec<SystemMap>> {
        Ok(Self::select(&self.system_maps, |_| true))
    }

    async fn insert_system_unit_map(&self, link: SystemUnitMap, actor: &Actor) -> Result<SystemUnitMap> {
        self.insert(&self.unit_maps, link, actor)
    }

    async fn list_unit_maps(&self, unit: Id) -> Result<Vec<SystemMap>> {
        let map_ids: Vec<Id> = Self::select(&self.unit_maps, |l| l.system_unit == unit)
            .into_iter()
            .map(|l| l.system_map)
            .collect();
        let mut maps = Self::select(&self.system_maps, |m| map_ids.contains(&m.id));
        maps.sort_by(|a, b| a.map_number.cmp(&b.map_number));
        Ok(maps)
    }

    async fn insert_prohibition_date(
        &self,
        date: SystemUnitProhibitionDate,
        actor: &Actor,
    ) -> Result<SystemUnitProhibitionDate> {
        self.insert(&self.prohibition_dates, date, actor)
    }

    async fn list_prohibition_dates(&self, unit: Id) -> Result<Vec<SystemUnitProhibitionDate>> {
        let mut dates = Self::select(&self.prohibition_dates, |d| d.system_unit == unit);
        dates.sort_by(|a, b| b.prohibition_date.cmp(&a.prohibition_date));
        Ok(dates)
    }

    async fn insert_field_office(&self, office: FieldOffice, actor: &Actor) -> Result<FieldOffice> {
        self.insert(&self.field_offices, office, actor)
    }

    async fn get_field_office(&self, id: Id) -> Result<Option<FieldOffice>> {
        Ok(Self::get(&self.field_offices, id))
    }

    async fn list_field_offices(&self) -> Result<Vec<FieldOffice>> {
        Ok(Self::select(&self.field_offices, |_| true))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(Self::get(&self.users, id))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = User {
            id: 0,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            is_staff: user.is_staff,
            is_active: true,
            password_hash: user.password_hash,
        };
        self.insert(&self.users, user, &Actor::system())
    }
}

#[async_trait]
impl AuditRepository for InMemoryStore {
    async fn history(&self, entity: EntityKind, id: Id) -> Result<Vec<AuditEntry>> {
        Ok(self.audit.get(&(entity, id)).map(|e| e.value().clone()).unwrap_or_default())
    }
}

/// Process-local `FileStorage` applying the same upload policy as the disk
/// adapter.
#[derive(Default)]
pub struct InMemoryFileStorage {
    policy: UploadPolicy,
    files: DashMap<String, Bytes>,
}

impl InMemoryFileStorage {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy, files: DashMap::new() }
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store(
        &self,
        case: Id,
        uploader: Option<UserId>,
        filename: &str,
        data: Bytes,
    ) -> Result<StoredFile> {
        let name = self.policy.check(filename, data.len() as u64)?;
        let location = upload::case_file_location(case, uploader, &name);
        let size = data.len() as u64;
        match self.files.entry(location.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!("{location} already exists"))),
            Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(StoredFile { content_type: upload::content_type(&name), location, size })
            }
        }
    }

    async fn open(&self, location: &str) -> Result<Bytes> {
        self.files
            .get(location)
            .map(|f| f.value().clone())
            .ok_or_else(|| DomainError::not_found("file", location))
    }

    async fn remove(&self, location: &str) -> Result<()> {
        self.files.remove(location);
        Ok(())
    }
}
