//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` onto the domain models.
//! Every mutation runs in a transaction that also writes its
//! `cbra_audit_log` rows, so a change and its history commit together.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, Row};

use domains::audit;
use domains::{
    Actor, Address, AuditAction, AuditEntry, AuditRepository, Case, CaseFile, CaseQuery,
    CaseRepository, CaseTag, Comment, Determination, DirectoryRepository, DomainError, EntityKind,
    FieldOffice, Id, LookupRepository, NewUser, Property, Requester, Result, Stamp, SystemMap,
    SystemUnit, SystemUnitMap, SystemUnitProhibitionDate, Tag, User, UserId, UserRepository,
};

use crate::Record;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const STAMP_COLUMNS: [&str; 4] = ["created_date", "created_by_id", "modified_date", "modified_by_id"];

fn db_err(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DomainError::Validation(format!("reference does not exist ({})", db.constraint().unwrap_or("foreign key")))
        }
        _ => {
            tracing::error!(error = %err, "database error");
            DomainError::Internal("database error".into())
        }
    }
}

/// Row mapping for one table. `COLUMNS` excludes `id` and lists the
/// columns in the order `bind` supplies them.
trait Table: Record + Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const STAMPED: bool = true;

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q>;
    fn from_row(row: &PgRow) -> sqlx::Result<Self>;

    fn columns() -> Vec<&'static str> {
        let stamp: &[&str] = if Self::STAMPED { &STAMP_COLUMNS } else { &[] };
        Self::COLUMNS.iter().chain(stamp).copied().collect()
    }
}

fn bind_stamp<'q>(query: PgQuery<'q>, stamp: &Stamp) -> PgQuery<'q> {
    query
        .bind(stamp.created_date)
        .bind(stamp.created_by)
        .bind(stamp.modified_date)
        .bind(stamp.modified_by)
}

fn stamp(row: &PgRow) -> sqlx::Result<Stamp> {
    Ok(Stamp {
        created_date: row.try_get("created_date")?,
        created_by: row.try_get("created_by_id")?,
        modified_date: row.try_get("modified_date")?,
        modified_by: row.try_get("modified_by_id")?,
    })
}

fn bind_address<'q>(query: PgQuery<'q>, a: &Address) -> PgQuery<'q> {
    query
        .bind(a.street.clone())
        .bind(a.unit.clone())
        .bind(a.city.clone())
        .bind(a.state.clone())
        .bind(a.zipcode.clone())
}

fn address(row: &PgRow) -> sqlx::Result<Address> {
    Ok(Address {
        street: row.try_get("street")?,
        unit: row.try_get("unit")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zipcode: row.try_get("zipcode")?,
    })
}

impl Table for Case {
    const TABLE: &'static str = "cbra_case";
    const COLUMNS: &'static [&'static str] = &[
        "case_hash",
        "request_date",
        "requester_id",
        "property_id",
        "cbrs_unit_id",
        "map_number_id",
        "cbrs_map_date",
        "determination_id",
        "prohibition_date",
        "distance",
        "fws_fo_received_date",
        "fws_hq_received_date",
        "final_letter_date",
        "close_date",
        "final_letter_recipient",
        "analyst_id",
        "analyst_signoff_date",
        "qc_reviewer_id",
        "qc_reviewer_signoff_date",
        "fws_reviewer_id",
        "fws_reviewer_signoff_date",
        "priority",
    ];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.case_hash.clone())
            .bind(self.request_date)
            .bind(self.requester)
            .bind(self.property)
            .bind(self.cbrs_unit)
            .bind(self.map_number)
            .bind(self.cbrs_map_date)
            .bind(self.determination)
            .bind(self.prohibition_date)
            .bind(self.distance)
            .bind(self.fws_fo_received_date)
            .bind(self.fws_hq_received_date)
            .bind(self.final_letter_date)
            .bind(self.close_date)
            .bind(self.final_letter_recipient.clone())
            .bind(self.analyst)
            .bind(self.analyst_signoff_date)
            .bind(self.qc_reviewer)
            .bind(self.qc_reviewer_signoff_date)
            .bind(self.fws_reviewer)
            .bind(self.fws_reviewer_signoff_date)
            .bind(self.priority);
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Case {
            id: row.try_get("id")?,
            case_hash: row.try_get("case_hash")?,
            request_date: row.try_get("request_date")?,
            requester: row.try_get("requester_id")?,
            property: row.try_get("property_id")?,
            cbrs_unit: row.try_get("cbrs_unit_id")?,
            map_number: row.try_get("map_number_id")?,
            cbrs_map_date: row.try_get("cbrs_map_date")?,
            determination: row.try_get("determination_id")?,
            prohibition_date: row.try_get("prohibition_date")?,
            distance: row.try_get("distance")?,
            fws_fo_received_date: row.try_get("fws_fo_received_date")?,
            fws_hq_received_date: row.try_get("fws_hq_received_date")?,
            final_letter_date: row.try_get("final_letter_date")?,
            close_date: row.try_get("close_date")?,
            final_letter_recipient: row.try_get("final_letter_recipient")?,
            analyst: row.try_get("analyst_id")?,
            analyst_signoff_date: row.try_get("analyst_signoff_date")?,
            qc_reviewer: row.try_get("qc_reviewer_id")?,
            qc_reviewer_signoff_date: row.try_get("qc_reviewer_signoff_date")?,
            fws_reviewer: row.try_get("fws_reviewer_id")?,
            fws_reviewer_signoff_date: row.try_get("fws_reviewer_signoff_date")?,
            priority: row.try_get("priority")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for CaseTag {
    const TABLE: &'static str = "cbra_casetag";
    const COLUMNS: &'static [&'static str] = &["case_id", "tag_id"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        bind_stamp(query.bind(self.case).bind(self.tag), &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(CaseTag {
            id: row.try_get("id")?,
            case: row.try_get("case_id")?,
            tag: row.try_get("tag_id")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for Comment {
    const TABLE: &'static str = "cbra_comment";
    const COLUMNS: &'static [&'static str] = &["comment", "case_id"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        bind_stamp(query.bind(self.comment.clone()).bind(self.case), &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Comment {
            id: row.try_get("id")?,
            comment: row.try_get("comment")?,
            case: row.try_get("case_id")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for CaseFile {
    const TABLE: &'static str = "cbra_casefile";
    const COLUMNS: &'static [&'static str] = &["file", "case_id", "uploader_id", "uploaded_date"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.file.clone())
            .bind(self.case)
            .bind(self.uploader)
            .bind(self.uploaded_date);
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(CaseFile {
            id: row.try_get("id")?,
            file: row.try_get("file")?,
            case: row.try_get("case_id")?,
            uploader: row.try_get("uploader_id")?,
            uploaded_date: row.try_get("uploaded_date")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for Property {
    const TABLE: &'static str = "cbra_property";
    const COLUMNS: &'static [&'static str] =
        &["street", "unit", "city", "state", "zipcode", "subdivision", "policy_number"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = bind_address(query, &self.address)
            .bind(self.subdivision.clone())
            .bind(self.policy_number.clone());
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Property {
            id: row.try_get("id")?,
            address: address(row)?,
            subdivision: row.try_get("subdivision")?,
            policy_number: row.try_get("policy_number")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for Requester {
    const TABLE: &'static str = "cbra_requester";
    const COLUMNS: &'static [&'static str] = &[
        "salutation",
        "first_name",
        "last_name",
        "organization",
        "email",
        "street",
        "unit",
        "city",
        "state",
        "zipcode",
    ];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.salutation.clone())
            .bind(self.first_name.clone())
            .bind(self.last_name.clone())
            .bind(self.organization.clone())
            .bind(self.email.clone());
        bind_stamp(bind_address(query, &self.address), &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Requester {
            id: row.try_get("id")?,
            salutation: row.try_get("salutation")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            organization: row.try_get("organization")?,
            email: row.try_get("email")?,
            address: address(row)?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for Tag {
    const TABLE: &'static str = "cbra_tag";
    const COLUMNS: &'static [&'static str] = &["name", "description"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        bind_stamp(query.bind(self.name.clone()).bind(self.description.clone()), &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Tag {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for Determination {
    const TABLE: &'static str = "cbra_determination";
    const COLUMNS: &'static [&'static str] = &["determination", "description"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query.bind(self.determination.clone()).bind(self.description.clone());
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(Determination {
            id: row.try_get("id")?,
            determination: row.try_get("determination")?,
            description: row.try_get("description")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for SystemUnit {
    const TABLE: &'static str = "cbra_systemunit";
    const COLUMNS: &'static [&'static str] = &["system_unit_number", "system_unit_name", "field_office_id"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.system_unit_number.clone())
            .bind(self.system_unit_name.clone())
            .bind(self.field_office);
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(SystemUnit {
            id: row.try_get("id")?,
            system_unit_number: row.try_get("system_unit_number")?,
            system_unit_name: row.try_get("system_unit_name")?,
            field_office: row.try_get("field_office_id")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for SystemMap {
    const TABLE: &'static str = "cbra_systemmap";
    const COLUMNS: &'static [&'static str] = &["map_number", "map_title", "map_date"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.map_number.clone())
            .bind(self.map_title.clone())
            .bind(self.map_date);
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(SystemMap {
            id: row.try_get("id")?,
            map_number: row.try_get("map_number")?,
            map_title: row.try_get("map_title")?,
            map_date: row.try_get("map_date")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for SystemUnitMap {
    const TABLE: &'static str = "cbra_systemunitmap";
    const COLUMNS: &'static [&'static str] = &["system_unit_id", "system_map_id"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        bind_stamp(query.bind(self.system_unit).bind(self.system_map), &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(SystemUnitMap {
            id: row.try_get("id")?,
            system_unit: row.try_get("system_unit_id")?,
            system_map: row.try_get("system_map_id")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for SystemUnitProhibitionDate {
    const TABLE: &'static str = "cbra_systemunitprohibitiondate";
    const COLUMNS: &'static [&'static str] = &["prohibition_date", "system_unit_id"];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        bind_stamp(query.bind(self.prohibition_date).bind(self.system_unit), &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(SystemUnitProhibitionDate {
            id: row.try_get("id")?,
            prohibition_date: row.try_get("prohibition_date")?,
            system_unit: row.try_get("system_unit_id")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for FieldOffice {
    const TABLE: &'static str = "cbra_fieldoffice";
    const COLUMNS: &'static [&'static str] = &[
        "field_office_number",
        "field_office_name",
        "field_agent_name",
        "field_agent_email",
        "city",
        "state",
    ];

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.field_office_number.clone())
            .bind(self.field_office_name.clone())
            .bind(self.field_agent_name.clone())
            .bind(self.field_agent_email.clone())
            .bind(self.city.clone())
            .bind(self.state.clone());
        bind_stamp(query, &self.stamp)
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(FieldOffice {
            id: row.try_get("id")?,
            field_office_number: row.try_get("field_office_number")?,
            field_office_name: row.try_get("field_office_name")?,
            field_agent_name: row.try_get("field_agent_name")?,
            field_agent_email: row.try_get("field_agent_email")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            stamp: stamp(row)?,
        })
    }
}

impl Table for User {
    const TABLE: &'static str = "cbra_user";
    const COLUMNS: &'static [&'static str] =
        &["username", "first_name", "last_name", "email", "is_staff", "is_active", "password_hash"];
    const STAMPED: bool = false;

    fn bind<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.username.clone())
            .bind(self.first_name.clone())
            .bind(self.last_name.clone())
            .bind(self.email.clone())
            .bind(self.is_staff)
            .bind(self.is_active)
            .bind(self.password_hash.clone())
    }

    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            is_staff: row.try_get("is_staff")?,
            is_active: row.try_get("is_active")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

async fn write_audit(conn: &mut PgConnection, entries: &[AuditEntry]) -> Result<()> {
    for entry in entries {
        sqlx::query(
            "INSERT INTO cbra_audit_log \
             (entity, entity_id, action, field, old_value, new_value, changed_at, changed_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.entity.as_str())
        .bind(entry.entity_id)
        .bind(entry.action.as_str())
        .bind(entry.field.clone())
        .bind(entry.old_value.clone())
        .bind(entry.new_value.clone())
        .bind(entry.changed_at)
        .bind(entry.changed_by)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

fn audit_entry(row: &PgRow) -> Result<AuditEntry> {
    let entity: String = row.try_get("entity").map_err(db_err)?;
    let action: String = row.try_get("action").map_err(db_err)?;
    Ok(AuditEntry {
        entity: EntityKind::parse(&entity)
            .ok_or_else(|| DomainError::Internal(format!("unknown audit entity '{entity}'")))?,
        entity_id: row.try_get("entity_id").map_err(db_err)?,
        action: AuditAction::parse(&action)
            .ok_or_else(|| DomainError::Internal(format!("unknown audit action '{action}'")))?,
        field: row.try_get("field").map_err(db_err)?,
        old_value: row.try_get("old_value").map_err(db_err)?,
        new_value: row.try_get("new_value").map_err(db_err)?,
        changed_at: row.try_get("changed_at").map_err(db_err)?,
        changed_by: row.try_get("changed_by").map_err(db_err)?,
    })
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| DomainError::Internal(format!("migration failed: {err}")))?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    async fn insert<T: Table>(&self, mut record: T, actor: &Actor) -> Result<T> {
        let columns = T::columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = record.bind(sqlx::query(&sql)).fetch_one(&mut *tx).await.map_err(db_err)?;
        let id: Id = row.try_get("id").map_err(db_err)?;
        record.set_id(id);

        let entry = audit::created(T::KIND, id, &record, actor, Utc::now())?;
        write_audit(&mut tx, &[entry]).await?;
        tx.commit().await.map_err(db_err)?;
        tracing::debug!(kind = T::KIND.as_str(), id, "inserted");
        Ok(record)
    }

    async fn update<T: Table>(&self, record: T, actor: &Actor) -> Result<T> {
        let id = record.id();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let before = sqlx::query(&format!("SELECT * FROM {} WHERE id = $1 FOR UPDATE", T::TABLE))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .map(|row| T::from_row(&row))
            .transpose()
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found(T::KIND.as_str(), id))?;

        let columns = T::columns();
        let assignments: Vec<String> =
            columns.iter().enumerate().map(|(i, column)| format!("{column} = ${}", i + 1)).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ${}",
            T::TABLE,
            assignments.join(", "),
            columns.len() + 1
        );
        record.bind(sqlx::query(&sql)).bind(id).execute(&mut *tx).await.map_err(db_err)?;

        let entries = audit::diff(T::KIND, id, &before, &record, actor, Utc::now())?;
        write_audit(&mut tx, &entries).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(record)
    }

    async fn get<T: Table>(&self, id: Id) -> Result<Option<T>> {
        sqlx::query(&format!("SELECT * FROM {} WHERE id = $1", T::TABLE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| T::from_row(&row))
            .transpose()
            .map_err(db_err)
    }

    /// Runs a `SELECT` whose rows are all of table `T`.
    async fn fetch<T: Table>(&self, query: PgQuery<'_>) -> Result<Vec<T>> {
        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(|row| T::from_row(row).map_err(db_err))
            .collect()
    }

    async fn list<T: Table>(&self, order_by: &str) -> Result<Vec<T>> {
        let sql = format!("SELECT * FROM {} ORDER BY {order_by}", T::TABLE);
        self.fetch(sqlx::query(&sql)).await
    }
}

#[async_trait]
impl CaseRepository for PgStore {
    async fn insert_case(&self, case: Case, actor: &Actor) -> Result<Case> {
        self.insert(case, actor).await
    }

    async fn get_case(&self, id: Id) -> Result<Option<Case>> {
        self.get(id).await
    }

    async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>> {
        let sql = "SELECT c.* FROM cbra_case c \
                   WHERE ($1::boolean IS NULL OR c.priority = $1) \
                     AND ($2::bigint IS NULL OR c.requester_id = $2) \
                     AND ($3::bigint IS NULL OR c.property_id = $3) \
                     AND ($4::bigint IS NULL OR EXISTS \
                         (SELECT 1 FROM cbra_casetag ct WHERE ct.case_id = c.id AND ct.tag_id = $4)) \
                   ORDER BY c.id";
        self.fetch(
            sqlx::query(sql)
                .bind(query.priority)
                .bind(query.requester)
                .bind(query.property)
                .bind(query.tag),
        )
        .await
    }

    async fn update_case(&self, case: Case, actor: &Actor) -> Result<Case> {
        self.update(case, actor).await
    }

    async fn insert_case_tag(&self, case_tag: CaseTag, actor: &Actor) -> Result<CaseTag> {
        self.insert(case_tag, actor).await
    }

    async fn delete_case_tag(&self, case: Id, tag: Id, actor: &Actor) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let removed = sqlx::query("DELETE FROM cbra_casetag WHERE case_id = $1 AND tag_id = $2 RETURNING *")
            .bind(case)
            .bind(tag)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        let Some(row) = removed else {
            return Ok(false);
        };

        let link = CaseTag::from_row(&row).map_err(db_err)?;
        let entry = audit::deleted(EntityKind::CaseTag, link.id, &link, actor, Utc::now())?;
        write_audit(&mut tx, &[entry]).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }

    async fn list_case_tags(&self, case: Id) -> Result<Vec<Tag>> {
        let sql = "SELECT t.* FROM cbra_tag t \
                   JOIN cbra_casetag ct ON ct.tag_id = t.id \
                   WHERE ct.case_id = $1 ORDER BY t.name";
        self.fetch(sqlx::query(sql).bind(case)).await
    }

    async fn insert_comment(&self, comment: Comment, actor: &Actor) -> Result<Comment> {
        self.insert(comment, actor).await
    }

    async fn list_comments(&self, case: Id) -> Result<Vec<Comment>> {
        self.fetch(sqlx::query("SELECT * FROM cbra_comment WHERE case_id = $1 ORDER BY id").bind(case))
            .await
    }

    async fn insert_case_file(&self, file: CaseFile, actor: &Actor) -> Result<CaseFile> {
        self.insert(file, actor).await
    }

    async fn list_case_files(&self, case: Id) -> Result<Vec<CaseFile>> {
        self.fetch(sqlx::query("SELECT * FROM cbra_casefile WHERE case_id = $1 ORDER BY id").bind(case))
            .await
    }
}

#[async_trait]
impl DirectoryRepository for PgStore {
    async fn insert_property(&self, property: Property, actor: &Actor) -> Result<Property> {
        self.insert(property, actor).await
    }

    async fn get_property(&self, id: Id) -> Result<Option<Property>> {
        self.get(id).await
    }

    async fn list_properties(&self) -> Result<Vec<Property>> {
        self.list("id").await
    }

    async fn insert_requester(&self, requester: Requester, actor: &Actor) -> Result<Requester> {
        self.insert(requester, actor).await
    }

    async fn get_requester(&self, id: Id) -> Result<Option<Requester>> {
        self.get(id).await
    }

    async fn list_requesters(&self) -> Result<Vec<Requester>> {
        self.list("id").await
    }

    async fn insert_tag(&self, tag: Tag, actor: &Actor) -> Result<Tag> {
        self.insert(tag, actor).await
    }

    async fn get_tag(&self, id: Id) -> Result<Option<Tag>> {
        self.get(id).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.list("name").await
    }
}

#[async_trait]
impl LookupRepository for PgStore {
    async fn insert_determination(&self, d: Determination, actor: &Actor) -> Result<Determination> {
        self.insert(d, actor).await
    }

    async fn get_determination(&self, id: Id) -> Result<Option<Determination>> {
        self.get(id).await
    }

    async fn list_determinations(&self) -> Result<Vec<Determination>> {
        self.list("id").await
    }

    async fn insert_system_unit(&self, unit: SystemUnit, actor: &Actor) -> Result<SystemUnit> {
        self.insert(unit, actor).await
    }

    async fn get_system_unit(&self, id: Id) -> Result<Option<SystemUnit>> {
        self.get(id).await
    }

    async fn list_system_units(&self) -> Result<Vec<SystemUnit>> {
        self.list("id").await
    }

    async fn insert_system_map(&self, map: SystemMap, actor: &Actor) -> Result<SystemMap> {
        self.insert(map, actor).await
    }

    async fn get_system_map(&self, id: Id) -> Result<Option<SystemMap>> {
        self.get(id).await
    }

    async fn list_system_maps(&self) -> Result<Vec<SystemMap>> {
        self.list("id").await
    }

    async fn insert_system_unit_map(&self, link: SystemUnitMap, actor: &Actor) -> Result<SystemUnitMap> {
        self.insert(link, actor).await
    }

    async fn list_unit_maps(&self, unit: Id) -> Result<Vec<SystemMap>> {
        let sql = "SELECT m.* FROM cbra_systemmap m \
                   JOIN cbra_systemunitmap um ON um.system_map_id = m.id \
                   WHERE um.system_unit_id = $1 ORDER BY m.map_number";
        self.fetch(sqlx::query(sql).bind(unit)).await
    }

    async fn insert_prohibition_date(
        &self,
        date: SystemUnitProhibitionDate,
        actor: &Actor,
    ) -> Result<SystemUnitProhibitionDate> {
        self.insert(date, actor).await
    }

    async fn list_prohibition_dates(&self, unit: Id) -> Result<Vec<SystemUnitProhibitionDate>> {
        let sql = "SELECT * FROM cbra_systemunitprohibitiondate \
                   WHERE system_unit_id = $1 ORDER BY prohibition_date DESC";
        self.fetch(sqlx::query(sql).bind(unit)).await
    }

    async fn insert_field_office(&self, office: FieldOffice, actor: &Actor) -> Result<FieldOffice> {
        self.insert(office, actor).await
    }

    async fn get_field_office(&self, id: Id) -> Result<Option<FieldOffice>> {
        self.get(id).await
    }

    async fn list_field_offices(&self) -> Result<Vec<FieldOffice>> {
        self.list("id").await
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM cbra_user WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| User::from_row(&row))
            .transpose()
            .map_err(db_err)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.get(id).await
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
        self.insert(user, &Actor::system()).await
    }
}

#[async_trait]
impl AuditRepository for PgStore {
    async fn history(&self, entity: EntityKind, id: Id) -> Result<Vec<AuditEntry>> {
        sqlx::query(
            "SELECT * FROM cbra_audit_log WHERE entity = $1 AND entity_id = $2 \
             ORDER BY changed_at, id",
        )
        .bind(entity.as_str())
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(audit_entry)
        .collect()
    }
}
