//! Lookup tables: determinations, system units, maps, prohibition dates,
//! and field offices.

use std::sync::Arc;

use chrono::NaiveDate;
use domains::validate::{self, TEXT_MAX};
use domains::{
    Actor, Clock, Determination, DomainError, FieldOffice, Id, LookupRepository, NewDetermination,
    NewFieldOffice, NewSystemMap, NewSystemUnit, Result, Stamp, SystemMap, SystemUnit,
    SystemUnitMap, SystemUnitProhibitionDate,
};

/// Limit for short code fields (unit, map, and office numbers).
const CODE_MAX: usize = 16;

#[derive(Clone)]
pub struct LookupService {
    repo: Arc<dyn LookupRepository>,
    clock: Arc<dyn Clock>,
}

impl LookupService {
    pub fn new(repo: Arc<dyn LookupRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    fn stamp(&self, actor: &Actor) -> Stamp {
        Stamp::created(actor, self.clock.today())
    }

    pub async fn create_determination(&self, actor: &Actor, new: NewDetermination) -> Result<Determination> {
        validate::required("determination", &new.determination)?;
        validate::max_len("determination", &new.determination, 32)?;
        let record = Determination {
            id: 0,
            determination: new.determination,
            description: new.description,
            stamp: self.stamp(actor),
        };
        self.repo.insert_determination(record, actor).await
    }

    pub async fn list_determinations(&self) -> Result<Vec<Determination>> {
        self.repo.list_determinations().await
    }

    /// Inserts any of the standard determination values that are missing.
    /// Returns how many were added.
    pub async fn seed_determinations(&self, actor: &Actor) -> Result<usize> {
        let existing = self.repo.list_determinations().await?;
        let mut added = 0;
        for value in Determination::STANDARD {
            if existing.iter().any(|d| d.determination == value) {
                continue;
            }
            let new = NewDetermination { determination: value.to_string(), description: String::new() };
            self.create_determination(actor, new).await?;
            added += 1;
        }
        Ok(added)
    }

    pub async fn create_system_unit(&self, actor: &Actor, new: NewSystemUnit) -> Result<SystemUnit> {
        validate::required("system_unit_number", &new.system_unit_number)?;
        validate::max_len("system_unit_number", &new.system_unit_number, CODE_MAX)?;
        validate::max_len("system_unit_name", &new.system_unit_name, TEXT_MAX)?;
        if let Some(office) = new.field_office {
            self.get_field_office(office).await?;
        }
        let record = SystemUnit {
            id: 0,
            system_unit_number: new.system_unit_number,
            system_unit_name: new.system_unit_name,
            field_office: new.field_office,
            stamp: self.stamp(actor),
        };
        self.repo.insert_system_unit(record, actor).await
    }

    pub async fn get_system_unit(&self, id: Id) -> Result<SystemUnit> {
        self.repo.get_system_unit(id).await?.ok_or_else(|| DomainError::not_found("SystemUnit", id))
    }

    pub async fn list_system_units(&self) -> Result<Vec<SystemUnit>> {
        self.repo.list_system_units().await
    }

    pub async fn create_system_map(&self, actor: &Actor, new: NewSystemMap) -> Result<SystemMap> {
        validate::required("map_number", &new.map_number)?;
        validate::max_len("map_number", &new.map_number, CODE_MAX)?;
        validate::max_len("map_title", &new.map_title, TEXT_MAX)?;
        let record = SystemMap {
            id: 0,
            map_number: new.map_number,
            map_title: new.map_title,
            map_date: new.map_date,
            stamp: self.stamp(actor),
        };
        self.repo.insert_system_map(record, actor).await
    }

    pub async fn list_system_maps(&self) -> Result<Vec<SystemMap>> {
        self.repo.list_system_maps().await
    }

    pub async fn link_unit_map(&self, actor: &Actor, unit: Id, map: Id) -> Result<SystemUnitMap> {
        self.get_system_unit(unit).await?;
        if self.repo.get_system_map(map).await?.is_none() {
            return Err(DomainError::not_found("SystemMap", map));
        }
        let link = SystemUnitMap { id: 0, system_unit: unit, system_map: map, stamp: self.stamp(actor) };
        self.repo.insert_system_unit_map(link, actor).await
    }

    pub async fn unit_maps(&self, unit: Id) -> Result<Vec<SystemMap>> {
        self.get_system_unit(unit).await?;
        self.repo.list_unit_maps(unit).await
    }

    pub async fn add_prohibition_date(
        &self,
        actor: &Actor,
        unit: Id,
        date: NaiveDate,
    ) -> Result<SystemUnitProhibitionDate> {
        self.get_system_unit(unit).await?;
        let record = SystemUnitProhibitionDate {
            id: 0,
            prohibition_date: date,
            system_unit: unit,
            stamp: self.stamp(actor),
        };
        self.repo.insert_prohibition_date(record, actor).await
    }

    pub async fn prohibition_dates(&self, unit: Id) -> Result<Vec<SystemUnitProhibitionDate>> {
        self.get_system_unit(unit).await?;
        self.repo.list_prohibition_dates(unit).await
    }

    pub async fn create_field_office(&self, actor: &Actor, new: NewFieldOffice) -> Result<FieldOffice> {
        validate::required("field_office_number", &new.field_office_number)?;
        validate::max_len("field_office_number", &new.field_office_number, CODE_MAX)?;
        validate::max_len("field_office_name", &new.field_office_name, TEXT_MAX)?;
        validate::max_len("field_agent_name", &new.field_agent_name, TEXT_MAX)?;
        validate::max_len("field_agent_email", &new.field_agent_email, TEXT_MAX)?;
        validate::email("field_agent_email", &new.field_agent_email)?;
        validate::max_len("city", &new.city, TEXT_MAX)?;
        validate::us_state("state", new.state.as_deref())?;

        let record = FieldOffice {
            id: 0,
            field_office_number: new.field_office_number,
            field_office_name: new.field_office_name,
            field_agent_name: new.field_agent_name,
            field_agent_email: new.field_agent_email,
            city: new.city,
            state: new.state,
            stamp: self.stamp(actor),
        };
        self.repo.insert_field_office(record, actor).await
    }

    pub async fn get_field_office(&self, id: Id) -> Result<FieldOffice> {
        self.repo.get_field_office(id).await?.ok_or_else(|| DomainError::not_found("FieldOffice", id))
    }

    pub async fn list_field_offices(&self) -> Result<Vec<FieldOffice>> {
        self.repo.list_field_offices().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockClock, MockLookupRepository};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 4, 1).unwrap()
    }

    fn service(repo: MockLookupRepository) -> LookupService {
        let mut clock = MockClock::new();
        clock.expect_today().returning(today);
        LookupService::new(Arc::new(repo), Arc::new(clock))
    }

    #[tokio::test]
    async fn seeding_skips_existing_values() {
        let mut repo = MockLookupRepository::new();
        repo.expect_list_determinations().returning(|| {
            Ok(vec![Determination {
                id: 1,
                determination: "In".into(),
                description: String::new(),
                stamp: Stamp::default(),
            }])
        });
        repo.expect_insert_determination()
            .times(4)
            .returning(|d, _| Ok(Determination { id: 2, ..d }));

        let added = service(repo).seed_determinations(&Actor::system()).await.unwrap();
        assert_eq!(added, 4);
    }

    #[tokio::test]
    async fn unit_number_longer_than_sixteen_is_rejected() {
        let mut repo = MockLookupRepository::new();
        repo.expect_insert_system_unit().never();
        let new = NewSystemUnit { system_unit_number: "X".repeat(17), ..Default::default() };
        assert!(service(repo).create_system_unit(&Actor::system(), new).await.is_err());
    }

    #[tokio::test]
    async fn unit_with_unknown_field_office_is_not_found() {
        let mut repo = MockLookupRepository::new();
        repo.expect_get_field_office().returning(|_| Ok(None));
        let new = NewSystemUnit {
            system_unit_number: "SC-01".into(),
            field_office: Some(9),
            ..Default::default()
        };
        let err = service(repo).create_system_unit(&Actor::system(), new).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("FieldOffice", 9));
    }
}
