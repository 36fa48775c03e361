//! # Case Service
//!
//! Intake and workflow of determination cases: creation, partial updates,
//! reviewer signoffs, final letter and closure, plus the records a case owns
//! (tags, comments, files) and its audit history.

use bytes::Bytes;
use chrono::NaiveDate;
use serde::Deserialize;

use domains::validate::{self, TEXT_MAX};
use domains::{
    Actor, AuditEntry, Case, CaseFile, CasePatch, CaseQuery, CaseStatus, CaseTag, CaseView,
    Comment, DomainError, EntityKind, Id, NewCase, Result, ReviewRole, Stamp, Tag, UserId,
};

use crate::policy::ReviewerPolicy;
use crate::Ports;

/// Listing filter. `status` is matched on the derived value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub priority: Option<bool>,
    pub requester: Option<Id>,
    pub property: Option<Id>,
    pub tag: Option<Id>,
}

impl CaseFilter {
    fn query(&self) -> CaseQuery {
        CaseQuery {
            priority: self.priority,
            requester: self.requester,
            property: self.property,
            tag: self.tag,
        }
    }
}

#[derive(Clone)]
pub struct CaseService {
    ports: Ports,
    policy: ReviewerPolicy,
}

impl CaseService {
    pub fn new(ports: Ports, policy: ReviewerPolicy) -> Self {
        Self { ports, policy }
    }

    /// Records a new determination request.
    #[tracing::instrument(skip(self, new), fields(actor = %actor.username))]
    pub async fn create_case(&self, actor: &Actor, new: NewCase) -> Result<CaseView> {
        validate::max_len("final_letter_recipient", &new.final_letter_recipient, TEXT_MAX)?;
        self.check_references(
            new.requester,
            new.property,
            new.cbrs_unit,
            new.map_number,
            new.determination,
        )
        .await?;

        let today = self.ports.clock.today();
        let case_hash = self.ports.hasher.case_hash();
        let case = Case::from_new(new, case_hash, today, Stamp::created(actor, today));

        let saved = self.ports.cases.insert_case(case, actor).await?;
        tracing::info!(case = saved.id, "case received");
        Ok(CaseView::new(saved, Vec::new()))
    }

    pub async fn get_case(&self, id: Id) -> Result<CaseView> {
        let case = self.load(id).await?;
        let tags = self.ports.cases.list_case_tags(id).await?;
        Ok(CaseView::new(case, tags))
    }

    pub async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseView>> {
        let cases = self.ports.cases.list_cases(&filter.query()).await?;
        let mut views = Vec::with_capacity(cases.len());
        for case in cases {
            if filter.status.is_some_and(|status| status != case.status()) {
                continue;
            }
            let tags = self.ports.cases.list_case_tags(case.id).await?;
            views.push(CaseView::new(case, tags));
        }
        Ok(views)
    }

    #[tracing::instrument(skip(self, patch), fields(actor = %actor.username))]
    pub async fn update_case(&self, actor: &Actor, id: Id, patch: CasePatch) -> Result<CaseView> {
        let mut case = self.load(id).await?;
        patch.apply(&mut case);

        validate::max_len("final_letter_recipient", &case.final_letter_recipient, TEXT_MAX)?;
        self.check_references(
            case.requester,
            case.property,
            case.cbrs_unit,
            case.map_number,
            case.determination,
        )
        .await?;
        if patch.touches_reviewers() {
            for user in [case.analyst, case.qc_reviewer, case.fws_reviewer].into_iter().flatten() {
                self.check_user(user).await?;
            }
        }

        self.save(actor, case).await
    }

    /// Assigns the acting user to `role` and records the signoff date
    /// (today unless given).
    #[tracing::instrument(skip(self), fields(actor = %actor.username))]
    pub async fn sign_off(
        &self,
        actor: &Actor,
        id: Id,
        role: ReviewRole,
        date: Option<NaiveDate>,
    ) -> Result<CaseView> {
        let mut case = self.load(id).await?;
        let date = date.unwrap_or_else(|| self.ports.clock.today());
        case.sign_off(role, actor.user_id, date);
        self.save(actor, case).await
    }

    pub async fn record_final_letter(
        &self,
        actor: &Actor,
        id: Id,
        date: Option<NaiveDate>,
        recipient: Option<String>,
    ) -> Result<CaseView> {
        let mut case = self.load(id).await?;
        case.final_letter_date = Some(date.unwrap_or_else(|| self.ports.clock.today()));
        if let Some(recipient) = recipient {
            validate::max_len("final_letter_recipient", &recipient, TEXT_MAX)?;
            case.final_letter_recipient = recipient;
        }
        self.save(actor, case).await
    }

    pub async fn close_case(&self, actor: &Actor, id: Id, date: Option<NaiveDate>) -> Result<CaseView> {
        let mut case = self.load(id).await?;
        case.close_date = Some(date.unwrap_or_else(|| self.ports.clock.today()));
        self.save(actor, case).await
    }

    pub async fn tag_case(&self, actor: &Actor, case: Id, tag: Id) -> Result<CaseTag> {
        self.load(case).await?;
        if self.ports.directory.get_tag(tag).await?.is_none() {
            return Err(DomainError::not_found("Tag", tag));
        }
        let today = self.ports.clock.today();
        let link = CaseTag { id: 0, case, tag, stamp: Stamp::created(actor, today) };
        self.ports.cases.insert_case_tag(link, actor).await
    }

    pub async fn untag_case(&self, actor: &Actor, case: Id, tag: Id) -> Result<()> {
        if !self.ports.cases.delete_case_tag(case, tag, actor).await? {
            return Err(DomainError::NotFound("CaseTag".into(), format!("{case}/{tag}")));
        }
        Ok(())
    }

    pub async fn case_tags(&self, case: Id) -> Result<Vec<Tag>> {
        self.load(case).await?;
        self.ports.cases.list_case_tags(case).await
    }

    pub async fn add_comment(&self, actor: &Actor, case: Id, text: String) -> Result<Comment> {
        validate::required("comment", &text)?;
        self.load(case).await?;
        let today = self.ports.clock.today();
        let comment = Comment { id: 0, comment: text, case, stamp: Stamp::created(actor, today) };
        self.ports.cases.insert_comment(comment, actor).await
    }

    pub async fn list_comments(&self, case: Id) -> Result<Vec<Comment>> {
        self.load(case).await?;
        self.ports.cases.list_comments(case).await
    }

    /// Stores an attachment and records it on the case. `uploader` is `None`
    /// for files supplied by the requester.
    #[tracing::instrument(skip(self, data), fields(actor = %actor.username, size = data.len()))]
    pub async fn attach_file(
        &self,
        actor: &Actor,
        case: Id,
        uploader: Option<UserId>,
        filename: &str,
        data: Bytes,
    ) -> Result<CaseFile> {
        self.load(case).await?;
        let stored = self.ports.files.store(case, uploader, filename, data).await?;
        let today = self.ports.clock.today();
        let file = CaseFile {
            id: 0,
            file: stored.location.clone(),
            case,
            uploader,
            uploaded_date: Some(today),
            stamp: Stamp::created(actor, today),
        };
        match self.ports.cases.insert_case_file(file, actor).await {
            Ok(file) => Ok(file),
            Err(err) => {
                if let Err(cleanup) = self.ports.files.remove(&stored.location).await {
                    tracing::warn!(case, location = %stored.location, error = %cleanup, "orphaned case file");
                }
                Err(err)
            }
        }
    }

    pub async fn list_files(&self, case: Id) -> Result<Vec<CaseFile>> {
        self.load(case).await?;
        self.ports.cases.list_case_files(case).await
    }

    /// Contents of one of the case's files.
    pub async fn read_file(&self, case: Id, file: Id) -> Result<(CaseFile, Bytes)> {
        let record = self
            .list_files(case)
            .await?
            .into_iter()
            .find(|f| f.id == file)
            .ok_or_else(|| DomainError::not_found("CaseFile", file))?;
        let data = self.ports.files.open(&record.file).await?;
        Ok((record, data))
    }

    pub async fn history(&self, case: Id) -> Result<Vec<AuditEntry>> {
        self.load(case).await?;
        self.ports.audit.history(EntityKind::Case, case).await
    }

    async fn load(&self, id: Id) -> Result<Case> {
        self.ports
            .cases
            .get_case(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Case", id))
    }

    async fn save(&self, actor: &Actor, mut case: Case) -> Result<CaseView> {
        self.policy.check(&case)?;
        case.stamp.touch(actor, self.ports.clock.today());
        let saved = self.ports.cases.update_case(case, actor).await?;
        tracing::info!(case = saved.id, status = %saved.status(), "case updated");
        let tags = self.ports.cases.list_case_tags(saved.id).await?;
        Ok(CaseView::new(saved, tags))
    }

    async fn check_references(
        &self,
        requester: Id,
        property: Id,
        cbrs_unit: Option<Id>,
        map_number: Option<Id>,
        determination: Option<Id>,
    ) -> Result<()> {
        let missing = |entity: &str, id: Id| DomainError::Validation(format!("{entity} {id} does not exist"));

        if self.ports.directory.get_requester(requester).await?.is_none() {
            return Err(missing("requester", requester));
        }
        if self.ports.directory.get_property(property).await?.is_none() {
            return Err(missing("property", property));
        }
        if let Some(id) = cbrs_unit {
            if self.ports.lookups.get_system_unit(id).await?.is_none() {
                return Err(missing("cbrs_unit", id));
            }
        }
        if let Some(id) = map_number {
            if self.ports.lookups.get_system_map(id).await?.is_none() {
                return Err(missing("map_number", id));
            }
        }
        if let Some(id) = determination {
            if self.ports.lookups.get_determination(id).await?.is_none() {
                return Err(missing("determination", id));
            }
        }
        Ok(())
    }

    async fn check_user(&self, id: UserId) -> Result<()> {
        match self.ports.users.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::Validation(format!("user {id} does not exist"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::policy::ReviewerPolicyMode;
    use domains::{
        Address, MockAuditRepository, MockCaseHasher, MockCaseRepository, MockClock,
        MockDirectoryRepository, MockFileStorage, MockLookupRepository, MockUserRepository,
        Property, Requester, StoredFile,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 4, 1).unwrap()
    }

    fn alice() -> Actor {
        Actor { user_id: Some(1), username: "alice".into() }
    }

    fn stored_case(id: Id) -> Case {
        let mut case = Case::from_new(
            NewCase { requester: 10, property: 20, ..Default::default() },
            "hash".into(),
            today(),
            Stamp::default(),
        );
        case.id = id;
        case
    }

    fn directory() -> MockDirectoryRepository {
        let mut directory = MockDirectoryRepository::new();
        directory.expect_get_requester().returning(|id| {
            Ok((id == 10).then(|| Requester {
                id,
                salutation: String::new(),
                first_name: "Pat".into(),
                last_name: "Doe".into(),
                organization: String::new(),
                email: String::new(),
                address: Address::default(),
                stamp: Stamp::default(),
            }))
        });
        directory.expect_get_property().returning(|id| {
            Ok((id == 20).then(|| Property {
                id,
                address: Address::default(),
                subdivision: String::new(),
                policy_number: String::new(),
                stamp: Stamp::default(),
            }))
        });
        directory
    }

    fn service(cases: MockCaseRepository, mode: ReviewerPolicyMode) -> CaseService {
        service_with_files(cases, MockFileStorage::new(), mode)
    }

    fn service_with_files(
        cases: MockCaseRepository,
        files: MockFileStorage,
        mode: ReviewerPolicyMode,
    ) -> CaseService {
        let mut clock = MockClock::new();
        clock.expect_today().returning(today);
        let mut hasher = MockCaseHasher::new();
        hasher.expect_case_hash().returning(|| "cafebabe".into());

        let ports = Ports {
            cases: Arc::new(cases),
            directory: Arc::new(directory()),
            lookups: Arc::new(MockLookupRepository::new()),
            users: Arc::new(MockUserRepository::new()),
            audit: Arc::new(MockAuditRepository::new()),
            files: Arc::new(files),
            hasher: Arc::new(hasher),
            clock: Arc::new(clock),
        };
        CaseService::new(ports, ReviewerPolicy::new(mode))
    }

    #[tokio::test]
    async fn create_case_stamps_hash_and_defaults_request_date() {
        let mut cases = MockCaseRepository::new();
        cases.expect_insert_case().returning(|mut case, _| {
            case.id = 7;
            Ok(case)
        });
        let service = service(cases, ReviewerPolicyMode::Warn);

        let view = service
            .create_case(&alice(), NewCase { requester: 10, property: 20, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(view.case_number, "7");
        assert_eq!(view.status, CaseStatus::Received);
        assert_eq!(view.case.case_hash, "cafebabe");
        assert_eq!(view.case.request_date, today());
        assert_eq!(view.case.stamp.created_by, Some(1));
    }

    #[tokio::test]
    async fn create_case_rejects_unknown_requester() {
        let service = service(MockCaseRepository::new(), ReviewerPolicyMode::Warn);
        let err = service
            .create_case(&alice(), NewCase { requester: 99, property: 20, ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn sign_off_assigns_actor_and_advances_status() {
        let mut cases = MockCaseRepository::new();
        cases.expect_get_case().returning(|id| Ok(Some(stored_case(id))));
        cases.expect_update_case().returning(|case, _| Ok(case));
        cases.expect_list_case_tags().returning(|_| Ok(vec![]));
        let service = service(cases, ReviewerPolicyMode::Warn);

        let view = service.sign_off(&alice(), 3, ReviewRole::Analyst, None).await.unwrap();
        assert_eq!(view.status.label(), "Awaiting QC");
        assert_eq!(view.case.analyst, Some(1));
        assert_eq!(view.case.analyst_signoff_date, Some(today()));
        assert_eq!(view.case.stamp.modified_by, Some(1));
    }

    #[tokio::test]
    async fn enforced_policy_blocks_second_role_for_same_user() {
        let mut cases = MockCaseRepository::new();
        cases.expect_get_case().returning(|id| {
            let mut case = stored_case(id);
            case.sign_off(ReviewRole::Analyst, Some(1), today());
            Ok(Some(case))
        });
        cases.expect_update_case().never();
        let service = service(cases, ReviewerPolicyMode::Enforce);

        let err = service.sign_off(&alice(), 3, ReviewRole::QcReviewer, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn closing_without_letter_reports_closed_status() {
        let mut cases = MockCaseRepository::new();
        cases.expect_get_case().returning(|id| Ok(Some(stored_case(id))));
        cases.expect_update_case().returning(|case, _| Ok(case));
        cases.expect_list_case_tags().returning(|_| Ok(vec![]));
        let service = service(cases, ReviewerPolicyMode::Warn);

        let closed = NaiveDate::from_ymd_opt(2016, 5, 1);
        let view = service.close_case(&alice(), 3, closed).await.unwrap();
        assert_eq!(view.status, CaseStatus::ClosedWithNoFinalLetter);
    }

    #[tokio::test]
    async fn missing_case_is_not_found() {
        let mut cases = MockCaseRepository::new();
        cases.expect_get_case().returning(|_| Ok(None));
        let service = service(cases, ReviewerPolicyMode::Warn);

        let err = service.get_case(404).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("Case", 404));
    }

    #[tokio::test]
    async fn list_filters_on_derived_status() {
        let mut cases = MockCaseRepository::new();
        cases.expect_list_cases().returning(|_| {
            let received = stored_case(1);
            let mut awaiting_qc = stored_case(2);
            awaiting_qc.analyst_signoff_date = Some(today());
            Ok(vec![received, awaiting_qc])
        });
        cases.expect_list_case_tags().returning(|_| Ok(vec![]));
        let service = service(cases, ReviewerPolicyMode::Warn);

        let filter = CaseFilter { status: Some(CaseStatus::AwaitingQc), ..Default::default() };
        let views = service.list_cases(&filter).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].case_number, "2");
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let service = service(MockCaseRepository::new(), ReviewerPolicyMode::Warn);
        let err = service.add_comment(&alice(), 1, "   ".into()).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_file_record_removes_stored_bytes() {
        let mut cases = MockCaseRepository::new();
        cases.expect_get_case().returning(|id| Ok(Some(stored_case(id))));
        cases
            .expect_insert_case_file()
            .times(1)
            .returning(|_, _| Err(DomainError::Internal("database error".into())));

        let mut files = MockFileStorage::new();
        files.expect_store().times(1).returning(|case, _, name, data| {
            Ok(StoredFile {
                location: format!("casefiles/{case}/{name}"),
                content_type: "application/pdf".into(),
                size: data.len() as u64,
            })
        });
        files
            .expect_remove()
            .withf(|location| location == "casefiles/2/survey.pdf")
            .times(1)
            .returning(|_| Ok(()));
        let service = service_with_files(cases, files, ReviewerPolicyMode::Warn);

        let err = service
            .attach_file(&alice(), 2, Some(1), "survey.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
    }
}
