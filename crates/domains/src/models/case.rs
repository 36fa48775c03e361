//! Cases and the records owned by them (tags, comments, files).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{double_option, Id, Stamp, Tag, UserId};
use crate::status::{CaseStatus, Milestones};

/// An official case documenting the determination for a property on behalf
/// of a requester.
///
/// The analyst, QC reviewer, and FWS reviewer are meant to be three different
/// people; see `services::policy::ReviewerPolicy` for how that is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: Id,
    /// Public reference handed to requesters; generated once at creation.
    pub case_hash: String,
    pub request_date: NaiveDate,
    pub requester: Id,
    pub property: Id,
    pub cbrs_unit: Option<Id>,
    pub map_number: Option<Id>,
    pub cbrs_map_date: Option<NaiveDate>,
    pub determination: Option<Id>,
    pub prohibition_date: Option<NaiveDate>,
    pub distance: Option<f64>,
    pub fws_fo_received_date: Option<NaiveDate>,
    pub fws_hq_received_date: Option<NaiveDate>,
    pub final_letter_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub final_letter_recipient: String,
    pub analyst: Option<UserId>,
    pub analyst_signoff_date: Option<NaiveDate>,
    pub qc_reviewer: Option<UserId>,
    pub qc_reviewer_signoff_date: Option<NaiveDate>,
    pub fws_reviewer: Option<UserId>,
    pub fws_reviewer_signoff_date: Option<NaiveDate>,
    pub priority: bool,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl Case {
    /// Display number of the case: its identity, formatted.
    pub fn case_number(&self) -> String {
        self.id.to_string()
    }

    pub fn milestones(&self) -> Milestones {
        Milestones {
            close_date: self.close_date,
            final_letter_date: self.final_letter_date,
            fws_reviewer_signoff_date: self.fws_reviewer_signoff_date,
            qc_reviewer_signoff_date: self.qc_reviewer_signoff_date,
            analyst_signoff_date: self.analyst_signoff_date,
        }
    }

    pub fn status(&self) -> CaseStatus {
        CaseStatus::derive(&self.milestones())
    }

    /// Builds an unsaved case (`id` 0) from an intake request.
    pub fn from_new(new: NewCase, case_hash: String, today: NaiveDate, stamp: Stamp) -> Self {
        Self {
            id: 0,
            case_hash,
            request_date: new.request_date.unwrap_or(today),
            requester: new.requester,
            property: new.property,
            cbrs_unit: new.cbrs_unit,
            map_number: new.map_number,
            cbrs_map_date: new.cbrs_map_date,
            determination: new.determination,
            prohibition_date: new.prohibition_date,
            distance: new.distance,
            fws_fo_received_date: new.fws_fo_received_date,
            fws_hq_received_date: new.fws_hq_received_date,
            final_letter_date: None,
            close_date: None,
            final_letter_recipient: new.final_letter_recipient,
            analyst: None,
            analyst_signoff_date: None,
            qc_reviewer: None,
            qc_reviewer_signoff_date: None,
            fws_reviewer: None,
            fws_reviewer_signoff_date: None,
            priority: new.priority,
            stamp,
        }
    }

    pub fn reviewer(&self, role: ReviewRole) -> Option<UserId> {
        match role {
            ReviewRole::Analyst => self.analyst,
            ReviewRole::QcReviewer => self.qc_reviewer,
            ReviewRole::FwsReviewer => self.fws_reviewer,
        }
    }

    /// Assigns `user` to `role` and records the signoff date.
    pub fn sign_off(&mut self, role: ReviewRole, user: Option<UserId>, date: NaiveDate) {
        match role {
            ReviewRole::Analyst => {
                self.analyst = user;
                self.analyst_signoff_date = Some(date);
            }
            ReviewRole::QcReviewer => {
                self.qc_reviewer = user;
                self.qc_reviewer_signoff_date = Some(date);
            }
            ReviewRole::FwsReviewer => {
                self.fws_reviewer = user;
                self.fws_reviewer_signoff_date = Some(date);
            }
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.case_number())
    }
}

/// The three reviewing roles on a case, in workflow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRole {
    Analyst,
    QcReviewer,
    FwsReviewer,
}

impl ReviewRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analyst => "analyst",
            Self::QcReviewer => "qc_reviewer",
            Self::FwsReviewer => "fws_reviewer",
        }
    }
}

/// A determination request as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCase {
    /// Defaults to the creation date.
    pub request_date: Option<NaiveDate>,
    pub requester: Id,
    pub property: Id,
    pub cbrs_unit: Option<Id>,
    pub map_number: Option<Id>,
    pub cbrs_map_date: Option<NaiveDate>,
    pub determination: Option<Id>,
    pub prohibition_date: Option<NaiveDate>,
    pub distance: Option<f64>,
    pub fws_fo_received_date: Option<NaiveDate>,
    pub fws_hq_received_date: Option<NaiveDate>,
    pub final_letter_recipient: String,
    pub priority: bool,
}

/// Partial update of a case. An absent field is left unchanged; an explicit
/// `null` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CasePatch {
    pub request_date: Option<NaiveDate>,
    pub requester: Option<Id>,
    pub property: Option<Id>,
    #[serde(deserialize_with = "double_option")]
    pub cbrs_unit: Option<Option<Id>>,
    #[serde(deserialize_with = "double_option")]
    pub map_number: Option<Option<Id>>,
    #[serde(deserialize_with = "double_option")]
    pub cbrs_map_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub determination: Option<Option<Id>>,
    #[serde(deserialize_with = "double_option")]
    pub prohibition_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub distance: Option<Option<f64>>,
    #[serde(deserialize_with = "double_option")]
    pub fws_fo_received_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub fws_hq_received_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub final_letter_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub close_date: Option<Option<NaiveDate>>,
    pub final_letter_recipient: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub analyst: Option<Option<UserId>>,
    #[serde(deserialize_with = "double_option")]
    pub analyst_signoff_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub qc_reviewer: Option<Option<UserId>>,
    #[serde(deserialize_with = "double_option")]
    pub qc_reviewer_signoff_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "double_option")]
    pub fws_reviewer: Option<Option<UserId>>,
    #[serde(deserialize_with = "double_option")]
    pub fws_reviewer_signoff_date: Option<Option<NaiveDate>>,
    pub priority: Option<bool>,
}

macro_rules! patch_fields {
    ($patch:expr, $case:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field.clone() {
                $case.$field = value;
            }
        )+
    };
}

impl CasePatch {
    pub fn apply(&self, case: &mut Case) {
        patch_fields!(
            self,
            case,
            request_date,
            requester,
            property,
            cbrs_unit,
            map_number,
            cbrs_map_date,
            determination,
            prohibition_date,
            distance,
            fws_fo_received_date,
            fws_hq_received_date,
            final_letter_date,
            close_date,
            final_letter_recipient,
            analyst,
            analyst_signoff_date,
            qc_reviewer,
            qc_reviewer_signoff_date,
            fws_reviewer,
            fws_reviewer_signoff_date,
            priority,
        );
    }

    /// True when the patch touches any of the reviewer assignments.
    pub fn touches_reviewers(&self) -> bool {
        self.analyst.is_some() || self.qc_reviewer.is_some() || self.fws_reviewer.is_some()
    }
}

/// Storage-level case filter. Status is derived, so it is filtered in the
/// service layer rather than here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseQuery {
    pub priority: Option<bool>,
    pub requester: Option<Id>,
    pub property: Option<Id>,
    pub tag: Option<Id>,
}

/// Read model of a case: stored fields plus the derived accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseView {
    pub case_number: String,
    pub status: CaseStatus,
    #[serde(flatten)]
    pub case: Case,
    pub tags: Vec<Tag>,
}

impl CaseView {
    pub fn new(case: Case, tags: Vec<Tag>) -> Self {
        Self { case_number: case.case_number(), status: case.status(), case, tags }
    }
}

/// Association between a case and a tag. Unique per (case, tag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseTag {
    pub id: Id,
    pub case: Id,
    pub tag: Id,
    #[serde(flatten)]
    pub stamp: Stamp,
}

/// Staff comment about a case. Unique per (comment text, case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub comment: String,
    pub case: Id,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.comment)
    }
}

/// A file attached to a case, uploaded either by staff or by the requester
/// (no uploader). Unique per (file location, case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    pub id: Id,
    /// Storage location, e.g. `casefiles/12/requester/map.pdf`.
    pub file: String,
    pub case: Id,
    pub uploader: Option<UserId>,
    pub uploaded_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl CaseFile {
    /// File name without its storage directories.
    pub fn name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

impl fmt::Display for CaseFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 4, d).unwrap()
    }

    fn sample() -> Case {
        let new = NewCase { requester: 1, property: 2, ..Default::default() };
        let mut case = Case::from_new(new, "abc".into(), day(1), Stamp::default());
        case.id = 42;
        case
    }

    #[test]
    fn request_date_defaults_to_today() {
        assert_eq!(sample().request_date, day(1));
    }

    #[test]
    fn case_number_is_identity() {
        let case = sample();
        assert_eq!(case.case_number(), "42");
        assert_eq!(case.to_string(), "42");
    }

    #[test]
    fn sign_off_assigns_role_and_date() {
        let mut case = sample();
        case.sign_off(ReviewRole::QcReviewer, Some(7), day(3));
        assert_eq!(case.qc_reviewer, Some(7));
        assert_eq!(case.qc_reviewer_signoff_date, Some(day(3)));
        assert_eq!(case.status().label(), "Awaiting FWS Review");
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let mut case = sample();
        case.close_date = Some(day(9));
        case.priority = false;

        let patch: CasePatch =
            serde_json::from_str(r#"{"close_date": null, "priority": true}"#).unwrap();
        patch.apply(&mut case);
        assert_eq!(case.close_date, None);
        assert!(case.priority);
        assert_eq!(case.requester, 1);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        assert!(serde_json::from_str::<CasePatch>(r#"{"status": "Final"}"#).is_err());
    }

    #[test]
    fn case_file_name_is_last_segment() {
        let file = CaseFile {
            id: 1,
            file: "casefiles/42/requester/map.pdf".into(),
            case: 42,
            uploader: None,
            uploaded_date: None,
            stamp: Stamp::default(),
        };
        assert_eq!(file.name(), "map.pdf");
    }

    #[test]
    fn view_carries_derived_fields() {
        let mut case = sample();
        case.analyst_signoff_date = Some(day(1));
        let json = serde_json::to_value(CaseView::new(case, vec![])).unwrap();
        assert_eq!(json["case_number"], "42");
        assert_eq!(json["status"], "Awaiting QC");
        assert_eq!(json["requester"], 1);
    }
}
