//! # Case Status
//!
//! The workflow stage of a case is never stored. It is derived on every read
//! from five milestone dates, checked in a fixed precedence order; the first
//! match wins.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The milestone dates that drive status derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Milestones {
    pub close_date: Option<NaiveDate>,
    pub final_letter_date: Option<NaiveDate>,
    pub fws_reviewer_signoff_date: Option<NaiveDate>,
    pub qc_reviewer_signoff_date: Option<NaiveDate>,
    pub analyst_signoff_date: Option<NaiveDate>,
}

/// Furthest-progressed workflow stage of a case.
///
/// Serialises as its label. Deserialising goes through [`FromStr`], so labels
/// are matched case-insensitively wherever a status is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum CaseStatus {
    #[serde(rename = "Received")]
    Received,
    #[serde(rename = "Awaiting QC")]
    AwaitingQc,
    #[serde(rename = "Awaiting FWS Review")]
    AwaitingFwsReview,
    #[serde(rename = "Awaiting Final Letter")]
    AwaitingFinalLetter,
    #[serde(rename = "Final")]
    Final,
    #[serde(rename = "Closed with no Final Letter")]
    ClosedWithNoFinalLetter,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 6] = [
        CaseStatus::Received,
        CaseStatus::AwaitingQc,
        CaseStatus::AwaitingFwsReview,
        CaseStatus::AwaitingFinalLetter,
        CaseStatus::Final,
        CaseStatus::ClosedWithNoFinalLetter,
    ];

    /// Derives the status from milestone dates.
    ///
    /// Later milestones are not required to follow earlier ones: closing a case
    /// with no signoffs at all yields `Final` (or `ClosedWithNoFinalLetter`).
    pub fn derive(m: &Milestones) -> Self {
        match m {
            Milestones { close_date: Some(_), final_letter_date: None, .. } => Self::ClosedWithNoFinalLetter,
            Milestones { close_date: Some(_), .. } => Self::Final,
            Milestones { fws_reviewer_signoff_date: Some(_), .. } => Self::AwaitingFinalLetter,
            Milestones { qc_reviewer_signoff_date: Some(_), .. } => Self::AwaitingFwsReview,
            Milestones { analyst_signoff_date: Some(_), .. } => Self::AwaitingQc,
            _ => Self::Received,
        }
    }

    /// Human-readable label, as shown to staff and returned by the API.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "Received",
            Self::AwaitingQc => "Awaiting QC",
            Self::AwaitingFwsReview => "Awaiting FWS Review",
            Self::AwaitingFinalLetter => "Awaiting Final Letter",
            Self::Final => "Final",
            Self::ClosedWithNoFinalLetter => "Closed with no Final Letter",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::Validation(format!("unknown case status '{s}'")))
    }
}

impl TryFrom<String> for CaseStatus {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn no_milestones_is_received() {
        assert_eq!(CaseStatus::derive(&Milestones::default()), CaseStatus::Received);
    }

    #[test]
    fn analyst_signoff_awaits_qc() {
        let m = Milestones { analyst_signoff_date: date(2016, 4, 1), ..Default::default() };
        assert_eq!(CaseStatus::derive(&m).label(), "Awaiting QC");
    }

    #[test]
    fn qc_signoff_awaits_fws_review() {
        let m = Milestones { qc_reviewer_signoff_date: date(2016, 4, 2), ..Default::default() };
        assert_eq!(CaseStatus::derive(&m), CaseStatus::AwaitingFwsReview);
    }

    #[test]
    fn all_signoffs_await_final_letter() {
        let m = Milestones {
            analyst_signoff_date: date(2016, 4, 1),
            qc_reviewer_signoff_date: date(2016, 4, 2),
            fws_reviewer_signoff_date: date(2016, 4, 3),
            ..Default::default()
        };
        assert_eq!(CaseStatus::derive(&m), CaseStatus::AwaitingFinalLetter);
    }

    #[test]
    fn closing_without_letter_bypasses_final_letter_stage() {
        let m = Milestones {
            analyst_signoff_date: date(2016, 4, 1),
            qc_reviewer_signoff_date: date(2016, 4, 2),
            fws_reviewer_signoff_date: date(2016, 4, 3),
            close_date: date(2016, 5, 1),
            final_letter_date: None,
        };
        assert_eq!(CaseStatus::derive(&m).label(), "Closed with no Final Letter");
    }

    #[test]
    fn closing_with_letter_is_final() {
        let m = Milestones {
            close_date: date(2016, 5, 1),
            final_letter_date: date(2016, 4, 28),
            ..Default::default()
        };
        assert_eq!(CaseStatus::derive(&m), CaseStatus::Final);
    }

    #[test]
    fn final_letter_alone_does_not_change_stage() {
        let m = Milestones {
            qc_reviewer_signoff_date: date(2016, 4, 2),
            final_letter_date: date(2016, 4, 28),
            ..Default::default()
        };
        assert_eq!(CaseStatus::derive(&m), CaseStatus::AwaitingFwsReview);
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for status in CaseStatus::ALL {
            assert_eq!(status.label().parse::<CaseStatus>().unwrap(), status);
        }
        assert!("Pending".parse::<CaseStatus>().is_err());
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&CaseStatus::AwaitingFwsReview).unwrap();
        assert_eq!(json, "\"Awaiting FWS Review\"");
    }

    #[test]
    fn deserializes_labels_in_any_case() {
        let status: CaseStatus = serde_json::from_str("\"awaiting qc\"").unwrap();
        assert_eq!(status, CaseStatus::AwaitingQc);
        let status: CaseStatus = serde_json::from_str("\"CLOSED WITH NO FINAL LETTER\"").unwrap();
        assert_eq!(status, CaseStatus::ClosedWithNoFinalLetter);
        assert!(serde_json::from_str::<CaseStatus>("\"AwaitingQc\"").is_err());
    }
}
