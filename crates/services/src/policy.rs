//! Reviewer-assignment policy.
//!
//! The analyst, QC reviewer, and FWS reviewer of a case are meant to be
//! three different people. Historically nothing enforced that, so the
//! default mode only logs a warning; `Enforce` rejects the write.

use std::str::FromStr;

use domains::{Case, DomainError, Result, ReviewRole};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewerPolicyMode {
    #[default]
    Warn,
    Enforce,
}

impl FromStr for ReviewerPolicyMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "enforce" => Ok(Self::Enforce),
            other => Err(DomainError::Validation(format!("unknown reviewer policy mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewerPolicy {
    mode: ReviewerPolicyMode,
}

impl ReviewerPolicy {
    pub fn new(mode: ReviewerPolicyMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ReviewerPolicyMode {
        self.mode
    }

    /// First pair of roles assigned to the same user, if any.
    pub fn conflict(case: &Case) -> Option<(ReviewRole, ReviewRole)> {
        const PAIRS: [(ReviewRole, ReviewRole); 3] = [
            (ReviewRole::Analyst, ReviewRole::QcReviewer),
            (ReviewRole::Analyst, ReviewRole::FwsReviewer),
            (ReviewRole::QcReviewer, ReviewRole::FwsReviewer),
        ];
        PAIRS.into_iter().find(|&(a, b)| match (case.reviewer(a), case.reviewer(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        })
    }

    pub fn check(&self, case: &Case) -> Result<()> {
        let Some((a, b)) = Self::conflict(case) else {
            return Ok(());
        };
        match self.mode {
            ReviewerPolicyMode::Warn => {
                tracing::warn!(
                    case = case.id,
                    first = a.as_str(),
                    second = b.as_str(),
                    "same user holds two reviewing roles"
                );
                Ok(())
            }
            ReviewerPolicyMode::Enforce => Err(DomainError::Validation(format!(
                "{} and {} must be different people",
                a.as_str(),
                b.as_str()
            ))),
        }
    }
}
