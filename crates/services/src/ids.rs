use chrono::{Local, NaiveDate};
use domains::{CaseHasher, Clock};
use uuid::Uuid;

/// Random public case reference: 32 lowercase hex characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidCaseHasher;

impl CaseHasher for UuidCaseHasher {
    fn case_hash(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Server-local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
