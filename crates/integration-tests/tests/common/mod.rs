//! Shared fixtures: an in-memory store with a pinned clock, a staff user,
//! and the directory records every case needs.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use domains::{
    Actor, Address, MockCaseHasher, MockClock, NewCase, NewProperty, NewRequester, NewUser, User,
    UserRepository,
};
use services::{CaseService, DirectoryService, LookupService, Ports, ReviewerPolicy};
use storage_adapters::{InMemoryFileStorage, InMemoryStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The date every fixture clock reports.
pub fn today() -> NaiveDate {
    date(2016, 4, 1)
}

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub ports: Ports,
}

impl Fixture {
    pub fn new() -> Self {
        let store = InMemoryStore::shared();
        let mut ports = Ports::from_store(store.clone(), Arc::new(InMemoryFileStorage::default()));

        let mut clock = MockClock::new();
        clock.expect_today().return_const(today());
        ports.clock = Arc::new(clock);

        let mut hasher = MockCaseHasher::new();
        hasher.expect_case_hash().returning(|| "5f0c6e0e-hash".to_string());
        ports.hasher = Arc::new(hasher);

        Self { store, ports }
    }

    pub fn cases(&self, policy: ReviewerPolicy) -> CaseService {
        CaseService::new(self.ports.clone(), policy)
    }

    pub fn directory(&self) -> DirectoryService {
        DirectoryService::new(self.ports.directory.clone(), self.ports.clock.clone())
    }

    pub fn lookups(&self) -> LookupService {
        LookupService::new(self.ports.lookups.clone(), self.ports.clock.clone())
    }

    pub async fn staff(&self, username: &str) -> Actor {
        let user = self.user(username, true).await;
        Actor::user(&user)
    }

    pub async fn user(&self, username: &str, is_staff: bool) -> User {
        self.store
            .insert_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{username}@fws.gov"),
                is_staff,
                password_hash: "$argon2id$unused".to_string(),
            })
            .await
            .unwrap()
    }

    /// Creates a requester and a property and returns an intake request for them.
    pub async fn new_case(&self, actor: &Actor) -> NewCase {
        let directory = self.directory();
        let requester = directory
            .create_requester(
                actor,
                NewRequester {
                    salutation: "Ms.".into(),
                    first_name: "Dana".into(),
                    last_name: "Reyes".into(),
                    organization: "Gulf Title Co.".into(),
                    email: "dana@gulftitle.example".into(),
                    address: Address {
                        street: "12 Harbor Rd".into(),
                        city: "Apalachicola".into(),
                        state: Some("FL".into()),
                        zipcode: Some("32320".into()),
                        ..Default::default()
                    },
                },
            )
            .await
            .unwrap();
        let property = directory
            .create_property(
                actor,
                NewProperty {
                    address: Address {
                        street: "4 Dune Ln".into(),
                        city: "St. George Island".into(),
                        state: Some("FL".into()),
                        zipcode: Some("32328".into()),
                        ..Default::default()
                    },
                    subdivision: "Plantation".into(),
                    policy_number: "FL-0042".into(),
                },
            )
            .await
            .unwrap();

        NewCase {
            requester: requester.id,
            property: property.id,
            final_letter_recipient: "Dana Reyes".into(),
            ..Default::default()
        }
    }
}
