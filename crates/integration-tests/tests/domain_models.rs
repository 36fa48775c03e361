mod common;

use common::{date, Fixture};
use domains::{
    CasePatch, CaseStatus, Determination, DomainError, Milestones, NewDetermination, NewFieldOffice,
    NewSystemMap, NewSystemUnit, NewTag,
};
use serde_json::json;

#[test]
fn close_date_outranks_every_signoff() {
    let m = Milestones {
        close_date: Some(date(2016, 6, 1)),
        final_letter_date: Some(date(2016, 5, 20)),
        fws_reviewer_signoff_date: Some(date(2016, 5, 10)),
        qc_reviewer_signoff_date: Some(date(2016, 5, 2)),
        analyst_signoff_date: Some(date(2016, 4, 28)),
    };
    assert_eq!(CaseStatus::derive(&m), CaseStatus::Final);
    assert_eq!(
        CaseStatus::derive(&Milestones { final_letter_date: None, ..m }),
        CaseStatus::ClosedWithNoFinalLetter
    );
}

#[test]
fn final_letter_alone_does_not_finish_a_case() {
    let m = Milestones { final_letter_date: Some(date(2016, 5, 20)), ..Default::default() };
    assert_eq!(CaseStatus::derive(&m), CaseStatus::Received);
}

#[test]
fn status_serializes_as_its_label() {
    assert_eq!(serde_json::to_value(CaseStatus::AwaitingFwsReview).unwrap(), json!("Awaiting FWS Review"));
    assert_eq!("awaiting qc".parse::<CaseStatus>().unwrap(), CaseStatus::AwaitingQc);
    assert!("Pending".parse::<CaseStatus>().is_err());
}

#[test]
fn patch_tells_absent_from_null() {
    let patch: CasePatch = serde_json::from_value(json!({ "close_date": null, "priority": true })).unwrap();
    assert_eq!(patch.close_date, Some(None));
    assert_eq!(patch.final_letter_date, None);
    assert_eq!(patch.priority, Some(true));
    assert!(!patch.touches_reviewers());

    assert!(serde_json::from_value::<CasePatch>(json!({ "case_hash": "x" })).is_err());
}

#[tokio::test]
async fn seeding_determinations_is_idempotent() {
    let fx = Fixture::new();
    let lookups = fx.lookups();
    let actor = fx.staff("admin").await;

    assert_eq!(lookups.seed_determinations(&actor).await.unwrap(), Determination::STANDARD.len());
    assert_eq!(lookups.seed_determinations(&actor).await.unwrap(), 0);

    let names: Vec<_> = lookups
        .list_determinations()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.to_string())
        .collect();
    assert_eq!(names, Determination::STANDARD);
}

#[tokio::test]
async fn system_units_carry_maps_and_prohibition_dates() {
    let fx = Fixture::new();
    let lookups = fx.lookups();
    let actor = fx.staff("admin").await;

    let office = lookups
        .create_field_office(
            &actor,
            NewFieldOffice {
                field_office_number: "41420".into(),
                field_office_name: "Panama City".into(),
                field_agent_name: "R. Gomez".into(),
                field_agent_email: "r_gomez@fws.gov".into(),
                city: "Panama City".into(),
                state: Some("FL".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(office.to_string(), "Panama City, FL");

    let unit = lookups
        .create_system_unit(
            &actor,
            NewSystemUnit {
                system_unit_number: "FL-95P".into(),
                system_unit_name: "St. George Island".into(),
                field_office: Some(office.id),
            },
        )
        .await
        .unwrap();
    let map = lookups
        .create_system_map(
            &actor,
            NewSystemMap { map_number: "12037C0482".into(), map_title: String::new(), map_date: date(2013, 2, 1) },
        )
        .await
        .unwrap();

    lookups.link_unit_map(&actor, unit.id, map.id).await.unwrap();
    let err = lookups.link_unit_map(&actor, unit.id, map.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert_eq!(lookups.unit_maps(unit.id).await.unwrap(), vec![map]);

    lookups.add_prohibition_date(&actor, unit.id, date(1982, 10, 18)).await.unwrap();
    lookups.add_prohibition_date(&actor, unit.id, date(1990, 11, 16)).await.unwrap();
    let dates = lookups.prohibition_dates(unit.id).await.unwrap();
    assert_eq!(
        dates.iter().map(|d| d.prohibition_date).collect::<Vec<_>>(),
        [date(1990, 11, 16), date(1982, 10, 18)]
    );
    assert_eq!(dates[1].to_string(), "1982-10-18");
}

#[tokio::test]
async fn long_descriptions_are_kept_whole() {
    let fx = Fixture::new();
    let actor = fx.staff("admin").await;
    let description = "Coastal barrier unit notes. ".repeat(40);

    let tag = fx
        .directory()
        .create_tag(&actor, NewTag { name: "otherwise protected".into(), description: description.clone() })
        .await
        .unwrap();
    assert_eq!(tag.description.len(), description.len());
    assert!(tag.description.len() > 1000);

    let determination = fx
        .lookups()
        .create_determination(&actor, NewDetermination { determination: "Partially In".into(), description })
        .await
        .unwrap();
    assert!(determination.description.len() > 1000);
}

#[tokio::test]
async fn system_unit_needs_an_existing_field_office() {
    let fx = Fixture::new();
    let actor = fx.staff("admin").await;
    let err = fx
        .lookups()
        .create_system_unit(
            &actor,
            NewSystemUnit { system_unit_number: "P05".into(), field_office: Some(3), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(..)));
}

#[tokio::test]
async fn duplicate_requester_is_a_conflict() {
    let fx = Fixture::new();
    let actor = fx.staff("admin").await;
    fx.new_case(&actor).await;

    let directory = fx.directory();
    let requester = directory.list_requesters().await.unwrap().remove(0);
    assert_eq!(requester.to_string(), "Dana Reyes");

    let again = domains::NewRequester {
        salutation: requester.salutation.clone(),
        first_name: requester.first_name.clone(),
        last_name: requester.last_name.clone(),
        organization: requester.organization.clone(),
        email: requester.email.clone(),
        address: requester.address.clone(),
    };
    assert!(matches!(directory.create_requester(&actor, again).await, Err(DomainError::Conflict(_))));
}
