// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use lacita_app::{
    Consultation, ConsultationId, ConsultationStatus, OwnerId, PageRequest, StatusFilter,
    derive_status,
};
use lacita_db::{NewConsultation, Store, validate_db_path};
use lacita_testkit::{ConsultationFaker, SeedConsultation, reference_now, temp_db_path};
use time::{Date, Duration, Month, OffsetDateTime, Time};

fn now() -> OffsetDateTime {
    reference_now()
}

fn march(day: u8, hour: u8) -> OffsetDateTime {
    Date::from_calendar_date(2025, Month::March, day)
        .expect("valid calendar date")
        .with_time(Time::from_hms(hour, 0, 0).expect("valid time"))
        .assume_utc()
}

fn owner() -> OwnerId {
    OwnerId::new("student-a")
}

fn page(offset: usize, limit: usize, search: &str, filter: StatusFilter) -> PageRequest {
    PageRequest {
        offset,
        limit,
        search: search.to_owned(),
        filter,
    }
}

fn insert_seed(
    store: &Store,
    owner: &OwnerId,
    seed: &SeedConsultation,
) -> Result<ConsultationId> {
    let id = store.create_consultation(
        owner,
        &NewConsultation {
            first_name: seed.first_name.clone(),
            last_name: seed.last_name.clone(),
            reason: seed.reason.clone(),
            scheduled_at: seed.scheduled_at,
        },
        now(),
    )?;
    if let Some(done) = seed.is_completed {
        store.set_completion(owner, &id, done, now())?;
    }
    Ok(id)
}

fn insert_reason(
    store: &Store,
    owner: &OwnerId,
    reason: &str,
    scheduled_at: OffsetDateTime,
    is_completed: Option<bool>,
) -> Result<ConsultationId> {
    let id = store.create_consultation(
        owner,
        &NewConsultation {
            first_name: "Avery".to_owned(),
            last_name: "Walker".to_owned(),
            reason: reason.to_owned(),
            scheduled_at,
        },
        now(),
    )?;
    if let Some(done) = is_completed {
        store.set_completion(owner, &id, done, now())?;
    }
    Ok(id)
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("/tmp/lacita.db").is_ok());
}

#[test]
fn bootstrap_creates_schema_and_reopen_validates() -> Result<()> {
    let (_dir, db_path) = temp_db_path()?;

    {
        let store = Store::open(&db_path)?;
        store.bootstrap()?;
        insert_reason(&store, &owner(), "Career planning advice", march(10, 9), None)?;
    }

    let store = Store::open(&db_path)?;
    store.bootstrap()?;
    let listed = store.list_page(&owner(), &page(0, 10, "", StatusFilter::All), now())?;
    assert_eq!(listed.rows.len(), 1);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    store.raw_connection().execute_batch(
        "
            ALTER TABLE consultations RENAME TO consultations_old;
            CREATE TABLE consultations (
              id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              first_name TEXT NOT NULL,
              last_name TEXT NOT NULL,
              reason TEXT NOT NULL,
              is_completed INTEGER,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            DROP TABLE consultations_old;
            ",
    )?;

    let err = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = err.to_string();
    assert!(message.contains("table `consultations` is missing required columns"));
    assert!(message.contains("scheduled_at"));
    Ok(())
}

#[test]
fn list_page_windows_with_count_equals_limit_heuristic() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    for day in 1..=12_u8 {
        insert_reason(&store, &owner, "Course selection", march(day, 10), None)?;
    }

    let first = store.list_page(&owner, &page(0, 5, "", StatusFilter::All), now())?;
    assert_eq!(first.rows.len(), 5);
    assert!(first.has_more);

    let second = store.list_page(&owner, &page(5, 5, "", StatusFilter::All), now())?;
    assert_eq!(second.rows.len(), 5);
    assert!(second.has_more);

    let last = store.list_page(&owner, &page(10, 5, "", StatusFilter::All), now())?;
    assert_eq!(last.rows.len(), 2);
    assert!(!last.has_more);
    Ok(())
}

#[test]
fn list_page_reports_more_when_total_divides_evenly() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    for day in 1..=10_u8 {
        insert_reason(&store, &owner, "Thesis proposal review", march(day, 10), None)?;
    }

    // 10 rows in pages of 5: the second page fills exactly, so the
    // heuristic claims more and the follow-up page comes back empty.
    let second = store.list_page(&owner, &page(5, 5, "", StatusFilter::All), now())?;
    assert_eq!(second.rows.len(), 5);
    assert!(second.has_more);

    let trailing = store.list_page(&owner, &page(10, 5, "", StatusFilter::All), now())?;
    assert!(trailing.rows.is_empty());
    assert!(!trailing.has_more);
    Ok(())
}

#[test]
fn list_page_orders_by_schedule_then_id_descending() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    insert_reason(&store, &owner, "Oldest", march(1, 9), None)?;
    insert_reason(&store, &owner, "Newest", march(20, 9), None)?;
    let tied_a = insert_reason(&store, &owner, "Tied A", march(10, 9), None)?;
    let tied_b = insert_reason(&store, &owner, "Tied B", march(10, 9), None)?;

    let listed = store.list_page(&owner, &page(0, 10, "", StatusFilter::All), now())?;
    let reasons: Vec<&str> = listed.rows.iter().map(|row| row.reason.as_str()).collect();
    assert_eq!(reasons[0], "Newest");
    assert_eq!(reasons[3], "Oldest");

    let tied: Vec<&str> = listed.rows[1..3].iter().map(|row| row.id.as_str()).collect();
    let mut expected = [tied_a.as_str(), tied_b.as_str()];
    expected.sort();
    expected.reverse();
    assert_eq!(tied, expected);
    Ok(())
}

#[test]
fn list_page_is_scoped_to_the_owner() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    insert_reason(&store, &owner(), "Mine", march(5, 9), None)?;
    insert_reason(
        &store,
        &OwnerId::new("student-b"),
        "Someone else's",
        march(6, 9),
        None,
    )?;

    let listed = store.list_page(&owner(), &page(0, 10, "", StatusFilter::All), now())?;
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.rows[0].reason, "Mine");
    Ok(())
}

#[test]
fn search_matches_substring_case_insensitively() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    insert_reason(&store, &owner, "Career planning advice", march(3, 9), None)?;
    insert_reason(&store, &owner, "Course selection", march(4, 9), None)?;

    let listed = store.list_page(&owner, &page(0, 10, "CAREER", StatusFilter::All), now())?;
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.rows[0].reason, "Career planning advice");
    Ok(())
}

#[test]
fn whitespace_only_search_matches_everything() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    insert_reason(&store, &owner, "Career planning advice", march(3, 9), None)?;
    insert_reason(&store, &owner, "Course selection", march(4, 9), None)?;

    let blank = store.list_page(&owner, &page(0, 10, "   ", StatusFilter::All), now())?;
    let none = store.list_page(&owner, &page(0, 10, "", StatusFilter::All), now())?;
    assert_eq!(blank.rows, none.rows);
    assert_eq!(blank.rows.len(), 2);
    Ok(())
}

#[test]
fn search_treats_like_wildcards_literally() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    insert_reason(&store, &owner, "100% effort review", march(3, 9), None)?;
    insert_reason(&store, &owner, "1000 word essay", march(4, 9), None)?;

    let listed = store.list_page(&owner, &page(0, 10, "100%", StatusFilter::All), now())?;
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.rows[0].reason, "100% effort review");
    Ok(())
}

#[test]
fn status_filter_and_search_combine() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    let past = now() - Duration::days(7);
    let future = now() + Duration::days(7);
    insert_reason(&store, &owner, "Career planning advice", past, None)?;
    insert_reason(&store, &owner, "Career check-in", past, Some(true))?;
    insert_reason(&store, &owner, "Career kickoff", future, None)?;
    insert_reason(&store, &owner, "Course selection", past, None)?;

    let request = page(0, 10, "career", StatusFilter::Only(ConsultationStatus::Pending));
    let listed = store.list_page(&owner, &request, now())?;
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.rows[0].reason, "Career planning advice");
    assert_eq!(listed.rows[0].status, ConsultationStatus::Pending);
    Ok(())
}

#[test]
fn status_is_derived_relative_to_the_supplied_instant() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    let scheduled = now() + Duration::days(1);
    insert_reason(&store, &owner, "Study abroad options", scheduled, None)?;

    let before = store.list_page(&owner, &page(0, 10, "", StatusFilter::All), now())?;
    assert_eq!(before.rows[0].status, ConsultationStatus::Upcoming);

    let after = store.list_page(
        &owner,
        &page(0, 10, "", StatusFilter::All),
        scheduled + Duration::hours(1),
    )?;
    assert_eq!(after.rows[0].status, ConsultationStatus::Pending);
    Ok(())
}

#[test]
fn list_page_rejects_zero_limit() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;

    let err = store
        .list_page(&owner(), &page(0, 0, "", StatusFilter::All), now())
        .expect_err("zero limit should be rejected");
    assert!(err.to_string().contains("limit"));
    Ok(())
}

#[test]
fn set_completion_updates_row_and_timestamps() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    let id = insert_reason(&store, &owner, "Capstone project scoping", march(2, 9), None)?;
    let later = now() + Duration::minutes(5);
    assert!(store.set_completion(&owner, &id, true, later)?);

    let row = store
        .get_consultation(&owner, &id, later)?
        .expect("row should exist");
    assert_eq!(row.is_completed, Some(true));
    assert_eq!(row.status, ConsultationStatus::Complete);
    assert_eq!(row.updated_at, later);
    assert!(row.created_at < row.updated_at);
    Ok(())
}

#[test]
fn set_completion_ignores_other_owners_rows() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    let id = insert_reason(&store, &owner, "Credit transfer evaluation", march(2, 9), None)?;
    let stranger = OwnerId::new("student-b");
    assert!(!store.set_completion(&stranger, &id, true, now())?);

    let row = store
        .get_consultation(&owner, &id, now())?
        .expect("row should exist");
    assert_eq!(row.is_completed, None);
    Ok(())
}

#[test]
fn status_counts_bucket_by_derived_status() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    let past = now() - Duration::days(3);
    let future = now() + Duration::days(3);
    insert_reason(&store, &owner, "Upcoming one", future, None)?;
    insert_reason(&store, &owner, "Upcoming two", future + Duration::days(1), None)?;
    insert_reason(&store, &owner, "Pending one", past, None)?;
    insert_reason(&store, &owner, "Complete one", past, Some(true))?;
    insert_reason(&store, &owner, "Complete two", past, Some(true))?;
    insert_reason(&store, &owner, "Incomplete one", past, Some(false))?;
    insert_reason(&store, &OwnerId::new("student-b"), "Not mine", past, None)?;

    let counts = store.status_counts(&owner, now())?;
    assert_eq!(counts.total, 6);
    assert_eq!(counts.upcoming, 2);
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.complete, 2);
    assert_eq!(counts.incomplete, 1);
    assert!(counts.is_consistent());
    Ok(())
}

#[test]
fn counts_agree_with_listed_statuses_for_seeded_data() -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    let owner = owner();

    let mut faker = ConsultationFaker::new(7);
    for seed in faker.consultation_batch(30) {
        insert_seed(&store, &owner, &seed)?;
    }

    let mut rows: Vec<Consultation> = Vec::new();
    let mut offset = 0;
    loop {
        let listed = store.list_page(&owner, &page(offset, 10, "", StatusFilter::All), now())?;
        let fetched = listed.rows.len();
        rows.extend(listed.rows);
        if !listed.has_more || fetched == 0 {
            break;
        }
        offset += fetched;
    }
    assert_eq!(rows.len(), 30);

    let counts = store.status_counts(&owner, now())?;
    assert_eq!(counts.total, 30);
    for status in ConsultationStatus::ALL {
        let listed = rows.iter().filter(|row| row.status == status).count();
        assert_eq!(counts.bucket(status), listed, "status {}", status.as_str());
    }

    for row in &rows {
        assert_eq!(
            row.status,
            derive_status(row.is_completed, row.scheduled_at, now()),
            "stored status must match the derivation rule"
        );
    }
    Ok(())
}
