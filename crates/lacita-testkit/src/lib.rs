// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const CONSULTATION_REASONS: [&str; 14] = [
    "Career planning advice",
    "Course selection for next term",
    "Thesis proposal review",
    "Internship application strategy",
    "Graduate school recommendations",
    "Study abroad options",
    "Academic probation follow-up",
    "Research assistant placement",
    "Scholarship essay feedback",
    "Changing major to computer science",
    "Credit transfer evaluation",
    "Capstone project scoping",
    "Time management coaching",
    "Exam accommodation paperwork",
];

const REFERENCE_YEAR: i32 = 2026;

/// Raw material for a consultation row. The faker never touches a
/// database; callers insert the output through whatever store they are
/// exercising and assign ownership themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConsultation {
    pub first_name: String,
    pub last_name: String,
    pub reason: String,
    pub scheduled_at: OffsetDateTime,
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct ConsultationFaker {
    rng: DeterministicRng,
}

impl ConsultationFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// A consultation scheduled within a year either side of the
    /// reference instant. Past consultations are usually marked one way
    /// or the other, future ones are left unmarked, so a seeded batch
    /// spreads across all four display statuses.
    pub fn consultation(&mut self) -> SeedConsultation {
        let scheduled_at = self.random_datetime_between(
            reference_now() - Duration::days(365),
            reference_now() + Duration::days(365),
        );

        let is_completed = if scheduled_at > reference_now() {
            None
        } else {
            match self.rng.int_n(4) {
                0 => None,
                1 => Some(false),
                _ => Some(true),
            }
        };

        SeedConsultation {
            first_name: self.pick(&FIRST_NAMES).to_owned(),
            last_name: self.pick(&LAST_NAMES).to_owned(),
            reason: self.pick(&CONSULTATION_REASONS).to_owned(),
            scheduled_at,
            is_completed,
        }
    }

    pub fn consultation_scheduled_at(&mut self, scheduled_at: OffsetDateTime) -> SeedConsultation {
        let mut seed = self.consultation();
        seed.scheduled_at = scheduled_at;
        seed
    }

    pub fn consultation_batch(&mut self, count: usize) -> Vec<SeedConsultation> {
        (0..count).map(|_| self.consultation()).collect()
    }

    pub fn date_in_year(&mut self, year: i32) -> OffsetDateTime {
        let start = midnight_utc(year, Month::January, 1);
        let end =
            midnight_utc(year, Month::December, 31) + Duration::days(1) - Duration::seconds(1);
        self.random_datetime_between(start, end)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn random_datetime_between(
        &mut self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> OffsetDateTime {
        let start_ts = start.unix_timestamp();
        let end_ts = end.unix_timestamp();
        if end_ts <= start_ts {
            return start;
        }
        let span = (end_ts - start_ts) as u64;
        let offset = self.rng.next_u64() % (span + 1);
        OffsetDateTime::from_unix_timestamp(start_ts + offset as i64).expect("valid unix timestamp")
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("lacita.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn consultation_reasons() -> &'static [&'static str] {
    &CONSULTATION_REASONS
}

pub fn reference_now() -> OffsetDateTime {
    midnight_utc(REFERENCE_YEAR, Month::January, 1)
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, day).expect("valid calendar date");
    let midnight = Time::from_hms(0, 0, 0).expect("valid midnight");
    date.with_time(midnight).assume_utc()
}
