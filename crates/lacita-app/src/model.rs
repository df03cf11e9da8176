// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

/// Display classification of a consultation. Never stored; always
/// recomputed from `(is_completed, scheduled_at, now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConsultationStatus {
    Upcoming,
    Pending,
    Complete,
    Incomplete,
}

impl ConsultationStatus {
    pub const ALL: [Self; 4] = [
        Self::Upcoming,
        Self::Pending,
        Self::Complete,
        Self::Incomplete,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(Self::Upcoming),
            "pending" => Some(Self::Pending),
            "complete" => Some(Self::Complete),
            "incomplete" => Some(Self::Incomplete),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Pending => "Pending",
            Self::Complete => "Complete",
            Self::Incomplete => "Incomplete",
        }
    }
}

/// A fixed completion decision wins over the schedule; an undecided
/// consultation is upcoming until its slot passes, then pending until
/// someone decides. The caller supplies `now` so the result is
/// deterministic.
pub fn derive_status(
    is_completed: Option<bool>,
    scheduled_at: OffsetDateTime,
    now: OffsetDateTime,
) -> ConsultationStatus {
    match is_completed {
        Some(true) => ConsultationStatus::Complete,
        Some(false) => ConsultationStatus::Incomplete,
        None if scheduled_at > now => ConsultationStatus::Upcoming,
        None => ConsultationStatus::Pending,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    All,
    Only(ConsultationStatus),
}

impl StatusFilter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            other => ConsultationStatus::parse(other).map(Self::Only),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: ConsultationId,
    pub owner_id: OwnerId,
    pub first_name: String,
    pub last_name: String,
    pub reason: String,
    pub scheduled_at: OffsetDateTime,
    pub is_completed: Option<bool>,
    pub status: ConsultationStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Per-status counters held alongside the list. Kept approximately in
/// sync via local deltas between full refetches; the store is the
/// source of truth on the next full fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusCounts {
    pub total: usize,
    pub upcoming: usize,
    pub pending: usize,
    pub complete: usize,
    pub incomplete: usize,
}

impl StatusCounts {
    pub const fn bucket(&self, status: ConsultationStatus) -> usize {
        match status {
            ConsultationStatus::Upcoming => self.upcoming,
            ConsultationStatus::Pending => self.pending,
            ConsultationStatus::Complete => self.complete,
            ConsultationStatus::Incomplete => self.incomplete,
        }
    }

    fn bucket_mut(&mut self, status: ConsultationStatus) -> &mut usize {
        match status {
            ConsultationStatus::Upcoming => &mut self.upcoming,
            ConsultationStatus::Pending => &mut self.pending,
            ConsultationStatus::Complete => &mut self.complete,
            ConsultationStatus::Incomplete => &mut self.incomplete,
        }
    }

    /// Local delta for a confirmed status transition: one bucket down
    /// (floored at zero to absorb drift from stale snapshots), one
    /// bucket up, `total` untouched.
    pub fn apply_transition(&mut self, previous: ConsultationStatus, next: ConsultationStatus) {
        if previous == next {
            return;
        }
        let from = self.bucket_mut(previous);
        *from = from.saturating_sub(1);
        *self.bucket_mut(next) += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.upcoming + self.pending + self.complete + self.incomplete
    }
}
