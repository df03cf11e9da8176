// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::{ConsultationId, ConsultationStatus, DashboardState};

/// The only two statuses a user decision can set. Maps onto the stored
/// tri-state flag; `upcoming`/`pending` are never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionTarget {
    Complete,
    Incomplete,
}

impl CompletionTarget {
    pub const fn as_bool(self) -> bool {
        matches!(self, Self::Complete)
    }

    pub const fn status(self) -> ConsultationStatus {
        match self {
            Self::Complete => ConsultationStatus::Complete,
            Self::Incomplete => ConsultationStatus::Incomplete,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "complete" => Some(Self::Complete),
            "incomplete" => Some(Self::Incomplete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub id: ConsultationId,
    pub target: CompletionTarget,
}

impl CompletionRequest {
    pub fn is_completed(&self) -> bool {
        self.target.as_bool()
    }
}

/// What the host observed at the store boundary. An update that matched
/// zero rows (ownership violation or vanished row) is reported as
/// `Failed`, indistinguishable from a transient store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    Applied {
        id: ConsultationId,
        status: ConsultationStatus,
    },
    Failed {
        id: ConsultationId,
    },
}

/// Confirm-then-write coordinator. Local list and aggregate state move
/// only after the store confirms the write; a failure leaves both
/// untouched and the same action can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationCoordinator {
    in_flight: Option<CompletionRequest>,
}

impl MutationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<&CompletionRequest> {
        self.in_flight.as_ref()
    }

    /// Checked-and-set before the asynchronous write begins: while one
    /// mutation is in flight, duplicate confirms coalesce to `None` and
    /// are never double-applied.
    pub fn begin(
        &mut self,
        id: ConsultationId,
        target: CompletionTarget,
    ) -> Option<CompletionRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        let request = CompletionRequest { id, target };
        self.in_flight = Some(request.clone());
        Some(request)
    }

    /// Folds the store's answer back into local state. On success the
    /// in-memory row is updated in place and the aggregate delta uses
    /// the row's status prior to this call; no re-fetch is required.
    pub fn resolve(
        &mut self,
        state: &mut DashboardState,
        outcome: MutationOutcome,
    ) -> Option<MutationEvent> {
        let request = self.in_flight.take()?;
        match outcome {
            MutationOutcome::Failed => Some(MutationEvent::Failed { id: request.id }),
            MutationOutcome::Applied => {
                let next = request.target.status();
                if let Some(row) = state.row_mut(&request.id) {
                    let previous = row.status;
                    row.is_completed = Some(request.target.as_bool());
                    row.status = next;
                    if let Some(counts) = state.counts.as_mut() {
                        counts.apply_transition(previous, next);
                    }
                }
                // A row that scrolled out of the loaded window still
                // succeeded remotely; the next full fetch will show it.
                Some(MutationEvent::Applied {
                    id: request.id,
                    status: next,
                })
            }
        }
    }
}
