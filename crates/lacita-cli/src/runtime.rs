// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use lacita_app::{
    AuthError, CompletionTarget, ConsultationId, DashboardState, FetchOutcome, IdentityProvider,
    ListCommand, ListEffect, MutationCoordinator, MutationEvent, MutationOutcome, OwnerId,
};
use lacita_db::{NewConsultation, Store};
use lacita_testkit::ConsultationFaker;
use time::OffsetDateTime;

/// Session identity resolved once at startup from config. Sign-out in
/// the headless host is a state-machine command, not a session change.
pub struct FixedIdentity {
    owner: OwnerId,
}

impl FixedIdentity {
    pub fn new(owner: OwnerId) -> Self {
        Self { owner }
    }
}

impl IdentityProvider for FixedIdentity {
    fn owner_id(&self) -> Result<OwnerId, AuthError> {
        Ok(self.owner.clone())
    }
}

/// Synchronous host for the dashboard state machine: executes each
/// emitted effect against the store and feeds the result straight back
/// as the follow-up command. Store errors fold into failed outcomes so
/// the machine can surface its error phase; an identity failure aborts
/// the whole run instead.
pub struct DbRuntime<'a, I> {
    store: &'a Store,
    identity: &'a I,
}

impl<'a, I: IdentityProvider> DbRuntime<'a, I> {
    pub fn new(store: &'a Store, identity: &'a I) -> Self {
        Self { store, identity }
    }

    pub fn drive(
        &self,
        state: &mut DashboardState,
        command: ListCommand,
        now: OffsetDateTime,
    ) -> Result<()> {
        let effects = state.dispatch(command);
        for effect in effects {
            let follow_up = match effect {
                ListEffect::FetchPage {
                    generation,
                    request,
                } => {
                    let owner = self.identity.owner_id()?;
                    let outcome = match self.store.list_page(&owner, &request, now) {
                        Ok(page) => FetchOutcome::Fetched(page),
                        Err(_) => FetchOutcome::Failed,
                    };
                    ListCommand::PageResolved {
                        generation,
                        outcome,
                    }
                }
                ListEffect::FetchCounts => {
                    let owner = self.identity.owner_id()?;
                    ListCommand::CountsResolved(self.store.status_counts(&owner, now).ok())
                }
                // No timer in the headless host; a scheduled debounce
                // commits immediately.
                ListEffect::ScheduleDebounce { token, .. } => ListCommand::DebounceElapsed(token),
            };
            self.drive(state, follow_up, now)?;
        }
        Ok(())
    }

    /// Confirm-then-write completion update. The coordinator's guard
    /// coalesces a duplicate confirm to `Ok(None)`; local state moves
    /// only when the store reports an affected row.
    pub fn set_completion(
        &self,
        coordinator: &mut MutationCoordinator,
        state: &mut DashboardState,
        id: ConsultationId,
        target: CompletionTarget,
        now: OffsetDateTime,
    ) -> Result<Option<MutationEvent>> {
        let Some(request) = coordinator.begin(id, target) else {
            return Ok(None);
        };
        let owner = self.identity.owner_id()?;
        let outcome = match self
            .store
            .set_completion(&owner, &request.id, request.is_completed(), now)
        {
            Ok(true) => MutationOutcome::Applied,
            Ok(false) | Err(_) => MutationOutcome::Failed,
        };
        Ok(coordinator.resolve(state, outcome))
    }
}

/// Seeds the store through its public API, the same path real writes
/// take. Past consultations carry a mix of tri-state flags so every
/// display status is represented.
pub fn seed_demo_data(
    store: &Store,
    owner: &OwnerId,
    count: usize,
    now: OffsetDateTime,
) -> Result<()> {
    let mut faker = ConsultationFaker::new(42);
    for seed in faker.consultation_batch(count) {
        let id = store.create_consultation(
            owner,
            &NewConsultation {
                first_name: seed.first_name,
                last_name: seed.last_name,
                reason: seed.reason,
                scheduled_at: seed.scheduled_at,
            },
            now,
        )?;
        if let Some(done) = seed.is_completed {
            store.set_completion(owner, &id, done, now)?;
        }
    }
    Ok(())
}
