// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::{Consultation, ConsultationId, StatusCounts, StatusFilter};

pub const PAGE_SIZE: usize = 10;
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    LoadingMore,
    Error,
}

/// One page read against the row store. `search` is passed raw; the
/// store trims it and skips the predicate when nothing remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    pub search: String,
    pub filter: StatusFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub rows: Vec<Consultation>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(ListPage),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    Mounted,
    SearchInput(String),
    DebounceElapsed(u64),
    FilterChanged(StatusFilter),
    LastRowVisible,
    Retry,
    PageResolved { generation: u64, outcome: FetchOutcome },
    CountsResolved(Option<StatusCounts>),
    SignedOut,
}

/// Work the host must perform on behalf of the state machine. The host
/// executes each effect and feeds the result back as a command; the
/// machine itself never touches the store or a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEffect {
    FetchPage { generation: u64, request: PageRequest },
    FetchCounts,
    ScheduleDebounce { token: u64, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub phase: ListPhase,
    pub rows: Vec<Consultation>,
    pub has_more: bool,
    pub search: String,
    pub filter: StatusFilter,
    pub counts: Option<StatusCounts>,
    page_size: usize,
    debounce: Duration,
    pending_search: Option<String>,
    debounce_token: u64,
    generation: u64,
    fetch_in_flight: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl DashboardState {
    pub fn new(page_size: usize) -> Self {
        Self::with_debounce(page_size, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(page_size: usize, debounce: Duration) -> Self {
        Self {
            phase: ListPhase::Idle,
            rows: Vec::new(),
            has_more: false,
            search: String::new(),
            filter: StatusFilter::All,
            counts: None,
            page_size: page_size.max(1),
            debounce,
            pending_search: None,
            debounce_token: 0,
            generation: 0,
            fetch_in_flight: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEffect> {
        match command {
            ListCommand::Mounted => {
                vec![self.start_fresh_fetch(), ListEffect::FetchCounts]
            }
            ListCommand::SearchInput(raw) => {
                // Every keystroke invalidates the previous token, so a
                // pending commit is cancelled and the timer restarts.
                self.pending_search = Some(raw);
                self.debounce_token += 1;
                vec![ListEffect::ScheduleDebounce {
                    token: self.debounce_token,
                    delay: self.debounce,
                }]
            }
            ListCommand::DebounceElapsed(token) => {
                if token != self.debounce_token {
                    return Vec::new();
                }
                let Some(search) = self.pending_search.take() else {
                    return Vec::new();
                };
                if search == self.search {
                    return Vec::new();
                }
                self.search = search;
                vec![self.start_fresh_fetch()]
            }
            ListCommand::FilterChanged(filter) => {
                if filter == self.filter {
                    return Vec::new();
                }
                self.filter = filter;
                vec![self.start_fresh_fetch()]
            }
            ListCommand::LastRowVisible => {
                // Checked-and-set before the fetch begins: rapid
                // re-visibility while a page is in flight is a no-op,
                // and the next fetch sees the appended offset.
                if self.phase != ListPhase::Idle || !self.has_more || self.fetch_in_flight {
                    return Vec::new();
                }
                self.phase = ListPhase::LoadingMore;
                self.fetch_in_flight = true;
                vec![ListEffect::FetchPage {
                    generation: self.generation,
                    request: self.request_at(self.rows.len()),
                }]
            }
            ListCommand::Retry => {
                if self.phase != ListPhase::Error {
                    return Vec::new();
                }
                vec![self.start_fresh_fetch()]
            }
            ListCommand::PageResolved {
                generation,
                outcome,
            } => {
                self.resolve_page(generation, outcome);
                Vec::new()
            }
            ListCommand::CountsResolved(counts) => {
                // A failed counts fetch keeps the previous aggregate.
                if let Some(counts) = counts {
                    self.counts = Some(counts);
                }
                Vec::new()
            }
            ListCommand::SignedOut => {
                let generation = self.generation + 1;
                *self = Self::with_debounce(self.page_size, self.debounce);
                self.generation = generation;
                Vec::new()
            }
        }
    }

    /// A fresh query always restarts from offset 0 and replaces the
    /// list wholesale on success. Bumping the generation invalidates
    /// any response still in flight for the previous parameters.
    fn start_fresh_fetch(&mut self) -> ListEffect {
        self.generation += 1;
        self.phase = ListPhase::Loading;
        self.fetch_in_flight = true;
        ListEffect::FetchPage {
            generation: self.generation,
            request: self.request_at(0),
        }
    }

    fn request_at(&self, offset: usize) -> PageRequest {
        PageRequest {
            offset,
            limit: self.page_size,
            search: self.search.clone(),
            filter: self.filter,
        }
    }

    fn resolve_page(&mut self, generation: u64, outcome: FetchOutcome) {
        if generation != self.generation {
            // Stale response for parameters no longer current; the
            // in-flight flag belongs to the newer fetch.
            return;
        }
        self.fetch_in_flight = false;
        match (self.phase, outcome) {
            (ListPhase::Loading, FetchOutcome::Fetched(page)) => {
                self.rows = page.rows;
                self.has_more = page.has_more;
                self.phase = ListPhase::Idle;
            }
            (ListPhase::Loading, FetchOutcome::Failed) => {
                self.rows.clear();
                self.has_more = false;
                self.phase = ListPhase::Error;
            }
            (ListPhase::LoadingMore, FetchOutcome::Fetched(page)) => {
                self.rows.extend(page.rows);
                self.has_more = page.has_more;
                self.phase = ListPhase::Idle;
            }
            (ListPhase::LoadingMore, FetchOutcome::Failed) => {
                // Already-loaded rows survive a load-more failure.
                self.phase = ListPhase::Error;
            }
            _ => {}
        }
    }

    pub(crate) fn row_mut(&mut self, id: &ConsultationId) -> Option<&mut Consultation> {
        self.rows.iter_mut().find(|row| row.id == *id)
    }
}
