//! Refresh controller state machine.
//!
//! `Idle → Loading → {Success, Failed}`, re-entering `Loading` on every
//! trigger. Each fetch is issued a [`RequestTicket`]; a completion is applied
//! only when it belongs to the current parameter generation and is newer than
//! anything applied so far, so overlapping fetches can resolve in any order
//! without older data overwriting newer data.
//!
//! The state machine is synchronous. The timer and the spawned fetch tasks
//! live in `adapters::refresh_service`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::candle::Candle;
use crate::domain::error::{AlphaChartError, ErrorClass};
use crate::domain::query::{PublicParams, QueryParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// Older than already-applied data, or issued for superseded parameters.
    Stale,
}

#[derive(Debug)]
pub struct RefreshController {
    params: QueryParams,
    generation: u64,
    next_seq: u64,
    latest_issued: Option<u64>,
    last_applied: Option<u64>,
    phase: RefreshPhase,
    candles: Arc<Vec<Candle>>,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl RefreshController {
    pub fn new(params: QueryParams) -> Self {
        Self {
            params,
            generation: 0,
            next_seq: 0,
            latest_issued: None,
            last_applied: None,
            phase: RefreshPhase::Idle,
            candles: Arc::new(Vec::new()),
            error: None,
            last_updated: None,
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    /// Replaces the query parameters. Returns `false` if nothing changed.
    ///
    /// A change discards the current candles and error and starts a new
    /// generation; in-flight fetches for the old parameters become stale.
    pub fn set_params(&mut self, params: QueryParams) -> bool {
        if params == self.params {
            return false;
        }
        self.params = params;
        self.generation += 1;
        self.latest_issued = None;
        self.last_applied = None;
        self.phase = RefreshPhase::Idle;
        self.candles = Arc::new(Vec::new());
        self.error = None;
        self.last_updated = None;
        true
    }

    /// Starts a fetch. `None` (and no state change) when symbol or key is empty.
    pub fn begin(&mut self) -> Option<(RequestTicket, QueryParams)> {
        if !self.params.is_ready() {
            return None;
        }
        self.next_seq += 1;
        let ticket = RequestTicket {
            seq: self.next_seq,
            generation: self.generation,
        };
        self.latest_issued = Some(ticket.seq);
        self.phase = RefreshPhase::Loading;
        self.error = None;
        Some((ticket, self.params.clone()))
    }

    /// Records the outcome of a fetch started by [`begin`](Self::begin).
    ///
    /// A failure keeps the last good candles; only a parameter change clears
    /// them. The phase leaves `Loading` only once the most recently issued
    /// fetch has resolved.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Candle>, AlphaChartError>,
        now: DateTime<Utc>,
    ) -> Completion {
        if ticket.generation != self.generation {
            return Completion::Stale;
        }
        if self.last_applied.is_some_and(|applied| ticket.seq <= applied) {
            return Completion::Stale;
        }
        self.last_applied = Some(ticket.seq);
        let settled = self.latest_issued == Some(ticket.seq);

        match result {
            Ok(candles) => {
                self.candles = Arc::new(candles);
                self.error = None;
                self.last_updated = Some(now);
                if settled {
                    self.phase = RefreshPhase::Success;
                }
            }
            Err(err) => {
                self.error = Some(err.to_string());
                if settled {
                    self.phase = RefreshPhase::Failed;
                }
            }
        }
        Completion::Applied
    }

    pub fn is_loading(&self) -> bool {
        self.phase == RefreshPhase::Loading
    }

    pub fn snapshot(&self) -> RefreshSnapshot {
        RefreshSnapshot {
            params: self.params.public_view(),
            phase: self.phase,
            loading: self.is_loading(),
            candles: Arc::clone(&self.candles),
            error: self.error.clone(),
            error_class: self.error.as_deref().map(ErrorClass::of_message),
            last_updated: self.last_updated,
        }
    }
}

/// Display state handed to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSnapshot {
    pub params: PublicParams,
    pub phase: RefreshPhase,
    pub loading: bool,
    pub candles: Arc<Vec<Candle>>,
    pub error: Option<String>,
    pub error_class: Option<ErrorClass>,
    pub last_updated: Option<DateTime<Utc>>,
}
