//! Async driver for [`RefreshController`].
//!
//! Owns the polling timer and spawns one task per fetch. The controller sits
//! behind a `std::sync::Mutex` that is only taken for synchronous state
//! transitions, never across an `.await`.

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::query::QueryParams;
use crate::domain::refresh::{Completion, RefreshController, RefreshSnapshot};
use crate::ports::credential_port::CredentialStore;
use crate::ports::quote_port::QuotePort;

#[derive(Clone)]
pub struct RefreshService {
    inner: Arc<Inner>,
}

struct Inner {
    controller: Mutex<RefreshController>,
    quotes: Arc<dyn QuotePort>,
    credentials: Arc<dyn CredentialStore>,
    poll_interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    saved_key: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl RefreshService {
    /// `params.api_key` is treated as already persisted.
    pub fn new(
        quotes: Arc<dyn QuotePort>,
        credentials: Arc<dyn CredentialStore>,
        params: QueryParams,
        poll_interval: Duration,
    ) -> Self {
        let saved_key = Some(params.api_key.clone()).filter(|k| !k.is_empty());
        Self {
            inner: Arc::new(Inner {
                controller: Mutex::new(RefreshController::new(params)),
                quotes,
                credentials,
                poll_interval,
                timer: Mutex::new(None),
                saved_key: Mutex::new(saved_key),
            }),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Fetches once if the parameters are ready and starts the polling timer.
    pub fn mount(&self) -> Option<JoinHandle<()>> {
        let fetch = trigger(&self.inner, None);
        start_timer(&self.inner);
        fetch
    }

    /// Applies new query parameters.
    ///
    /// Unchanged parameters are ignored. Otherwise the stored candles are
    /// dropped, a fetch starts right away and the timer restarts from zero.
    pub fn update_params(&self, params: QueryParams) -> Option<JoinHandle<()>> {
        let key = params.api_key.clone();
        let changed = lock(&self.inner.controller).set_params(params);
        if !changed {
            return None;
        }
        let save = claim_key(&self.inner, &key).map(|key| spawn_save(&self.inner, key));
        let fetch = trigger(&self.inner, save);
        start_timer(&self.inner);
        fetch
    }

    /// Manual refresh. Leaves the timer alone.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        trigger(&self.inner, None)
    }

    pub fn params(&self) -> QueryParams {
        lock(&self.inner.controller).params().clone()
    }

    pub fn snapshot(&self) -> RefreshSnapshot {
        lock(&self.inner.controller).snapshot()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.inner.timer)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the polling timer. In-flight fetches still complete.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
            tracing::debug!("refresh timer stopped");
        }
    }
}

/// Marks a non-empty key that differs from the last saved one as saved.
fn claim_key(inner: &Inner, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    let mut saved = lock(&inner.saved_key);
    if saved.as_deref() == Some(key) {
        return None;
    }
    *saved = Some(key.to_string());
    Some(key.to_string())
}

/// Writes the key off the runtime threads. A failed write releases the claim
/// so the next change retries.
fn spawn_save(inner: &Arc<Inner>, key: String) -> JoinHandle<()> {
    let inner = Arc::clone(inner);
    tokio::task::spawn_blocking(move || {
        if let Err(err) = inner.credentials.save(&key) {
            tracing::warn!(error = %err, "could not persist API key");
            let mut saved = lock(&inner.saved_key);
            if saved.as_deref() == Some(key.as_str()) {
                *saved = None;
            }
        }
    })
}

/// Starts a fetch if the parameters are ready. A pending key save, when
/// given, is awaited after the fetch so the returned handle covers both.
fn trigger(inner: &Arc<Inner>, save: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
    let Some((ticket, params)) = lock(&inner.controller).begin() else {
        tracing::debug!("symbol or API key missing, skipping fetch");
        return None;
    };
    let inner = Arc::clone(inner);
    Some(tokio::spawn(async move {
        let result = inner
            .quotes
            .fetch_candles(&params.symbol, &params.api_key, params.interval)
            .await;
        let failed = result.is_err();
        let completion = lock(&inner.controller).complete(ticket, result, Utc::now());
        match completion {
            Completion::Applied if failed => {
                tracing::debug!(seq = ticket.seq, "fetch failed, keeping previous candles")
            }
            Completion::Applied => tracing::debug!(seq = ticket.seq, "fetch applied"),
            Completion::Stale => tracing::debug!(
                seq = ticket.seq,
                generation = ticket.generation,
                "discarding stale fetch result"
            ),
        }
        if let Some(save) = save {
            if let Err(err) = save.await {
                tracing::warn!(error = %err, "API key save task failed");
            }
        }
    }))
}

fn start_timer(inner: &Arc<Inner>) {
    let weak = Arc::downgrade(inner);
    let period = inner.poll_interval;
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            trigger(&inner, None);
        }
    });
    if let Some(previous) = lock(&inner.timer).replace(handle) {
        previous.abort();
    }
}
