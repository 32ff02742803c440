//! Request lifecycle for one search view.
//!
//! A [`ForecastSession`] owns the only mutable [`SessionState`] of a view.
//! Presentation reads it through [`ForecastSession::state`] or a
//! [`watch`] subscription and drives it only through `submit`.
//!
//! Overlapping searches are resolved last-submitted-wins: every submission
//! gets an increasing id, and an outcome is applied only if its id is still
//! the latest when it arrives. Late results for superseded searches are
//! dropped.

use futures_util::{StreamExt, stream::FuturesUnordered};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::{
    ForecastError,
    aggregate::MAX_DAYS,
    forecast::{ForecastBundle, fetch_forecast},
    gateway::WeatherGateway,
    model::{CanonicalObservation, DailySummary, ForecastPoint},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// View model for one search view.
///
/// Data from the last successful search stays in place while a new search is
/// loading and underneath an error banner; it is only ever replaced by newer
/// data, never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: Phase,
    pub query: String,
    pub observation: Option<CanonicalObservation>,
    pub hourly: Vec<ForecastPoint>,
    pub daily: Vec<DailySummary>,
    pub error_message: Option<String>,
}

impl SessionState {
    pub fn has_data(&self) -> bool {
        self.observation.is_some()
    }
}

/// Ticket for one accepted search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    id: u64,
    query: String,
}

impl Submission {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug)]
pub struct ForecastSession {
    state: SessionState,
    latest: u64,
    day_count: usize,
    updates: watch::Sender<SessionState>,
}

impl Default for ForecastSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastSession {
    pub fn new() -> Self {
        Self::with_day_count(MAX_DAYS)
    }

    pub fn with_day_count(day_count: usize) -> Self {
        let (updates, _) = watch::channel(SessionState::default());
        Self {
            state: SessionState::default(),
            latest: 0,
            day_count: day_count.min(MAX_DAYS),
            updates,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn day_count(&self) -> usize {
        self.day_count
    }

    /// Receive a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    /// Start a search. Blank input is ignored and returns `None`.
    ///
    /// Moves to `Loading` and clears the error banner. Previous results stay
    /// visible until the new ones arrive.
    pub fn submit(&mut self, query: &str) -> Option<Submission> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!(error = %ForecastError::EmptyQuery, "search ignored");
            return None;
        }

        self.latest += 1;
        self.state.phase = Phase::Loading;
        self.state.query = query.to_string();
        self.state.error_message = None;
        self.publish();

        tracing::debug!(id = self.latest, query, "search submitted");
        Some(Submission {
            id: self.latest,
            query: query.to_string(),
        })
    }

    /// Whether `submission` is still the search the session is waiting on.
    pub fn is_current(&self, submission: &Submission) -> bool {
        submission.id == self.latest
    }

    /// Apply the outcome of `submission`. Returns `false` and leaves the state
    /// untouched if a newer search has been submitted since.
    pub fn resolve(
        &mut self,
        submission: &Submission,
        outcome: Result<ForecastBundle, ForecastError>,
    ) -> bool {
        if !self.is_current(submission) {
            tracing::debug!(
                id = submission.id,
                query = submission.query(),
                latest = self.latest,
                "discarding stale result"
            );
            return false;
        }

        match outcome {
            Ok(bundle) => {
                tracing::info!(
                    query = submission.query(),
                    city = %bundle.observation.city,
                    days = bundle.daily.len(),
                    "forecast loaded"
                );
                self.state.phase = Phase::Success;
                self.state.observation = Some(bundle.observation);
                self.state.hourly = bundle.hourly;
                self.state.daily = bundle.daily;
                self.state.error_message = None;
            }
            Err(err) => {
                if let ForecastError::MalformedRecord(detail) = &err {
                    tracing::warn!(query = submission.query(), detail = %detail, "malformed weather record");
                } else {
                    tracing::debug!(query = submission.query(), error = %err, "forecast failed");
                }
                self.state.phase = Phase::Error;
                self.state.error_message = Some(err.user_message().to_string());
            }
        }

        self.publish();
        true
    }

    /// Submit, fetch and resolve one search.
    ///
    /// Returns whether the outcome was applied; `false` for blank input.
    pub async fn search<G>(&mut self, gateway: &G, query: &str) -> bool
    where
        G: WeatherGateway + ?Sized,
    {
        let Some(submission) = self.submit(query) else {
            return false;
        };

        let outcome = fetch_forecast(gateway, submission.query(), self.day_count).await;
        self.resolve(&submission, outcome)
    }

    /// Serve searches from `queries` until the channel closes and every
    /// in-flight fetch has resolved.
    ///
    /// Runs on the caller's task. New queries are accepted while earlier
    /// fetches are still pending; their results are dropped as stale.
    pub async fn run<G>(&mut self, gateway: &G, mut queries: mpsc::Receiver<String>)
    where
        G: WeatherGateway + ?Sized,
    {
        let mut in_flight = FuturesUnordered::new();
        let mut accepting = true;

        loop {
            tokio::select! {
                query = queries.recv(), if accepting => match query {
                    Some(query) => {
                        if let Some(submission) = self.submit(&query) {
                            let day_count = self.day_count;
                            in_flight.push(async move {
                                let outcome =
                                    fetch_forecast(gateway, submission.query(), day_count).await;
                                (submission, outcome)
                            });
                        }
                    }
                    None => accepting = false,
                },
                Some((submission, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.resolve(&submission, outcome);
                }
                else => break,
            }
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }
}
