//! Turns a [`LocationQuery`] into current conditions plus an optional next-day estimate.
//!
//! The authoritative lookup decides success or failure of the whole query; the
//! prediction lookup only ever adds data. Each `resolve` call is tagged with a
//! sequence number and may write to the shared [`Snapshot`] only while it is
//! still the most recent one.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::AcquisitionError,
    model::{CurrentConditions, LocationQuery, PredictedConditions},
    provider::{ConditionsProvider, PredictionProvider, Providers},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(AcquisitionError),
}

impl AcquisitionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AcquisitionState::Loading)
    }

    pub fn failure(&self) -> Option<AcquisitionError> {
        match self {
            AcquisitionState::Failed(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Everything the presentation layer may read about the latest query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub state: AcquisitionState,
    pub current: Option<CurrentConditions>,
    pub predicted: Option<PredictedConditions>,
    /// City name used for the prediction call; for coordinate queries, the name the provider returned.
    pub location_label: Option<String>,
}

#[derive(Debug)]
pub struct Orchestrator {
    conditions: Arc<dyn ConditionsProvider>,
    prediction: Arc<dyn PredictionProvider>,
    credential: Option<String>,
    latest: AtomicU64,
    snapshot: watch::Sender<Snapshot>,
}

impl Orchestrator {
    pub fn new(providers: Providers, credential: Option<String>) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            conditions: providers.conditions,
            prediction: providers.prediction,
            credential,
            latest: AtomicU64::new(0),
            snapshot,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> AcquisitionState {
        self.snapshot.borrow().state
    }

    /// Observe every state transition, e.g. to drive a loading indicator.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Run one query to completion and return the shared state afterwards.
    ///
    /// A query superseded by a newer `resolve` call stops issuing requests,
    /// drops its results and returns whatever state the newer query has produced.
    pub async fn resolve(&self, query: LocationQuery) -> AcquisitionState {
        if query.is_empty() {
            self.begin(AcquisitionState::Failed(AcquisitionError::EmptyQuery));
            return self.state();
        }

        let Some(api_key) = self.credential.as_deref().filter(|key| !key.trim().is_empty()) else {
            self.begin(AcquisitionState::Failed(AcquisitionError::MissingCredential));
            return self.state();
        };

        let seq = self.begin(AcquisitionState::Loading);

        let current = match self.conditions.current_conditions(&query, api_key).await {
            Ok(current) => current,
            Err(err) => {
                let outcome = AcquisitionError::from(&err);
                debug!(seq, error = %err, "current conditions lookup failed");
                if !self.apply(seq, |snap| snap.state = AcquisitionState::Failed(outcome)) {
                    debug!(seq, "discarding superseded failure");
                }
                return self.state();
            }
        };

        let label = match &query {
            LocationQuery::City(name) => name.clone(),
            LocationQuery::Coordinates(_) => current.city_name.clone(),
        };

        let applied = self.apply(seq, |snap| {
            snap.current = Some(current);
            snap.location_label = Some(label.clone());
        });
        if !applied {
            debug!(seq, "discarding superseded current conditions");
            return self.state();
        }

        let predicted = match self.prediction.predict_next_day(&label).await {
            Ok(predicted) => Some(predicted),
            Err(err) => {
                warn!(city = %label, error = %err, "next-day prediction unavailable");
                None
            }
        };

        let applied = self.apply(seq, |snap| {
            snap.predicted = predicted;
            snap.state = AcquisitionState::Ready;
        });
        if !applied {
            debug!(seq, "discarding superseded prediction");
        }

        self.state()
    }

    /// Start a new query: take the next sequence number and clear both result slots.
    fn begin(&self, state: AcquisitionState) -> u64 {
        let mut seq = 0;
        self.snapshot.send_modify(|snap| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *snap = Snapshot {
                state,
                ..Snapshot::default()
            };
        });
        seq
    }

    /// Apply `update` only if `seq` is still the newest query. The check runs under the watch lock.
    fn apply(&self, seq: u64, update: impl FnOnce(&mut Snapshot)) -> bool {
        self.snapshot.send_if_modified(|snap| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            update(snap);
            true
        })
    }
}
