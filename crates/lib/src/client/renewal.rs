//! Coalesced credential renewal.
//!
//! When many requests discover an expired access credential at once, only
//! one of them (the leader) calls the refresh endpoint. Every other caller
//! awaits the leader's outcome through a shared single-slot marker.
//!
//! The slot is cleared before the outcome is broadcast, whatever the
//! outcome, so a later renewal can always start.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;

/// Why a renewal did not produce a new access credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenewalError {
    /// The refresh endpoint answered with a non-success status.
    #[error("Renewal rejected with status {status}")]
    Rejected { status: u16 },

    /// The refresh call never got an answer.
    #[error("Renewal transport failure: {reason}")]
    Transport { reason: String },

    /// The leading caller was cancelled before the renewal settled.
    #[error("Renewal abandoned before completion")]
    Abandoned,
}

pub type RenewalOutcome = Result<(), RenewalError>;

type OutcomeRx = watch::Receiver<Option<RenewalOutcome>>;
type OutcomeTx = watch::Sender<Option<RenewalOutcome>>;

#[derive(Debug, Default)]
struct Slot {
    in_flight: Option<OutcomeRx>,
    /// Number of renewals that have settled.
    epoch: u64,
    last: Option<RenewalOutcome>,
}

enum Begin {
    Leader(OutcomeTx),
    Follower(OutcomeRx),
    Settled(RenewalOutcome),
}

/// Serializes renewals for one client.
#[derive(Debug, Default)]
pub struct RenewalCoordinator {
    slot: Mutex<Slot>,
    refresh_calls: AtomicU64,
    teardowns: AtomicU64,
}

impl RenewalCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count of settled renewals.
    ///
    /// Callers read this before sending a request and pass it to
    /// [`renew`](Self::renew) if the request is rejected. A renewal that
    /// settled while the request was in flight is then reused instead of
    /// starting another.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Whether a renewal is currently outstanding.
    pub fn is_renewing(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// How many times the refresh call has been made.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// How many times teardown has run.
    pub fn teardown_count(&self) -> u64 {
        self.teardowns.load(Ordering::SeqCst)
    }

    fn begin(&self, observed_epoch: u64) -> Begin {
        let mut slot = self.lock();
        if let Some(rx) = &slot.in_flight {
            return Begin::Follower(rx.clone());
        }
        if slot.epoch != observed_epoch
            && let Some(last) = &slot.last
        {
            return Begin::Settled(last.clone());
        }
        let (tx, rx) = watch::channel(None);
        slot.in_flight = Some(rx);
        Begin::Leader(tx)
    }

    /// Renew the session, or join the renewal already in progress.
    ///
    /// The leader runs `refresh`; if it fails, the leader runs `teardown`
    /// exactly once before any follower learns the outcome. Followers never
    /// run either closure.
    pub async fn renew<R, RF, T, TF>(
        &self,
        observed_epoch: u64,
        refresh: R,
        teardown: T,
    ) -> RenewalOutcome
    where
        R: FnOnce() -> RF,
        RF: Future<Output = RenewalOutcome>,
        T: FnOnce() -> TF,
        TF: Future<Output = ()>,
    {
        match self.begin(observed_epoch) {
            Begin::Settled(outcome) => {
                tracing::debug!("Reusing renewal that settled while request was in flight");
                outcome
            }
            Begin::Follower(mut rx) => match rx.wait_for(Option::is_some).await {
                Ok(outcome) => outcome.clone().unwrap_or(Err(RenewalError::Abandoned)),
                Err(_) => Err(RenewalError::Abandoned),
            },
            Begin::Leader(tx) => {
                let mut guard = InFlight {
                    coordinator: self,
                    tx: Some(tx),
                };

                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                let outcome = refresh().await;

                if let Err(e) = &outcome {
                    tracing::info!("Session renewal failed, tearing down: {e}");
                    self.teardowns.fetch_add(1, Ordering::SeqCst);
                    teardown().await;
                }

                guard.settle(outcome.clone());
                outcome
            }
        }
    }
}

/// Owned by the leader. Clears the slot on settle or on drop.
struct InFlight<'a> {
    coordinator: &'a RenewalCoordinator,
    tx: Option<OutcomeTx>,
}

impl InFlight<'_> {
    fn settle(&mut self, outcome: RenewalOutcome) {
        let Some(tx) = self.tx.take() else { return };
        {
            let mut slot = self.coordinator.lock();
            slot.in_flight = None;
            slot.epoch += 1;
            slot.last = Some(outcome.clone());
        }
        tx.send_replace(Some(outcome));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            // Leader cancelled; dropping the sender wakes followers with Abandoned
            self.coordinator.lock().in_flight = None;
            drop(tx);
        }
    }
}
