//! Request lifecycle for one calculation, optionally paired with a
//! comparison calculation for a second municipality.
//!
//! State is published through a [`watch`] channel. Both results of a pair are
//! written in one update under the channel lock; subscribers never see a
//! half-applied pair.
//!
//! Overlapping invocations are ordered by a sequence number taken when the
//! invocation starts. A settlement is only written if its number is still the
//! latest one issued; [`TaxCalculation::reset`] also takes a number, which
//! turns any in-flight invocation stale.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::protocol::{TaxRequest, TaxResult};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{ApiClientError, TaxApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationPhase {
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationState {
    pub primary_result: Option<TaxResult>,
    pub compare_result: Option<TaxResult>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CalculationState {
    pub fn phase(&self) -> CalculationPhase {
        if self.loading {
            CalculationPhase::Loading
        } else if self.error.is_some() {
            CalculationPhase::Failed
        } else if self.primary_result.is_some() {
            CalculationPhase::Success
        } else {
            CalculationPhase::Idle
        }
    }
}

/// Whether an invocation's outcome reached the published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    /// A newer `calculate` or a `reset` was issued before this one settled.
    Stale,
}

type PairOutcome = Result<(TaxResult, Option<TaxResult>), ApiClientError>;

pub struct TaxCalculation {
    api: Arc<dyn TaxApi>,
    latest: AtomicU64,
    state: watch::Sender<CalculationState>,
}

impl TaxCalculation {
    pub fn new(api: Arc<dyn TaxApi>) -> Self {
        let (state, _) = watch::channel(CalculationState::default());
        Self {
            api,
            latest: AtomicU64::new(0),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CalculationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CalculationState {
        self.state.borrow().clone()
    }

    /// Runs the primary request and, if given, the comparison request
    /// concurrently and publishes both results together once both settle.
    ///
    /// Previous results stay visible while loading. Any failure clears both
    /// results and publishes a single normalized error message.
    pub async fn calculate(
        &self,
        request: TaxRequest,
        compare_request: Option<TaxRequest>,
    ) -> Settlement {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            sequence,
            municipality_id = %request.municipality_id,
            compare = compare_request.is_some(),
            "dispatching tax calculation"
        );

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let outcome: PairOutcome = match &compare_request {
            Some(compare_request) => {
                let (primary, compare) = futures::join!(
                    self.api.calculate(&request),
                    self.api.calculate(compare_request)
                );
                match (primary, compare) {
                    (Ok(primary), Ok(compare)) => Ok((primary, Some(compare))),
                    (Err(err), _) | (_, Err(err)) => Err(err),
                }
            }
            None => self
                .api
                .calculate(&request)
                .await
                .map(|primary| (primary, None)),
        };

        self.settle(sequence, outcome)
    }

    fn settle(&self, sequence: u64, outcome: PairOutcome) -> Settlement {
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != sequence {
                return false;
            }

            state.loading = false;
            match outcome {
                Ok((primary, compare)) => {
                    state.primary_result = Some(primary);
                    state.compare_result = compare;
                    state.error = None;
                }
                Err(err) => {
                    warn!(sequence, error = %err, "tax calculation failed");
                    state.primary_result = None;
                    state.compare_result = None;
                    state.error = Some(err.calculation_message());
                }
            }
            true
        });

        if applied {
            info!(sequence, "tax calculation settled");
            Settlement::Applied
        } else {
            debug!(sequence, "discarding stale tax calculation");
            Settlement::Stale
        }
    }

    /// Returns to idle without cancelling in-flight requests; their late
    /// settlements are discarded.
    pub fn reset(&self) {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(sequence, "resetting tax calculation");
        self.state
            .send_modify(|state| *state = CalculationState::default());
    }
}

#[cfg(test)]
#[path = "tests/calculation_tests.rs"]
mod tests;
