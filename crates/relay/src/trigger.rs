//! The delayed-execution trigger sweep.

use crate::{
    ContractError, ContractHandle, Metrics, OutcomeClassifier, TriggerOutcome,
    fields::{party_bytes, uint},
    ledger::LedgerClient,
};
use alloy_primitives::{Bytes, U256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Read-only operation returning the next executable delayed transaction.
pub const POLL_FUNCTION: &str = "getExecutableDelayedTx";

/// State-changing operation executing the next delayed transaction.
pub const TRIGGER_FUNCTION: &str = "triggerExecution";

/// The default upper bound of triggers performed by one sweep.
pub const DEFAULT_MAX_TRIGGERS_PER_SWEEP: usize = 64;

/// A delayed transaction reported as executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedTx {
    /// The originator of the delayed transaction.
    pub sender: Bytes,
    /// The originator's nonce, when the contract reports one.
    pub nonce: Option<U256>,
}

/// Errors that abort a sweep. Outcomes classified before the failure are preserved.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Polling for the next delayed transaction failed.
    #[error("failed to poll for delayed transactions: {source}")]
    Poll {
        /// Outcomes classified earlier in this sweep.
        outcomes: Vec<TriggerOutcome>,
        /// The underlying failure.
        #[source]
        source: ContractError,
    },
    /// Triggering execution failed.
    #[error("failed to trigger delayed execution: {source}")]
    Trigger {
        /// Outcomes classified earlier in this sweep.
        outcomes: Vec<TriggerOutcome>,
        /// The underlying failure.
        #[source]
        source: ContractError,
    },
}

impl SweepError {
    /// Outcomes classified before the sweep was aborted.
    pub fn outcomes(&self) -> &[TriggerOutcome] {
        match self {
            Self::Poll { outcomes, .. } | Self::Trigger { outcomes, .. } => outcomes,
        }
    }
}

/// Discovers, triggers and classifies delayed transactions on one chain.
#[derive(Debug)]
pub struct TriggerSweeper<L> {
    chain: String,
    ledger: Arc<L>,
    contract: ContractHandle,
    classifier: OutcomeClassifier,
    max_triggers: usize,
}

impl<L> TriggerSweeper<L>
where
    L: LedgerClient,
{
    /// Creates a new [`TriggerSweeper`] against the token-logic `contract`.
    pub fn new(
        chain: impl Into<String>,
        ledger: Arc<L>,
        contract: ContractHandle,
        classifier: OutcomeClassifier,
    ) -> Self {
        Self {
            chain: chain.into(),
            ledger,
            contract,
            classifier,
            max_triggers: DEFAULT_MAX_TRIGGERS_PER_SWEEP,
        }
    }

    /// Sets the upper bound of triggers performed by one sweep.
    pub const fn with_max_triggers(mut self, max_triggers: usize) -> Self {
        self.max_triggers = max_triggers;
        self
    }

    /// Asks the contract for the next executable delayed transaction.
    ///
    /// An empty or all-zero sender means nothing is executable.
    pub async fn poll(&self) -> Result<Option<DelayedTx>, ContractError> {
        let output = self.contract.call(self.ledger.as_ref(), POLL_FUNCTION, &[]).await?;

        let sender = output
            .field("sender")
            .and_then(party_bytes)
            .ok_or(ContractError::MissingOutput { function: POLL_FUNCTION.to_string(), field: "sender" })?;
        if sender.iter().all(|byte| *byte == 0) {
            return Ok(None);
        }

        let nonce = output.field("nonce").and_then(uint);
        Ok(Some(DelayedTx { sender, nonce }))
    }

    /// Triggers execution of the next delayed transaction and classifies the receipt.
    pub async fn trigger(&self) -> Result<Vec<TriggerOutcome>, ContractError> {
        let receipt = self.contract.transact(self.ledger.as_ref(), TRIGGER_FUNCTION, &[]).await?;
        debug!(
            target: "relay::trigger",
            chain = %self.chain,
            tx_hash = %receipt.transaction_hash,
            logs = receipt.logs.len(),
            "Delayed execution triggered"
        );
        metrics::counter!(Metrics::TRIGGERS_TOTAL, "chain" => self.chain.clone()).increment(1);

        Ok(self.classifier.classify_logs(&self.chain, &receipt.logs))
    }

    /// Triggers delayed transactions until none is executable or the sweep bound is reached.
    ///
    /// A failed poll or trigger aborts the sweep; the next scheduled sweep retries discovery.
    pub async fn run_sweep(&self) -> Result<Vec<TriggerOutcome>, SweepError> {
        let mut outcomes = Vec::new();
        let mut triggered = 0;

        loop {
            if triggered >= self.max_triggers {
                info!(
                    target: "relay::trigger",
                    chain = %self.chain,
                    triggered,
                    "Sweep bound reached, deferring remaining delayed transactions"
                );
                break;
            }

            let delayed = match self.poll().await {
                Ok(Some(delayed)) => delayed,
                Ok(None) => break,
                Err(source) => {
                    warn!(target: "relay::trigger", chain = %self.chain, err = %source, "Poll failed, aborting sweep");
                    metrics::counter!(Metrics::SWEEP_ERRORS_TOTAL, "chain" => self.chain.clone())
                        .increment(1);
                    return Err(SweepError::Poll { outcomes, source });
                }
            };
            debug!(target: "relay::trigger", chain = %self.chain, sender = %delayed.sender, "Delayed transaction executable");

            match self.trigger().await {
                Ok(classified) => outcomes.extend(classified),
                Err(source) => {
                    warn!(target: "relay::trigger", chain = %self.chain, err = %source, "Trigger failed, aborting sweep");
                    metrics::counter!(Metrics::SWEEP_ERRORS_TOTAL, "chain" => self.chain.clone())
                        .increment(1);
                    return Err(SweepError::Trigger { outcomes, source });
                }
            }
            triggered += 1;
        }

        Ok(outcomes)
    }
}
