//! Outbound message batching.

use crate::{
    ContractError, ContractHandle, Metrics,
    ledger::{LedgerClient, LedgerError},
};
use alloy_dyn_abi::DynSolValue;
use derive_more::{Constructor, From};
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// The token-logic operation every outbound message is submitted through.
pub const TRANSFER_FUNCTION: &str = "omniverseTransfer";

/// An already-shaped protocol message awaiting submission.
#[derive(Debug, Clone, PartialEq, Constructor, From)]
pub struct PendingMessage(DynSolValue);

impl PendingMessage {
    /// The ABI value passed to [`TRANSFER_FUNCTION`].
    pub const fn value(&self) -> &DynSolValue {
        &self.0
    }

    /// Consumes the message, returning the ABI value.
    pub fn into_inner(self) -> DynSolValue {
        self.0
    }
}

/// Errors raised while draining an [`OutboundBatch`].
#[derive(Debug, Error)]
pub enum DrainError {
    /// A submission failed; the drain stopped and the message is handed back.
    #[error("failed to submit message after {submitted} successful submissions: {source}")]
    Submission {
        /// Messages submitted by this drain before the failure.
        submitted: usize,
        /// The message whose submission failed. It is no longer queued.
        message: PendingMessage,
        /// The underlying failure.
        #[source]
        source: ContractError,
    },
}

impl DrainError {
    /// Returns `true` if the failed message never reached the node.
    ///
    /// Only transport failures raised before the broadcast qualify. A message whose transaction
    /// was broadcast, reverted or could not be encoded must not be submitted again.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Submission { source, .. } => {
                matches!(source, ContractError::Ledger(LedgerError::Transport(_)))
            }
        }
    }
}

/// Ordered list of pending protocol messages for one chain.
///
/// Messages are submitted one transaction at a time, in enqueue order. Only one drain runs at a
/// time; messages enqueued while a drain is running wait for the next drain.
#[derive(Debug, Default)]
pub struct OutboundBatch {
    pending: Mutex<VecDeque<PendingMessage>>,
    draining: tokio::sync::Mutex<()>,
}

impl OutboundBatch {
    /// Creates an empty [`OutboundBatch`].
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<PendingMessage>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message to the end of the batch.
    pub fn enqueue(&self, message: PendingMessage) {
        self.queue().push_back(message);
    }

    /// Puts a message back at the head of the batch, ahead of everything still queued.
    pub fn requeue_front(&self, message: PendingMessage) {
        self.queue().push_front(message);
    }

    /// Number of messages waiting for submission.
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    /// Returns `true` if nothing is waiting for submission.
    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// Returns a copy of the pending messages in submission order.
    pub fn snapshot(&self) -> Vec<PendingMessage> {
        self.queue().iter().cloned().collect()
    }

    /// Submits every message pending when the drain starts, returning how many were submitted.
    ///
    /// Each message leaves the batch as it is taken for submission. On failure the drain stops:
    /// earlier messages are not resubmitted, the failed message is returned in the error, and
    /// later messages stay queued.
    pub async fn drain<L>(
        &self,
        chain: &str,
        ledger: &L,
        contract: &ContractHandle,
    ) -> Result<usize, DrainError>
    where
        L: LedgerClient + ?Sized,
    {
        let _draining = self.draining.lock().await;

        let budget = self.len();
        let mut submitted = 0;
        while submitted < budget {
            let Some(message) = self.queue().pop_front() else { break };

            match contract
                .transact(ledger, TRANSFER_FUNCTION, std::slice::from_ref(message.value()))
                .await
            {
                Ok(receipt) => {
                    submitted += 1;
                    debug!(
                        target: "relay::batch",
                        chain,
                        tx_hash = %receipt.transaction_hash,
                        "Submitted outbound message"
                    );
                    metrics::counter!(Metrics::MESSAGES_SUBMITTED_TOTAL, "chain" => chain.to_string())
                        .increment(1);
                }
                Err(source) => {
                    warn!(
                        target: "relay::batch",
                        chain,
                        submitted,
                        remaining = self.len(),
                        err = %source,
                        "Outbound submission failed, stopping drain"
                    );
                    metrics::counter!(Metrics::SUBMISSION_ERRORS_TOTAL, "chain" => chain.to_string())
                        .increment(1);
                    return Err(DrainError::Submission { submitted, message, source });
                }
            }
        }

        if submitted > 0 {
            info!(target: "relay::batch", chain, submitted, "Outbound batch drained");
        }
        Ok(submitted)
    }
}
