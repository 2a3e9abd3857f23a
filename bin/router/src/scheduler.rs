//! Periodic submission of outbound batches and delayed-execution sweeps.

use omni_relay::{ChainRelay, DrainError, ledger::LedgerClient};
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives every chain's outbound batch and trigger sweep on a fixed interval.
///
/// Chains are serviced one after another; a tick never overlaps the previous one.
#[derive(Debug)]
pub(crate) struct Scheduler<L> {
    relays: Vec<Arc<ChainRelay<L>>>,
    interval: Duration,
}

impl<L> Scheduler<L>
where
    L: LedgerClient + 'static,
{
    pub(crate) const fn new(relays: Vec<Arc<ChainRelay<L>>>, interval: Duration) -> Self {
        Self { relays, interval }
    }

    /// Ticks until `cancel` fires.
    pub(crate) async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(target: "router", "Scheduler cancelled");
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// Drains and sweeps every chain once.
    pub(crate) async fn tick(&self) {
        for relay in &self.relays {
            drain(relay).await;
            sweep(relay).await;
        }
    }
}

/// Submits the chain's outbound batch.
///
/// A message that failed before reaching the node goes back to the head of the batch, so the next
/// tick resubmits it ahead of later messages. Any other failed message may already be on chain and
/// is dropped.
async fn drain<L: LedgerClient + 'static>(relay: &ChainRelay<L>) {
    let Err(err) = relay.drain().await else {
        return;
    };
    let retryable = err.is_retryable();
    let DrainError::Submission { submitted, message, source } = err;

    if !retryable {
        error!(
            target: "router",
            chain = %relay.name(),
            submitted,
            err = %source,
            "Outbound message failed after broadcast or cannot be encoded, dropping it"
        );
        return;
    }

    warn!(
        target: "router",
        chain = %relay.name(),
        submitted,
        err = %source,
        "Outbound submission failed, requeueing message"
    );
    relay.requeue_front(message);
}

/// Runs one trigger sweep on the chain.
async fn sweep<L: LedgerClient + 'static>(relay: &ChainRelay<L>) {
    match relay.run_trigger_sweep().await {
        Ok(outcomes) if outcomes.is_empty() => {}
        Ok(outcomes) => {
            info!(target: "router", chain = %relay.name(), outcomes = outcomes.len(), "Delayed transactions executed");
        }
        Err(err) => {
            warn!(
                target: "router",
                chain = %relay.name(),
                outcomes = err.outcomes().len(),
                %err,
                "Trigger sweep aborted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StubLedger, payload, stub_relay};
    use alloy_primitives::B256;
    use alloy_provider::PendingTransactionError;
    use alloy_transport::TransportErrorKind;
    use omni_relay::{
        PendingMessage,
        ledger::{ExecutionReceipt, LedgerError},
    };

    fn scripted(script: Vec<Result<ExecutionReceipt, LedgerError>>) -> StubLedger {
        StubLedger { script: std::sync::Mutex::new(script.into()), ..Default::default() }
    }

    fn submitted(relay: &ChainRelay<StubLedger>) -> usize {
        relay.binding().ledger().inner().submitted.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_tick_drains_every_chain() {
        let alpha = stub_relay("alpha", StubLedger::default());
        let beta = stub_relay("beta", StubLedger::default());
        alpha.enqueue(PendingMessage::new(payload(1)));
        beta.enqueue(PendingMessage::new(payload(2)));
        beta.enqueue(PendingMessage::new(payload(3)));

        Scheduler::new(vec![alpha.clone(), beta.clone()], Duration::from_secs(1)).tick().await;

        assert_eq!((alpha.pending(), beta.pending()), (0, 0));
        assert_eq!((submitted(&alpha), submitted(&beta)), (1, 2));
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_submission_order() {
        let alpha =
            stub_relay("alpha", scripted(vec![Err(TransportErrorKind::backend_gone().into())]));
        alpha.enqueue(PendingMessage::new(payload(1)));
        alpha.enqueue(PendingMessage::new(payload(2)));
        let scheduler = Scheduler::new(vec![alpha.clone()], Duration::from_secs(1));

        scheduler.tick().await;
        assert_eq!(alpha.pending(), 2);
        scheduler.tick().await;

        let inputs = alpha.binding().ledger().inner().submitted.lock().unwrap().clone();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], inputs[1]);
        assert_ne!(inputs[1], inputs[2]);
        assert_eq!(alpha.pending(), 0);
    }

    #[tokio::test]
    async fn test_reverted_message_is_dropped() {
        let alpha = stub_relay(
            "alpha",
            scripted(vec![Ok(ExecutionReceipt {
                transaction_hash: B256::repeat_byte(0x01),
                success: false,
                ..Default::default()
            })]),
        );
        alpha.enqueue(PendingMessage::new(payload(1)));
        alpha.enqueue(PendingMessage::new(payload(2)));

        drain(&alpha).await;

        assert_eq!(alpha.pending(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_message_is_not_resubmitted() {
        let alpha = stub_relay(
            "alpha",
            scripted(vec![Err(LedgerError::PendingTransaction(
                PendingTransactionError::FailedToRegister,
            ))]),
        );
        alpha.enqueue(PendingMessage::new(payload(1)));
        alpha.enqueue(PendingMessage::new(payload(2)));

        drain(&alpha).await;
        assert_eq!(alpha.pending(), 1);
        drain(&alpha).await;

        let inputs = alpha.binding().ledger().inner().submitted.lock().unwrap().clone();
        assert_eq!(inputs.len(), 2);
        assert_ne!(inputs[0], inputs[1]);
        assert_eq!(alpha.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let alpha = stub_relay("alpha", StubLedger::default());
        let scheduler = Scheduler::new(vec![alpha], Duration::from_secs(5));
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            stopper.cancel();
        });

        scheduler.run(cancel).await;
    }
}
