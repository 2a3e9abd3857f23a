//! The per-chain relay facade.

use crate::{
    ChainBinding, ContractError, DEFAULT_FORWARDED_CACHE_SIZE, DEFAULT_MAX_TRIGGERS_PER_SWEEP,
    DispatcherHandle, DrainError, EventDispatcher, MessageHandler, OutboundBatch,
    OutcomeClassifier, PendingMessage, SignatureTable, SignatureTableError, SweepError,
    TriggerOutcome, TriggerSweeper,
    ledger::{LedgerClient, SerializedLedger},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Tunables of a [`ChainRelay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Upper bound of triggers performed by one sweep.
    pub max_triggers_per_sweep: usize,
    /// Number of forwarded occurrences remembered for de-duplication.
    pub forwarded_cache_size: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            max_triggers_per_sweep: DEFAULT_MAX_TRIGGERS_PER_SWEEP,
            forwarded_cache_size: DEFAULT_FORWARDED_CACHE_SIZE,
        }
    }
}

/// Relays protocol messages to and from one chain.
///
/// Owns the chain's outbound batch and signature table, and drives its dispatcher and trigger
/// sweeps.
#[derive(Debug)]
pub struct ChainRelay<L> {
    binding: Arc<ChainBinding<L>>,
    table: Arc<SignatureTable>,
    batch: OutboundBatch,
    sweeper: TriggerSweeper<SerializedLedger<L>>,
    options: RelayOptions,
}

impl<L> ChainRelay<L>
where
    L: LedgerClient + 'static,
{
    /// Builds the relay, indexing the outcome events of the token-logic contract.
    pub fn initialize(
        binding: ChainBinding<L>,
        options: RelayOptions,
    ) -> Result<Self, SignatureTableError> {
        let table = Arc::new(SignatureTable::build(binding.token().abi())?);
        let classifier = OutcomeClassifier::new(table.clone(), binding.token().address());
        let sweeper = TriggerSweeper::new(
            binding.name(),
            binding.ledger().clone(),
            binding.token().clone(),
            classifier,
        )
        .with_max_triggers(options.max_triggers_per_sweep);

        info!(
            target: "relay::table",
            chain = %binding.name(),
            outcomes = table.len(),
            "Chain relay initialized"
        );
        Ok(Self { binding: Arc::new(binding), table, batch: OutboundBatch::new(), sweeper, options })
    }

    /// The chain name.
    pub fn name(&self) -> &str {
        self.binding.name()
    }

    /// The chain binding.
    pub fn binding(&self) -> &ChainBinding<L> {
        &self.binding
    }

    /// The outcome signature table built at initialization.
    pub const fn signature_table(&self) -> &Arc<SignatureTable> {
        &self.table
    }

    /// Appends a message to the outbound batch.
    pub fn enqueue(&self, message: PendingMessage) {
        self.batch.enqueue(message);
    }

    /// Puts a message back at the head of the outbound batch.
    pub fn requeue_front(&self, message: PendingMessage) {
        self.batch.requeue_front(message);
    }

    /// Number of messages waiting in the outbound batch.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Submits the outbound batch. See [`OutboundBatch::drain`].
    pub async fn drain(&self) -> Result<usize, DrainError> {
        self.batch.drain(self.binding.name(), self.binding.ledger().as_ref(), self.binding.token()).await
    }

    /// Starts the `TransactionSent` dispatcher for this chain.
    pub fn start_subscription(
        &self,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<DispatcherHandle, ContractError> {
        let dispatcher = EventDispatcher::new(
            self.binding.name(),
            self.binding.ledger().clone(),
            self.binding.protocol().clone(),
            self.binding.token().clone(),
            handler,
        )?
        .with_cache_size(self.options.forwarded_cache_size);
        Ok(dispatcher.spawn(cancel))
    }

    /// Triggers every currently executable delayed transaction, up to the sweep bound.
    pub async fn run_trigger_sweep(&self) -> Result<Vec<TriggerOutcome>, SweepError> {
        self.sweeper.run_sweep().await
    }
}
