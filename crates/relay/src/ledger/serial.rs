use super::{ExecutionReceipt, LedgerClient, LedgerError, LogSubscription};
use alloy_primitives::{Address, Bytes, ChainId};
use alloy_rpc_types_eth::Filter;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Wraps a [`LedgerClient`] so that at most one submission is in flight at a time.
///
/// Batch drains and trigger sweeps on the same binding share one signing account, so their
/// submissions must not interleave. Read-only calls and subscriptions bypass the lane.
#[derive(Debug)]
pub struct SerializedLedger<L> {
    inner: L,
    lane: Mutex<()>,
}

impl<L> SerializedLedger<L> {
    /// Creates a new [`SerializedLedger`].
    pub fn new(inner: L) -> Self {
        Self { inner, lane: Mutex::new(()) }
    }

    /// Returns the wrapped client.
    pub const fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LedgerClient> LedgerClient for SerializedLedger<L> {
    async fn chain_id(&self) -> Result<ChainId, LedgerError> {
        self.inner.chain_id().await
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError> {
        self.inner.call(to, input).await
    }

    async fn send_transaction(
        &self,
        to: Address,
        input: Bytes,
    ) -> Result<ExecutionReceipt, LedgerError> {
        let _guard = self.lane.lock().await;
        self.inner.send_transaction(to, input).await
    }

    async fn subscribe_logs(&self, filter: Filter) -> Result<LogSubscription, LedgerError> {
        self.inner.subscribe_logs(filter).await
    }
}
