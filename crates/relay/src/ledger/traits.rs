use super::LedgerError;
use alloy_primitives::{Address, B256, Bytes, ChainId, Log};
use alloy_rpc_types_eth::{Filter, Log as RpcLog};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;

/// Stream of logs delivered by a live subscription.
pub type LogStream = BoxStream<'static, Result<RpcLog, LedgerError>>;

/// An acknowledged log subscription.
pub struct LogSubscription {
    /// Identifier assigned by the node when the subscription was accepted.
    pub id: B256,
    /// The delivered logs, in the node's notification order.
    pub stream: LogStream,
}

impl LogSubscription {
    /// Creates a new [`LogSubscription`].
    pub fn new(id: B256, stream: LogStream) -> Self {
        Self { id, stream }
    }
}

impl fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSubscription").field("id", &self.id).finish_non_exhaustive()
    }
}

/// The parts of a mined transaction receipt the relay inspects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: B256,
    /// Whether execution succeeded.
    pub success: bool,
    /// Block the transaction was included in, if reported.
    pub block_number: Option<u64>,
    /// Logs emitted by the transaction, in emission order.
    pub logs: Vec<Log>,
}

/// Access to one chain: read-only calls, signed submissions and log subscriptions.
///
/// Implementations sign with the credential of the chain binding they were built for and stamp
/// every submission with that chain's id.
#[async_trait]
pub trait LedgerClient: fmt::Debug + Send + Sync {
    /// Returns the chain id reported by the node.
    async fn chain_id(&self) -> Result<ChainId, LedgerError>;

    /// Executes a read-only call against `to` and returns the raw return data.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError>;

    /// Signs and submits a transaction to `to`, waiting for its receipt.
    async fn send_transaction(
        &self,
        to: Address,
        input: Bytes,
    ) -> Result<ExecutionReceipt, LedgerError>;

    /// Opens a live subscription for logs matching `filter`.
    async fn subscribe_logs(&self, filter: Filter) -> Result<LogSubscription, LedgerError>;
}
