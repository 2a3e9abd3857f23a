use alloy_primitives::B256;
use alloy_provider::PendingTransactionError;
use alloy_transport::{RpcError, TransportErrorKind};
use thiserror::Error;

/// Errors surfaced by a [`LedgerClient`](super::LedgerClient).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The node could not be reached or answered with an RPC error.
    #[error(transparent)]
    Transport(#[from] RpcError<TransportErrorKind>),

    /// The transaction was broadcast but its receipt could not be obtained.
    #[error(transparent)]
    PendingTransaction(#[from] PendingTransactionError),

    /// The transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(B256),

    /// The log subscription could not be established or was dropped.
    #[error("subscription error: {0}")]
    Subscription(String),
}
