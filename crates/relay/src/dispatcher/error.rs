use crate::{ContractError, ledger::LedgerError};
use thiserror::Error;

/// Errors raised while turning a delivered log into a [`RelayedMessage`](super::RelayedMessage).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The log carries no transaction hash or log index, so it cannot be keyed.
    #[error("log has no transaction position")]
    MissingPosition,

    /// The log data does not match the `TransactionSent` definition.
    #[error("failed to decode TransactionSent log: {0}")]
    Decode(#[source] alloy_dyn_abi::Error),

    /// The decoded log lacks a field the relay depends on.
    #[error("TransactionSent log has no field {0}")]
    MissingField(&'static str),

    /// A follow-up contract call failed.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The subscription failed or the node closed it.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The subscription stream ended without an error.
    #[error("subscription stream ended")]
    StreamEnded,
}
