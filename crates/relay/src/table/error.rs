use crate::OutcomeKind;
use alloy_primitives::B256;
use thiserror::Error;

/// Errors raised while building a [`SignatureTable`](crate::SignatureTable).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureTableError {
    /// The interface declares more than one event under a recognized outcome name.
    #[error("interface declares {count} events named {kind}")]
    Duplicate {
        /// The ambiguous outcome kind.
        kind: OutcomeKind,
        /// Number of matching event members.
        count: usize,
    },
    /// Two recognized outcome kinds resolve to the same signature.
    #[error("{first} and {second} share signature {signature}")]
    SelectorCollision {
        /// The kind registered first.
        first: OutcomeKind,
        /// The kind whose signature collided.
        second: OutcomeKind,
        /// The shared signature.
        signature: B256,
    },
}
