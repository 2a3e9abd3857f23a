use super::{DispatchError, OccurrenceKey, RelayedMessage};
use async_trait::async_trait;
use std::fmt::Debug;

/// Receives the messages resolved by an [`EventDispatcher`](super::EventDispatcher).
#[async_trait]
pub trait MessageHandler: Debug + Send + Sync {
    /// Called once per forwarded occurrence, in the ledger's notification order.
    async fn handle_message(&self, message: RelayedMessage);

    /// Called when the node retracts an occurrence that was already forwarded.
    async fn handle_retraction(&self, _chain: &str, _key: OccurrenceKey) {}

    /// Called for failures that did not end the dispatcher.
    fn handle_error(&self, _chain: &str, _err: &DispatchError) {}
}
