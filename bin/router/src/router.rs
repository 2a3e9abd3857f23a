//! Forwards protocol messages observed on one chain to every other chain.

use async_trait::async_trait;
use omni_relay::{
    ChainRelay, MessageHandler, OccurrenceKey, PendingMessage, RelayedMessage,
    ledger::LedgerClient,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A [`MessageHandler`] that enqueues every received payload into the outbound batch of every
/// chain except the one it was observed on.
#[derive(Debug)]
pub(crate) struct Router<L> {
    relays: Vec<Arc<ChainRelay<L>>>,
}

impl<L> Router<L> {
    pub(crate) const fn new(relays: Vec<Arc<ChainRelay<L>>>) -> Self {
        Self { relays }
    }
}

#[async_trait]
impl<L> MessageHandler for Router<L>
where
    L: LedgerClient + 'static,
{
    async fn handle_message(&self, message: RelayedMessage) {
        info!(
            target: "router",
            chain = %message.chain,
            key = %message.key,
            members = message.members.len(),
            "Received protocol message"
        );

        for relay in self.relays.iter().filter(|relay| relay.name() != message.chain) {
            relay.enqueue(PendingMessage::new(message.payload.clone()));
            debug!(
                target: "router",
                from = %message.chain,
                to = %relay.name(),
                pending = relay.pending(),
                "Message queued"
            );
        }
    }

    async fn handle_retraction(&self, chain: &str, key: OccurrenceKey) {
        warn!(target: "router", chain, %key, "Routed message was retracted by its source chain");
    }
}
