use super::{DispatchError, MessageHandler, Occurrence, OccurrenceKey, RelayedMessage};
use crate::{
    ContractError, ContractHandle, Metrics,
    fields::EventFields,
    ledger::{LedgerClient, LedgerError, LogSubscription},
};
use alloy_dyn_abi::{DynSolValue, EventExt};
use alloy_json_abi::Event;
use alloy_rpc_types_eth::{Filter, Log as RpcLog};
use backon::{BackoffBuilder, ExponentialBuilder, Retryable};
use futures::StreamExt;
use lru::LruCache;
use std::{num::NonZeroUsize, sync::Arc, time::Duration};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The registration contract event announcing a new protocol transaction.
pub const TRANSACTION_SENT_EVENT: &str = "TransactionSent";

/// Registration contract operation returning the full transaction payload.
pub const TRANSACTION_DATA_FUNCTION: &str = "getTransactionData";

/// Token-logic operation returning the current membership set.
pub const MEMBERS_FUNCTION: &str = "getMembers";

/// Delay between resubscriptions once the backoff schedule is exhausted.
const MAX_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(30);

/// Default number of forwarded occurrences remembered for de-duplication.
pub const DEFAULT_FORWARDED_CACHE_SIZE: usize = 4096;

/// Watches the registration contract and forwards resolved messages to a [`MessageHandler`].
///
/// The dispatcher subscribes to `TransactionSent` logs, resolves each occurrence into the full
/// payload plus the membership set, and hands the result to the handler. Dropped subscriptions are
/// re-established with exponential backoff until the dispatcher is cancelled.
#[derive(Debug)]
pub struct EventDispatcher<L> {
    chain: String,
    ledger: Arc<L>,
    protocol: ContractHandle,
    token: ContractHandle,
    event: Event,
    handler: Arc<dyn MessageHandler>,
    forwarded: LruCache<OccurrenceKey, ()>,
    backoff: ExponentialBuilder,
}

impl<L> EventDispatcher<L>
where
    L: LedgerClient + 'static,
{
    /// Creates a new [`EventDispatcher`].
    ///
    /// Fails if the registration contract does not declare [`TRANSACTION_SENT_EVENT`].
    pub fn new(
        chain: impl Into<String>,
        ledger: Arc<L>,
        protocol: ContractHandle,
        token: ContractHandle,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, ContractError> {
        let event = protocol.event(TRANSACTION_SENT_EVENT)?.clone();
        Ok(Self {
            chain: chain.into(),
            ledger,
            protocol,
            token,
            event,
            handler,
            forwarded: LruCache::new(
                NonZeroUsize::new(DEFAULT_FORWARDED_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
            backoff: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_delay(Duration::from_secs(30))
                .with_jitter()
                .without_max_times(),
        })
    }

    /// Sets how many forwarded occurrences are remembered for de-duplication.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.forwarded.resize(NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN));
        self
    }

    /// Replaces the backoff used when re-establishing the subscription.
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    /// The log filter the dispatcher subscribes with.
    pub fn filter(&self) -> Filter {
        Filter::new().address(self.protocol.address()).event_signature(self.event.selector())
    }

    /// Spawns the dispatcher onto the runtime.
    pub fn spawn(self, cancel: CancellationToken) -> DispatcherHandle {
        let task = tokio::spawn(self.run(cancel.clone()));
        DispatcherHandle { cancel, task }
    }

    /// Runs the dispatcher until `cancel` fires.
    ///
    /// Every closed subscription is followed by a backoff delay before resubscribing. The delay
    /// grows with each consecutive closure and resets once a log is delivered.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(target: "relay::dispatcher", chain = %self.chain, "Starting event dispatcher");

        let mut delays = self.backoff.build();
        loop {
            let subscription = tokio::select! {
                _ = cancel.cancelled() => break,
                subscription = self.subscribe() => subscription,
            };

            match subscription {
                Ok(mut subscription) => {
                    info!(
                        target: "relay::dispatcher",
                        chain = %self.chain,
                        subscription_id = %subscription.id,
                        "Subscribed to TransactionSent"
                    );
                    metrics::counter!(Metrics::SUBSCRIPTIONS_TOTAL, "chain" => self.chain.clone())
                        .increment(1);

                    loop {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                info!(target: "relay::dispatcher", chain = %self.chain, "Event dispatcher cancelled");
                                return;
                            }
                            item = subscription.stream.next() => match item {
                                Some(Ok(log)) => {
                                    delays = self.backoff.build();
                                    self.process(log).await;
                                }
                                Some(Err(err)) => {
                                    self.report(DispatchError::Ledger(err));
                                    break;
                                }
                                None => {
                                    self.report(DispatchError::StreamEnded);
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(err) => self.report(DispatchError::Ledger(err)),
            }

            let delay = delays.next().unwrap_or(MAX_RESUBSCRIBE_DELAY);
            warn!(target: "relay::dispatcher", chain = %self.chain, ?delay, "Subscription closed, resubscribing");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(target: "relay::dispatcher", chain = %self.chain, "Event dispatcher cancelled");
    }

    async fn subscribe(&self) -> Result<LogSubscription, LedgerError> {
        let filter = self.filter();
        (|| self.ledger.subscribe_logs(filter.clone()))
            .retry(self.backoff)
            .notify(|err: &LedgerError, delay: Duration| {
                warn!(
                    target: "relay::dispatcher",
                    chain = %self.chain,
                    %err,
                    ?delay,
                    "Failed to subscribe, retrying"
                );
            })
            .await
    }

    async fn process(&mut self, log: RpcLog) {
        let occurrence = match Occurrence::try_from(log) {
            Ok(occurrence) => occurrence,
            Err(err) => return self.report(err),
        };

        if occurrence.removed {
            return self.retract(occurrence.key).await;
        }

        if self.forwarded.contains(&occurrence.key) {
            debug!(
                target: "relay::dispatcher",
                chain = %self.chain,
                key = %occurrence.key,
                "Skipping occurrence already forwarded"
            );
            return;
        }

        match self.resolve(&occurrence).await {
            Ok(message) => {
                self.forwarded.put(occurrence.key, ());
                debug!(
                    target: "relay::dispatcher",
                    chain = %self.chain,
                    key = %occurrence.key,
                    members = message.members.len(),
                    "Forwarding message"
                );
                metrics::counter!(Metrics::OCCURRENCES_FORWARDED_TOTAL, "chain" => self.chain.clone())
                    .increment(1);
                self.handler.handle_message(message).await;
            }
            Err(err) => self.report(err),
        }
    }

    async fn retract(&mut self, key: OccurrenceKey) {
        if self.forwarded.pop(&key).is_none() {
            debug!(target: "relay::dispatcher", chain = %self.chain, %key, "Retraction of unknown occurrence");
            return;
        }

        warn!(target: "relay::dispatcher", chain = %self.chain, %key, "Forwarded occurrence retracted");
        metrics::counter!(Metrics::OCCURRENCES_RETRACTED_TOTAL, "chain" => self.chain.clone())
            .increment(1);
        self.handler.handle_retraction(&self.chain, key).await;
    }

    /// Resolves an occurrence into the full payload and membership set.
    async fn resolve(&self, occurrence: &Occurrence) -> Result<RelayedMessage, DispatchError> {
        let decoded = self.event.decode_log(&occurrence.log.data).map_err(DispatchError::Decode)?;
        let mut fields = EventFields::new(&self.event, decoded);
        let pk = fields.take("pk").ok_or(DispatchError::MissingField("pk"))?;
        let nonce = fields.take("nonce").ok_or(DispatchError::MissingField("nonce"))?;

        let data = self
            .protocol
            .call(self.ledger.as_ref(), TRANSACTION_DATA_FUNCTION, &[pk, nonce])
            .await?;
        let payload = data.field("txData").or_else(|| data.first()).cloned().ok_or(
            ContractError::MissingOutput {
                function: TRANSACTION_DATA_FUNCTION.to_string(),
                field: "txData",
            },
        )?;

        let members = match self.token.call(self.ledger.as_ref(), MEMBERS_FUNCTION, &[]).await?.first()
        {
            Some(DynSolValue::Array(members) | DynSolValue::FixedArray(members)) => members.clone(),
            _ => {
                return Err(ContractError::MissingOutput {
                    function: MEMBERS_FUNCTION.to_string(),
                    field: "members",
                }
                .into());
            }
        };

        Ok(RelayedMessage { chain: self.chain.clone(), key: occurrence.key, payload, members })
    }

    fn report(&self, err: DispatchError) {
        error!(target: "relay::dispatcher", chain = %self.chain, %err, "Dispatch failure");
        metrics::counter!(Metrics::DISPATCH_ERRORS_TOTAL, "chain" => self.chain.clone())
            .increment(1);
        self.handler.handle_error(&self.chain, &err);
    }
}

/// Handle to a spawned [`EventDispatcher`].
#[derive(Debug)]
pub struct DispatcherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    /// The token that stops the dispatcher.
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `true` once the dispatcher task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the dispatcher and waits for it to exit.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.cancel.cancel();
        self.task.await
    }
}
