//! [`LedgerClient`] backed by an alloy provider.

use super::{ExecutionReceipt, LedgerClient, LedgerError, LogSubscription};
use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, ChainId};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{Filter, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use futures::StreamExt;
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// A signing provider for one chain.
///
/// Subscriptions require a websocket endpoint; calls and submissions work over HTTP as well.
#[derive(Clone)]
pub struct AlloyLedger {
    provider: DynProvider,
    sender: Address,
    chain_id: ChainId,
}

impl AlloyLedger {
    /// Connects to `endpoint`, signing every submission with `signer` for `chain_id`.
    pub async fn connect(
        endpoint: &Url,
        signer: PrivateKeySigner,
        chain_id: ChainId,
    ) -> Result<Self, LedgerError> {
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(endpoint.as_str())
            .await?
            .erased();

        info!(target: "relay::ledger", %endpoint, %sender, chain_id, "Connected to node");
        Ok(Self { provider, sender, chain_id })
    }

    /// The account submissions are signed by.
    pub const fn sender(&self) -> Address {
        self.sender
    }
}

impl fmt::Debug for AlloyLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlloyLedger")
            .field("sender", &self.sender)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LedgerClient for AlloyLedger {
    async fn chain_id(&self) -> Result<ChainId, LedgerError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        Ok(self.provider.call(request).await?)
    }

    async fn send_transaction(
        &self,
        to: Address,
        input: Bytes,
    ) -> Result<ExecutionReceipt, LedgerError> {
        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(input)
            .with_chain_id(self.chain_id);

        let pending = self.provider.send_transaction(request).await?;
        debug!(target: "relay::ledger", tx_hash = %pending.tx_hash(), "Transaction broadcast");

        let receipt = pending.get_receipt().await?;
        Ok(ExecutionReceipt {
            transaction_hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        })
    }

    async fn subscribe_logs(&self, filter: Filter) -> Result<LogSubscription, LedgerError> {
        let subscription = self.provider.subscribe_logs(&filter).await?;
        let id = *subscription.local_id();
        Ok(LogSubscription::new(id, subscription.into_stream().map(Ok).boxed()))
    }
}
