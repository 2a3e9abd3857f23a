//! The association between a named chain, its ledger client and its two contracts.

use crate::{
    ContractHandle,
    config::NetworkConfig,
    ledger::{AlloyLedger, LedgerClient, LedgerError, SerializedLedger},
};
use alloy_json_abi::JsonAbi;
use alloy_primitives::ChainId;
use alloy_signer_local::PrivateKeySigner;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Name the registration contract is referred to by in logs and errors.
pub const PROTOCOL_CONTRACT: &str = "protocol";

/// Name the token-logic contract is referred to by in logs and errors.
pub const TOKEN_CONTRACT: &str = "token";

/// Errors raised while establishing a [`ChainBinding`].
#[derive(Debug, Error)]
pub enum BindingError {
    /// The node could not be reached.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The node serves a different chain than configured.
    #[error("chain {chain} is configured with id {expected} but the node reports {actual}")]
    ChainIdMismatch {
        /// The chain name.
        chain: String,
        /// The configured chain id.
        expected: ChainId,
        /// The chain id reported by the node.
        actual: ChainId,
    },
}

/// A configured chain: its ledger client and contract handles.
///
/// Every submission made through the binding goes through one [`SerializedLedger`].
#[derive(Debug)]
pub struct ChainBinding<L> {
    name: String,
    chain_id: ChainId,
    ledger: Arc<SerializedLedger<L>>,
    protocol: ContractHandle,
    token: ContractHandle,
}

impl<L: LedgerClient> ChainBinding<L> {
    /// Creates a new [`ChainBinding`].
    pub fn new(
        name: impl Into<String>,
        chain_id: ChainId,
        ledger: L,
        protocol: ContractHandle,
        token: ContractHandle,
    ) -> Self {
        Self {
            name: name.into(),
            chain_id,
            ledger: Arc::new(SerializedLedger::new(ledger)),
            protocol,
            token,
        }
    }

    /// The chain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured chain id.
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The serialized ledger client.
    pub const fn ledger(&self) -> &Arc<SerializedLedger<L>> {
        &self.ledger
    }

    /// The protocol-registration contract.
    pub const fn protocol(&self) -> &ContractHandle {
        &self.protocol
    }

    /// The token-logic contract.
    pub const fn token(&self) -> &ContractHandle {
        &self.token
    }

    /// Checks that the node serves the configured chain.
    pub async fn verify_chain_id(&self) -> Result<(), BindingError> {
        let actual = self.ledger.chain_id().await?;
        if actual != self.chain_id {
            return Err(BindingError::ChainIdMismatch {
                chain: self.name.clone(),
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }
}

impl ChainBinding<AlloyLedger> {
    /// Connects to the node of `network` and verifies it serves the configured chain.
    pub async fn connect(
        name: &str,
        network: &NetworkConfig,
        signer: PrivateKeySigner,
        protocol_abi: JsonAbi,
        token_abi: JsonAbi,
    ) -> Result<Self, BindingError> {
        let ledger = AlloyLedger::connect(&network.node_address, signer, network.chain_id).await?;
        let binding = Self::new(
            name,
            network.chain_id,
            ledger,
            ContractHandle::new(PROTOCOL_CONTRACT, network.protocol_contract_address, protocol_abi),
            ContractHandle::new(TOKEN_CONTRACT, network.token_contract_address, token_abi),
        );
        binding.verify_chain_id().await?;

        info!(target: "relay::ledger", chain = %name, chain_id = network.chain_id, "Chain binding established");
        Ok(binding)
    }
}
