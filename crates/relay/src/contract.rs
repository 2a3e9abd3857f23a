//! ABI-driven access to a deployed contract.

use crate::{
    fields::find_output,
    ledger::{ExecutionReceipt, LedgerClient, LedgerError},
};
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Event, Function, JsonAbi, Param};
use alloy_primitives::{Address, Bytes};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Errors raised while encoding, executing or decoding a contract interaction.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The interface does not declare the requested function.
    #[error("{contract} declares no function {function}")]
    UnknownFunction {
        /// The contract name.
        contract: String,
        /// The requested function.
        function: String,
    },

    /// The interface does not declare the requested event.
    #[error("{contract} declares no event {event}")]
    UnknownEvent {
        /// The contract name.
        contract: String,
        /// The requested event.
        event: String,
    },

    /// The arguments do not match the function's declared inputs.
    #[error("failed to encode {function} call: {source}")]
    Encode {
        /// The function being called.
        function: String,
        /// The underlying ABI error.
        #[source]
        source: alloy_dyn_abi::Error,
    },

    /// The returned data does not match the function's declared outputs.
    #[error("failed to decode {function} output: {source}")]
    Decode {
        /// The function that was called.
        function: String,
        /// The underlying ABI error.
        #[source]
        source: alloy_dyn_abi::Error,
    },

    /// The decoded output lacks a field the relay depends on.
    #[error("{function} output has no usable field {field}")]
    MissingOutput {
        /// The function that was called.
        function: String,
        /// The missing field.
        field: &'static str,
    },

    /// The ledger rejected or failed the interaction.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Decoded return values of a read-only call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutput {
    params: Vec<Param>,
    values: Vec<DynSolValue>,
}

impl CallOutput {
    /// Returns the value declared under `name`, searching nested tuples.
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        find_output(&self.params, &self.values, name)
    }

    /// Returns the first return value.
    pub fn first(&self) -> Option<&DynSolValue> {
        self.values.first()
    }

    /// Consumes the output, returning the positional values.
    pub fn into_values(self) -> Vec<DynSolValue> {
        self.values
    }
}

/// A deployed contract: its address and interface description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    name: String,
    address: Address,
    abi: Arc<JsonAbi>,
}

impl ContractHandle {
    /// Creates a new [`ContractHandle`].
    pub fn new(name: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
        Self { name: name.into(), address, abi: Arc::new(abi) }
    }

    /// The name the contract is referred to by in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The deployed address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The interface description.
    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Returns the first declared overload of `name`.
    pub fn function(&self, name: &str) -> Result<&Function, ContractError> {
        self.abi.function(name).and_then(|overloads| overloads.first()).ok_or_else(|| {
            ContractError::UnknownFunction {
                contract: self.name.clone(),
                function: name.to_string(),
            }
        })
    }

    /// Returns the first declared overload of event `name`.
    pub fn event(&self, name: &str) -> Result<&Event, ContractError> {
        self.abi.event(name).and_then(|overloads| overloads.first()).ok_or_else(|| {
            ContractError::UnknownEvent { contract: self.name.clone(), event: name.to_string() }
        })
    }

    /// ABI-encodes a call to `function`, selector included.
    pub fn encode_call(&self, function: &str, args: &[DynSolValue]) -> Result<Bytes, ContractError> {
        self.function(function)?
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|source| ContractError::Encode { function: function.to_string(), source })
    }

    /// Executes a read-only call and decodes its outputs.
    pub async fn call<L>(
        &self,
        ledger: &L,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<CallOutput, ContractError>
    where
        L: LedgerClient + ?Sized,
    {
        let definition = self.function(function)?;
        let input = self.encode_call(function, args)?;

        trace!(target: "relay::contract", contract = %self.name, function, "Calling contract");
        let output = ledger.call(self.address, input).await?;

        let values = definition
            .abi_decode_output(&output)
            .map_err(|source| ContractError::Decode { function: function.to_string(), source })?;
        Ok(CallOutput { params: definition.outputs.clone(), values })
    }

    /// Submits a state-changing transaction and waits for a successful receipt.
    ///
    /// A mined but reverted transaction is reported as [`LedgerError::Reverted`].
    pub async fn transact<L>(
        &self,
        ledger: &L,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<ExecutionReceipt, ContractError>
    where
        L: LedgerClient + ?Sized,
    {
        let input = self.encode_call(function, args)?;

        trace!(target: "relay::contract", contract = %self.name, function, "Submitting transaction");
        let receipt = ledger.send_transaction(self.address, input).await?;
        if !receipt.success {
            return Err(LedgerError::Reverted(receipt.transaction_hash).into());
        }
        Ok(receipt)
    }
}
