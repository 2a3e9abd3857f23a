//! Test fixtures for the router.

use alloy_dyn_abi::{DynSolValue, FunctionExt};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, B256, Bytes, ChainId, U256, address};
use alloy_rpc_types_eth::Filter;
use async_trait::async_trait;
use omni_relay::{
    ChainBinding, ChainRelay, ContractHandle, RelayOptions,
    ledger::{ExecutionReceipt, LedgerClient, LedgerError, LogSubscription},
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

const TOKEN_ADDRESS: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");
const PROTOCOL_ADDRESS: Address = address!("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512");

const TOKEN_ABI_JSON: &str = r#"[
  {"type":"function","name":"omniverseTransfer","stateMutability":"nonpayable","outputs":[],
   "inputs":[{"name":"_data","type":"tuple","components":[
     {"name":"nonce","type":"uint128"},{"name":"payload","type":"bytes"}]}]},
  {"type":"function","name":"triggerExecution","stateMutability":"nonpayable","inputs":[],"outputs":[]},
  {"type":"function","name":"getExecutableDelayedTx","stateMutability":"view","inputs":[],
   "outputs":[{"name":"","type":"tuple","components":[
     {"name":"sender","type":"bytes"},{"name":"nonce","type":"uint128"}]}]},
  {"type":"event","name":"OmniverseTokenTransfer","anonymous":false,"inputs":[
     {"name":"from","type":"bytes","indexed":false},{"name":"to","type":"bytes","indexed":false},
     {"name":"value","type":"uint256","indexed":false}]}
]"#;

const PROTOCOL_ABI_JSON: &str = r#"[
  {"type":"event","name":"TransactionSent","anonymous":false,"inputs":[
     {"name":"pk","type":"bytes","indexed":false},{"name":"nonce","type":"uint256","indexed":false}]}
]"#;

/// A ledger that records submissions, answers them from a script and never has delayed
/// transactions.
#[derive(Debug, Default)]
pub(crate) struct StubLedger {
    pub(crate) submitted: Mutex<Vec<Bytes>>,
    pub(crate) script: Mutex<VecDeque<Result<ExecutionReceipt, LedgerError>>>,
}

#[async_trait]
impl LedgerClient for StubLedger {
    async fn chain_id(&self) -> Result<ChainId, LedgerError> {
        Ok(31337)
    }

    async fn call(&self, _to: Address, _input: Bytes) -> Result<Bytes, LedgerError> {
        let abi: JsonAbi = serde_json::from_str(TOKEN_ABI_JSON).unwrap();
        let function = abi.function("getExecutableDelayedTx").unwrap()[0].clone();
        let none = DynSolValue::Tuple(vec![DynSolValue::Bytes(vec![]), DynSolValue::Uint(U256::ZERO, 128)]);
        Ok(function.abi_encode_output(&[none]).unwrap().into())
    }

    async fn send_transaction(
        &self,
        _to: Address,
        input: Bytes,
    ) -> Result<ExecutionReceipt, LedgerError> {
        self.submitted.lock().unwrap().push(input);
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ExecutionReceipt {
                transaction_hash: B256::repeat_byte(0x42),
                success: true,
                ..Default::default()
            })
        })
    }

    async fn subscribe_logs(&self, _filter: Filter) -> Result<LogSubscription, LedgerError> {
        Err(LedgerError::Subscription("not supported".to_string()))
    }
}

/// Builds a relay for `name` backed by a [`StubLedger`].
pub(crate) fn stub_relay(name: &str, ledger: StubLedger) -> Arc<ChainRelay<StubLedger>> {
    let binding = ChainBinding::new(
        name,
        31337,
        ledger,
        ContractHandle::new("protocol", PROTOCOL_ADDRESS, serde_json::from_str(PROTOCOL_ABI_JSON).unwrap()),
        ContractHandle::new("token", TOKEN_ADDRESS, serde_json::from_str(TOKEN_ABI_JSON).unwrap()),
    );
    Arc::new(ChainRelay::initialize(binding, RelayOptions::default()).unwrap())
}

/// A payload accepted by the stub `omniverseTransfer`.
pub(crate) fn payload(nonce: u64) -> DynSolValue {
    DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(nonce), 128), DynSolValue::Bytes(vec![0x01])])
}
