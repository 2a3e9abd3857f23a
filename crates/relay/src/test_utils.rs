//! Shared fixtures for unit tests.

use crate::{
    ContractHandle, OutcomeKind, SignatureTable,
    ledger::{ExecutionReceipt, LedgerClient, LedgerError, LogSubscription},
};
use alloy_dyn_abi::{DynSolValue, FunctionExt};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, B256, Bytes, ChainId, Log, LogData, U256, address};
use alloy_rpc_types_eth::Filter;
use mockall::mock;

pub(crate) const TOKEN_ADDRESS: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");
pub(crate) const PROTOCOL_ADDRESS: Address =
    address!("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512");

pub(crate) const TOKEN_ABI_JSON: &str = r#"[
  {"type":"function","name":"omniverseTransfer","stateMutability":"nonpayable","outputs":[],
   "inputs":[{"name":"_data","type":"tuple","components":[
     {"name":"nonce","type":"uint128"},{"name":"chainId","type":"uint32"},
     {"name":"initiateSC","type":"bytes"},{"name":"from","type":"bytes"},
     {"name":"payload","type":"bytes"},{"name":"signature","type":"bytes"}]}]},
  {"type":"function","name":"triggerExecution","stateMutability":"nonpayable","inputs":[],"outputs":[]},
  {"type":"function","name":"getExecutableDelayedTx","stateMutability":"view","inputs":[],
   "outputs":[{"name":"","type":"tuple","components":[
     {"name":"sender","type":"bytes"},{"name":"nonce","type":"uint128"}]}]},
  {"type":"function","name":"getMembers","stateMutability":"view","inputs":[],
   "outputs":[{"name":"","type":"uint32[]"}]},
  {"type":"event","name":"OmniverseError","anonymous":false,"inputs":[
     {"name":"sender","type":"bytes","indexed":false},{"name":"reason","type":"string","indexed":false}]},
  {"type":"event","name":"OmniverseNotOwner","anonymous":false,"inputs":[
     {"name":"sender","type":"bytes","indexed":false}]},
  {"type":"event","name":"OmniverseTokenWrongOp","anonymous":false,"inputs":[
     {"name":"sender","type":"bytes","indexed":false},{"name":"op","type":"uint8","indexed":false}]},
  {"type":"event","name":"OmniverseTokenExceedBalance","anonymous":false,"inputs":[
     {"name":"owner","type":"bytes","indexed":false},{"name":"balance","type":"uint256","indexed":false},
     {"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"OmniverseTokenTransferFrom","anonymous":false,"inputs":[
     {"name":"from","type":"bytes","indexed":false},{"name":"to","type":"bytes","indexed":false},
     {"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"OmniverseTokenApproval","anonymous":false,"inputs":[
     {"name":"owner","type":"bytes","indexed":false},{"name":"spender","type":"bytes","indexed":false},
     {"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"OmniverseTokenTransfer","anonymous":false,"inputs":[
     {"name":"from","type":"bytes","indexed":false},{"name":"to","type":"bytes","indexed":false},
     {"name":"value","type":"uint256","indexed":false}]}
]"#;

pub(crate) const PROTOCOL_ABI_JSON: &str = r#"[
  {"type":"event","name":"TransactionSent","anonymous":false,"inputs":[
     {"name":"pk","type":"bytes","indexed":false},{"name":"nonce","type":"uint256","indexed":false}]},
  {"type":"function","name":"getTransactionData","stateMutability":"view",
   "inputs":[{"name":"_pk","type":"bytes"},{"name":"_nonce","type":"uint256"}],
   "outputs":[{"name":"txData","type":"tuple","components":[
     {"name":"nonce","type":"uint128"},{"name":"chainId","type":"uint32"},
     {"name":"initiateSC","type":"bytes"},{"name":"from","type":"bytes"},
     {"name":"payload","type":"bytes"},{"name":"signature","type":"bytes"}]},
     {"name":"timestamp","type":"uint256"}]}
]"#;

mock! {
    #[derive(Debug)]
    pub Ledger {}

    #[async_trait::async_trait]
    impl LedgerClient for Ledger {
        async fn chain_id(&self) -> Result<ChainId, LedgerError>;
        async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError>;
        async fn send_transaction(&self, to: Address, input: Bytes) -> Result<ExecutionReceipt, LedgerError>;
        async fn subscribe_logs(&self, filter: Filter) -> Result<LogSubscription, LedgerError>;
    }
}

pub(crate) fn token_abi() -> JsonAbi {
    serde_json::from_str(TOKEN_ABI_JSON).unwrap()
}

pub(crate) fn token_contract() -> ContractHandle {
    ContractHandle::new("token", TOKEN_ADDRESS, token_abi())
}

pub(crate) fn protocol_contract() -> ContractHandle {
    ContractHandle::new("protocol", PROTOCOL_ADDRESS, serde_json::from_str(PROTOCOL_ABI_JSON).unwrap())
}

pub(crate) fn signature_table() -> SignatureTable {
    SignatureTable::build(&token_abi()).unwrap()
}

/// Encodes the return data of `getExecutableDelayedTx` for the given sender.
pub(crate) fn delayed_tx_output(sender: &[u8]) -> Bytes {
    let function = token_contract().function("getExecutableDelayedTx").unwrap().clone();
    let value = DynSolValue::Tuple(vec![
        DynSolValue::Bytes(sender.to_vec()),
        DynSolValue::Uint(U256::from(1), 128),
    ]);
    function.abi_encode_output(&[value]).unwrap().into()
}

/// Builds a log emitted by `address` for the given outcome kind, with non-indexed `fields`.
pub(crate) fn outcome_log(address: Address, kind: OutcomeKind, fields: Vec<DynSolValue>) -> Log {
    let topic = signature_table().get(kind).unwrap().signature();
    raw_log(address, topic, fields)
}

pub(crate) fn raw_log(address: Address, topic: B256, fields: Vec<DynSolValue>) -> Log {
    let data = DynSolValue::Tuple(fields).abi_encode_params();
    Log { address, data: LogData::new_unchecked(vec![topic], data.into()) }
}

/// A successful receipt carrying `logs`.
pub(crate) fn receipt(logs: Vec<Log>) -> ExecutionReceipt {
    ExecutionReceipt {
        transaction_hash: B256::repeat_byte(0x42),
        success: true,
        block_number: Some(1),
        logs,
    }
}

pub(crate) fn transfer_message(nonce: u64) -> DynSolValue {
    DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(nonce), 128),
        DynSolValue::Uint(U256::from(1), 32),
        DynSolValue::Bytes(vec![0x01]),
        DynSolValue::Bytes(vec![0x02]),
        DynSolValue::Bytes(vec![0x03]),
        DynSolValue::Bytes(vec![0x04]),
    ])
}
