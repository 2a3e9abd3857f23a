use super::DispatchError;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{B256, Log};
use alloy_rpc_types_eth::Log as RpcLog;
use derive_more::Display;

/// Identifies one log occurrence across re-deliveries.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{transaction_hash}:{log_index}")]
pub struct OccurrenceKey {
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: B256,
    /// Position of the log within its block.
    pub log_index: u64,
}

/// A `TransactionSent` log as delivered by the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The occurrence key.
    pub key: OccurrenceKey,
    /// Block the log was included in, if reported.
    pub block_number: Option<u64>,
    /// `true` when the node retracts a previously delivered log.
    pub removed: bool,
    /// The raw log.
    pub log: Log,
}

impl TryFrom<RpcLog> for Occurrence {
    type Error = DispatchError;

    fn try_from(log: RpcLog) -> Result<Self, Self::Error> {
        let (Some(transaction_hash), Some(log_index)) = (log.transaction_hash, log.log_index)
        else {
            return Err(DispatchError::MissingPosition);
        };

        Ok(Self {
            key: OccurrenceKey { transaction_hash, log_index },
            block_number: log.block_number,
            removed: log.removed,
            log: log.inner,
        })
    }
}

/// A resolved protocol message forwarded to the [`MessageHandler`](super::MessageHandler).
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedMessage {
    /// Name of the chain the message was observed on.
    pub chain: String,
    /// The occurrence the message was resolved from.
    pub key: OccurrenceKey,
    /// The full transaction payload returned by the registration contract.
    pub payload: DynSolValue,
    /// The current membership set reported by the token-logic contract.
    pub members: Vec<DynSolValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, LogData};

    fn rpc_log(transaction_hash: Option<B256>, log_index: Option<u64>, removed: bool) -> RpcLog {
        RpcLog {
            inner: Log { address: Address::ZERO, data: LogData::default() },
            transaction_hash,
            log_index,
            block_number: Some(7),
            removed,
            ..Default::default()
        }
    }

    #[test]
    fn test_occurrence_from_rpc_log() {
        let hash = B256::repeat_byte(0x01);
        let occurrence = Occurrence::try_from(rpc_log(Some(hash), Some(3), true)).unwrap();

        assert_eq!(occurrence.key, OccurrenceKey { transaction_hash: hash, log_index: 3 });
        assert_eq!(occurrence.block_number, Some(7));
        assert!(occurrence.removed);
        assert_eq!(occurrence.key.to_string(), format!("{hash}:3"));
    }

    #[test]
    fn test_pending_log_has_no_key() {
        assert!(matches!(
            Occurrence::try_from(rpc_log(None, Some(0), false)),
            Err(DispatchError::MissingPosition)
        ));
        assert!(matches!(
            Occurrence::try_from(rpc_log(Some(B256::ZERO), None, false)),
            Err(DispatchError::MissingPosition)
        ));
    }
}
