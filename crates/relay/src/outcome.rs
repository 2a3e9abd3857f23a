//! Classification of delayed-execution outcome logs.

use crate::{
    EventDefinition, Metrics, OutcomeKind, SignatureTable,
    fields::{EventFields, party_bytes, uint},
};
use alloy_dyn_abi::{DynSolValue, EventExt};
use alloy_primitives::{Address, Bytes, Log, U256};
use derive_more::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// The decoded result of executing one delayed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TriggerOutcome {
    /// Execution failed with a reason.
    #[display("Execute failed: sent by {sender}, the reason is {reason}.")]
    Error {
        /// The originator of the delayed transaction.
        sender: Bytes,
        /// The failure reason reported by the contract.
        reason: String,
    },
    /// Execution was rejected because the sender is not the owner.
    #[display("Execute failed due to not owner: sent by {sender}.")]
    NotOwner {
        /// The originator of the delayed transaction.
        sender: Bytes,
    },
    /// Execution was rejected because of an unsupported operation code.
    #[display("Execute failed due to wrong Op: sent by {sender}, the op code is {op}.")]
    WrongOp {
        /// The originator of the delayed transaction.
        sender: Bytes,
        /// The offending operation code.
        op: u8,
    },
    /// Execution was rejected because the owner's balance is insufficient.
    #[display(
        "Execute failed due to exceeding balance: {value} is needed from {owner}, which only has {balance}."
    )]
    ExceedBalance {
        /// The amount required.
        value: U256,
        /// The account the amount was drawn from.
        owner: Bytes,
        /// The balance available.
        balance: U256,
    },
    /// A `transferFrom` executed.
    #[display("Execute OmniverseTransferFrom successfully: transfer {value} from {from} to {to}.")]
    TransferFrom {
        /// The amount moved.
        value: U256,
        /// Source account.
        from: Bytes,
        /// Destination account.
        to: Bytes,
    },
    /// An approval executed.
    #[display("Execute OmniverseApprove successfully: {owner} approve {spender} for {value}.")]
    Approval {
        /// The approving owner.
        owner: Bytes,
        /// The approved spender.
        spender: Bytes,
        /// The approved amount.
        value: U256,
    },
    /// A plain transfer executed.
    #[display("Execute OmniverseTransfer successfully: {from} transfer {value} to {to}.")]
    Transfer {
        /// Source account.
        from: Bytes,
        /// The amount moved.
        value: U256,
        /// Destination account.
        to: Bytes,
    },
}

impl TriggerOutcome {
    /// The outcome kind of this result.
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::Error { .. } => OutcomeKind::Error,
            Self::NotOwner { .. } => OutcomeKind::NotOwner,
            Self::WrongOp { .. } => OutcomeKind::WrongOp,
            Self::ExceedBalance { .. } => OutcomeKind::ExceedBalance,
            Self::TransferFrom { .. } => OutcomeKind::TransferFrom,
            Self::Approval { .. } => OutcomeKind::Approval,
            Self::Transfer { .. } => OutcomeKind::Transfer,
        }
    }

    /// Decodes `log` according to `definition`.
    pub fn decode(definition: &EventDefinition, log: &Log) -> Result<Self, OutcomeDecodeError> {
        let kind = definition.kind();
        let decoded = definition
            .event()
            .decode_log(&log.data)
            .map_err(|source| OutcomeDecodeError::Abi { kind, source })?;
        let mut fields = FieldReader { kind, fields: EventFields::new(definition.event(), decoded) };

        Ok(match kind {
            OutcomeKind::Error => {
                Self::Error { sender: fields.party("sender")?, reason: fields.string("reason")? }
            }
            OutcomeKind::NotOwner => Self::NotOwner { sender: fields.party("sender")? },
            OutcomeKind::WrongOp => {
                Self::WrongOp { sender: fields.party("sender")?, op: fields.op("op")? }
            }
            OutcomeKind::ExceedBalance => Self::ExceedBalance {
                value: fields.amount("value")?,
                owner: fields.party("owner")?,
                balance: fields.amount("balance")?,
            },
            OutcomeKind::TransferFrom => Self::TransferFrom {
                value: fields.amount("value")?,
                from: fields.party("from")?,
                to: fields.party("to")?,
            },
            OutcomeKind::Approval => Self::Approval {
                owner: fields.party("owner")?,
                spender: fields.party("spender")?,
                value: fields.amount("value")?,
            },
            OutcomeKind::Transfer => Self::Transfer {
                from: fields.party("from")?,
                value: fields.amount("value")?,
                to: fields.party("to")?,
            },
        })
    }
}

/// Errors raised while decoding a recognized outcome log.
#[derive(Debug, Error)]
pub enum OutcomeDecodeError {
    /// The log data does not match the declared field layout.
    #[error("failed to decode {kind} log: {source}")]
    Abi {
        /// The matched outcome kind.
        kind: OutcomeKind,
        /// The underlying ABI error.
        #[source]
        source: alloy_dyn_abi::Error,
    },
    /// The event declaration lacks a field the outcome requires.
    #[error("{kind} log has no field {field}")]
    MissingField {
        /// The matched outcome kind.
        kind: OutcomeKind,
        /// The missing field.
        field: &'static str,
    },
    /// A field decoded to a type the outcome cannot represent.
    #[error("{kind} field {field} has an unexpected type")]
    UnexpectedType {
        /// The matched outcome kind.
        kind: OutcomeKind,
        /// The offending field.
        field: &'static str,
    },
}

struct FieldReader {
    kind: OutcomeKind,
    fields: EventFields,
}

impl FieldReader {
    fn take(&mut self, field: &'static str) -> Result<DynSolValue, OutcomeDecodeError> {
        self.fields.take(field).ok_or(OutcomeDecodeError::MissingField { kind: self.kind, field })
    }

    fn party(&mut self, field: &'static str) -> Result<Bytes, OutcomeDecodeError> {
        let value = self.take(field)?;
        party_bytes(&value).ok_or(OutcomeDecodeError::UnexpectedType { kind: self.kind, field })
    }

    fn amount(&mut self, field: &'static str) -> Result<U256, OutcomeDecodeError> {
        let value = self.take(field)?;
        uint(&value).ok_or(OutcomeDecodeError::UnexpectedType { kind: self.kind, field })
    }

    fn op(&mut self, field: &'static str) -> Result<u8, OutcomeDecodeError> {
        let value = self.amount(field)?;
        u8::try_from(value).map_err(|_| OutcomeDecodeError::UnexpectedType { kind: self.kind, field })
    }

    fn string(&mut self, field: &'static str) -> Result<String, OutcomeDecodeError> {
        match self.take(field)? {
            DynSolValue::String(value) => Ok(value),
            _ => Err(OutcomeDecodeError::UnexpectedType { kind: self.kind, field }),
        }
    }
}

/// Matches receipt logs of the token-logic contract against the [`SignatureTable`].
#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    table: Arc<SignatureTable>,
    contract: Address,
}

impl OutcomeClassifier {
    /// Creates a classifier for logs emitted by `contract`.
    pub const fn new(table: Arc<SignatureTable>, contract: Address) -> Self {
        Self { table, contract }
    }

    /// Classifies a single log.
    ///
    /// Returns `None` for logs from other contracts, logs without topics, and logs whose first
    /// topic is not a recognized outcome signature.
    pub fn classify(&self, log: &Log) -> Option<Result<TriggerOutcome, OutcomeDecodeError>> {
        if log.address != self.contract {
            return None;
        }
        let definition = self.table.resolve(log.topics().first()?)?;
        Some(TriggerOutcome::decode(definition, log))
    }

    /// Classifies every log of a receipt, reporting each outcome.
    ///
    /// Logs that match a signature but fail to decode are logged and skipped.
    pub fn classify_logs(&self, chain: &str, logs: &[Log]) -> Vec<TriggerOutcome> {
        let mut outcomes = Vec::new();
        for (index, log) in logs.iter().enumerate() {
            match self.classify(log) {
                Some(Ok(outcome)) => {
                    info!(target: "relay::trigger", chain, kind = %outcome.kind(), "{outcome}");
                    metrics::counter!(
                        Metrics::OUTCOMES_TOTAL,
                        "chain" => chain.to_string(),
                        "kind" => outcome.kind().event_name(),
                    )
                    .increment(1);
                    outcomes.push(outcome);
                }
                Some(Err(err)) => {
                    warn!(target: "relay::trigger", chain, log_index = index, %err, "Skipping undecodable outcome log");
                    metrics::counter!(
                        Metrics::OUTCOME_DECODE_ERRORS_TOTAL,
                        "chain" => chain.to_string(),
                    )
                    .increment(1);
                }
                None => {}
            }
        }
        outcomes
    }
}
