#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod kind;
pub use kind::OutcomeKind;

mod table;
pub use table::{EventDefinition, SignatureTable, SignatureTableError};

mod fields;

mod contract;
pub use contract::{CallOutput, ContractError, ContractHandle};

mod metrics;
pub use metrics::Metrics;

mod outcome;
pub use outcome::{OutcomeClassifier, OutcomeDecodeError, TriggerOutcome};

pub mod ledger;

mod batch;
pub use batch::{DrainError, OutboundBatch, PendingMessage, TRANSFER_FUNCTION};

mod dispatcher;
pub use dispatcher::{
    DEFAULT_FORWARDED_CACHE_SIZE, DispatchError, DispatcherHandle, EventDispatcher,
    MEMBERS_FUNCTION, MessageHandler, Occurrence, OccurrenceKey, RelayedMessage,
    TRANSACTION_DATA_FUNCTION, TRANSACTION_SENT_EVENT,
};

mod trigger;
pub use trigger::{
    DEFAULT_MAX_TRIGGERS_PER_SWEEP, DelayedTx, POLL_FUNCTION, SweepError, TRIGGER_FUNCTION,
    TriggerSweeper,
};

pub mod config;

mod binding;
pub use binding::{BindingError, ChainBinding, PROTOCOL_CONTRACT, TOKEN_CONTRACT};

mod relay;
pub use relay::{ChainRelay, RelayOptions};

#[cfg(test)]
mod test_utils;
