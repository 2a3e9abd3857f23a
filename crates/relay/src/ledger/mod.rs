//! The ledger client seam and its alloy-backed implementation.

mod error;
pub use error::LedgerError;

mod traits;
pub use traits::{ExecutionReceipt, LedgerClient, LogStream, LogSubscription};

mod alloy;
pub use alloy::AlloyLedger;

mod serial;
pub use serial::SerializedLedger;
