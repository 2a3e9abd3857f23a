//! Subscription to protocol `TransactionSent` events and message forwarding.

mod error;
pub use error::DispatchError;

mod handler;
pub use handler::MessageHandler;

mod occurrence;
pub use occurrence::{Occurrence, OccurrenceKey, RelayedMessage};

mod task;
pub use task::{
    DEFAULT_FORWARDED_CACHE_SIZE, DispatcherHandle, EventDispatcher, MEMBERS_FUNCTION,
    TRANSACTION_DATA_FUNCTION, TRANSACTION_SENT_EVENT,
};
