//! Signature table construction for the token-logic outcome events.

mod error;
pub use error::SignatureTableError;

mod table;
pub use table::{EventDefinition, SignatureTable};
