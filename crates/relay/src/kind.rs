//! The closed set of outcome events emitted by the token-logic contract.

use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// An on-chain result signal recognized by the trigger classifier.
///
/// Variants are declared in classification priority order. [`OutcomeKind::iter`] yields them in
/// that order.
///
/// [`OutcomeKind::iter`]: strum::IntoEnumIterator::iter
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum OutcomeKind {
    /// Generic execution failure carrying a reason string.
    #[strum(serialize = "OmniverseError")]
    Error,
    /// The sender does not own the token.
    #[strum(serialize = "OmniverseNotOwner")]
    NotOwner,
    /// The operation code is not supported by the token.
    #[strum(serialize = "OmniverseTokenWrongOp")]
    WrongOp,
    /// The owner does not hold enough balance.
    #[strum(serialize = "OmniverseTokenExceedBalance")]
    ExceedBalance,
    /// A `transferFrom` executed successfully.
    #[strum(serialize = "OmniverseTokenTransferFrom")]
    TransferFrom,
    /// An `approve` executed successfully.
    #[strum(serialize = "OmniverseTokenApproval")]
    Approval,
    /// A plain transfer executed successfully.
    #[strum(serialize = "OmniverseTokenTransfer")]
    Transfer,
}

impl OutcomeKind {
    /// Returns the event name declared by the contract interface for this kind.
    pub fn event_name(&self) -> &'static str {
        self.into()
    }

    /// Returns `true` for the kinds that report a rejected execution.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::NotOwner | Self::WrongOp | Self::ExceedBalance)
    }
}
