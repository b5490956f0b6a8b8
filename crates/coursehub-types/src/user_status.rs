//! Account status state machine.
//!
//! ```text
//!   unconfirmed --confirm--> confirmed --suspend--> suspended
//!        |                     |    ^                  |
//!        |                     |    +-----confirm------+
//!        +--------remove-------+---------remove--------+--> removed
//! ```
//!
//! `removed` is terminal: every transition out of it fails, including
//! `remove` itself. For any other status, requesting the status it is
//! already in succeeds and returns the same value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::DomainError;

/// Lifecycle status of a user account.
///
/// An immutable value object: transition methods take `self` by value and
/// return the new status, leaving any copy of the old one untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Registered, e-mail address not yet confirmed.
    #[default]
    Unconfirmed,
    /// E-mail confirmed; the account is usable.
    Confirmed,
    /// Temporarily locked by an administrator.
    Suspended,
    /// Deleted. No further transitions.
    Removed,
}

impl UserStatus {
    /// Stored and displayed form of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfirmed => "unconfirmed",
            Self::Confirmed => "confirmed",
            Self::Suspended => "suspended",
            Self::Removed => "removed",
        }
    }

    /// Whether the state machine allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: Self) -> bool {
        match (self, to) {
            (Self::Removed, _) => false,
            (from, to) if from == to => true,
            (Self::Unconfirmed | Self::Suspended, Self::Confirmed)
            | (Self::Confirmed, Self::Suspended)
            | (_, Self::Removed) => true,
            _ => false,
        }
    }

    /// Move to `to`, or fail naming both states.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] if the table does not
    /// contain the edge.
    pub fn transition_to(self, to: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_owned(),
                to: to.as_str().to_owned(),
            })
        }
    }

    /// Confirm the account (or reactivate a suspended one).
    pub fn confirm(self) -> Result<Self, DomainError> {
        self.transition_to(Self::Confirmed)
    }

    /// Suspend a confirmed account.
    pub fn suspend(self) -> Result<Self, DomainError> {
        self.transition_to(Self::Suspended)
    }

    /// Remove the account.
    pub fn remove(self) -> Result<Self, DomainError> {
        self.transition_to(Self::Removed)
    }

    /// Whether the account may sign in.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconfirmed" => Ok(Self::Unconfirmed),
            "confirmed" => Ok(Self::Confirmed),
            "suspended" => Ok(Self::Suspended),
            "removed" => Ok(Self::Removed),
            other => Err(DomainError::illegal(format!("unknown user status: {other:?}"))),
        }
    }
}
