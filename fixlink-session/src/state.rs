/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session lifecycle.
//!
//! A session moves `NotConnected -> Connected -> LoggedIn -> Closed`.
//! Operations check the current status and fail with
//! `SessionError::InvalidState` instead of writing to a session that cannot
//! accept them.

use fixlink_core::error::SessionError;
use std::fmt;

/// Current lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// No connection has been opened yet.
    #[default]
    NotConnected,
    /// Connected, logon not yet acknowledged.
    Connected,
    /// Logon acknowledged by the counterparty.
    LoggedIn,
    /// Logged out or failed. Terminal.
    Closed,
}

impl SessionStatus {
    /// Returns the status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotConnected => "NotConnected",
            Self::Connected => "Connected",
            Self::LoggedIn => "LoggedIn",
            Self::Closed => "Closed",
        }
    }

    /// Checks that the session is in `expected`.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` otherwise.
    pub fn require(self, expected: Self) -> Result<(), SessionError> {
        if self == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected: expected.to_string(),
                current: self.to_string(),
            })
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
