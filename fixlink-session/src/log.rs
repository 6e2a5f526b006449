/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Append-only record of everything a session sent and received.

use bytes::Bytes;
use fixlink_tagvalue::decoder::display_message;

/// One message log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Raw bytes written to the counterparty.
    Sent(Bytes),
    /// Raw bytes read from the counterparty.
    Received(Bytes),
    /// A failure or rejection observed by the session.
    Error(String),
}

impl LogEntry {
    /// Renders the entry for display, with SOH shown as ` | `.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Sent(raw) => format!("sent: {}", display_message(raw)),
            Self::Received(raw) => format!("received: {}", display_message(raw)),
            Self::Error(reason) => format!("error: {reason}"),
        }
    }
}

/// Ordered message log of one session.
///
/// Sent entries contain the logon password in clear text.
///
/// The log only grows. A long running session appends a pair of entries on
/// every poll, so callers should periodically hand it off with
/// `FixSession::take_log` or drop the session.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_sent(&mut self, raw: Bytes) {
        self.entries.push(LogEntry::Sent(raw));
    }

    pub(crate) fn record_received(&mut self, raw: Bytes) {
        self.entries.push(LogEntry::Received(raw));
    }

    pub(crate) fn record_error(&mut self, reason: impl Into<String>) {
        self.entries.push(LogEntry::Error(reason.into()));
    }

    /// Returns every entry in order.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the sent messages in order.
    pub fn sent(&self) -> impl Iterator<Item = &Bytes> {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Sent(raw) => Some(raw),
            _ => None,
        })
    }

    /// Returns the received messages in order.
    pub fn received(&self) -> impl Iterator<Item = &Bytes> {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Received(raw) => Some(raw),
            _ => None,
        })
    }

    /// Returns the recorded errors in order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Error(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    /// Returns the last sent message.
    #[must_use]
    pub fn last_sent(&self) -> Option<&Bytes> {
        self.sent().last()
    }

    /// Returns the last received message.
    #[must_use]
    pub fn last_received(&self) -> Option<&Bytes> {
        self.received().last()
    }
}
