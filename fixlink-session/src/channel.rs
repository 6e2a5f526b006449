/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Channel kinds.
//!
//! The counterparty exposes one endpoint for market data and one for order
//! entry. A session is parameterized by a marker type implementing
//! [`Channel`], which fixes its port and sender sub-id and selects which
//! business operations are available.

use std::fmt;

/// The two channel kinds and their endpoint settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Market data channel.
    Quote,
    /// Order entry channel.
    Trade,
}

impl ChannelKind {
    /// Returns the default TLS port.
    #[must_use]
    pub const fn port(self) -> u16 {
        match self {
            Self::Quote => 5211,
            Self::Trade => 5212,
        }
    }

    /// Returns the SenderSubID (tag 50).
    #[must_use]
    pub const fn sub_id(self) -> &'static str {
        match self {
            Self::Quote => "QUOTE",
            Self::Trade => "TRADE",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sub_id())
    }
}

/// Marker trait for channel kinds.
pub trait Channel: private::Sealed {
    /// Endpoint settings of this channel.
    const KIND: ChannelKind;
}

mod private {
    pub trait Sealed {}
}

/// Market data channel marker.
#[derive(Debug, Clone, Copy)]
pub struct Quote;

impl private::Sealed for Quote {}
impl Channel for Quote {
    const KIND: ChannelKind = ChannelKind::Quote;
}

/// Order entry channel marker.
#[derive(Debug, Clone, Copy)]
pub struct Trade;

impl private::Sealed for Trade {}
impl Channel for Trade {
    const KIND: ChannelKind = ChannelKind::Trade;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(Quote::KIND.port(), 5211);
        assert_eq!(Quote::KIND.sub_id(), "QUOTE");
        assert_eq!(Trade::KIND.port(), 5212);
        assert_eq!(Trade::KIND.sub_id(), "TRADE");
    }

    #[test]
    fn test_display() {
        assert_eq!(ChannelKind::Trade.to_string(), "TRADE");
    }
}
