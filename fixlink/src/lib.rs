/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # fixlink
//!
//! A minimal FIX 4.4 client for a broker exposing separate market data and
//! order entry endpoints over TLS.
//!
//! ## Features
//!
//! - **Byte-exact framing**: BodyLength and CheckSum computed the way the
//!   counterparty validates them
//! - **Zero-copy lookup**: received values borrow from the response buffer
//! - **Typed lifecycle**: operations fail with `InvalidState` instead of
//!   writing to a session that cannot accept them
//! - **Async**: built on Tokio and rustls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fixlink::prelude::*;
//!
//! let config = SessionConfig::builder()
//!     .host("demo.ctraderapi.com")
//!     .sender_comp_id("demo.broker.3000001")
//!     .password("secret")
//!     .build()?;
//!
//! let mut quotes: QuoteChannel = QuoteChannel::new(config);
//! quotes.connect().await?;
//! if quotes.logon().await? {
//!     if let Some(book) = quotes.request_prices(1).await? {
//!         println!("bid {} ask {}", book.bid, book.ask);
//!     }
//!     quotes.logout().await?;
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Error taxonomy, tags, message and field types
//! - [`tagvalue`]: Message encoder, field lookup and checksum
//! - [`transport`]: TLS transport and response framing
//! - [`session`]: Session controller and the quote/trade channels

pub mod core {
    //! Error taxonomy, tags, message and field types.
    pub use fixlink_core::*;
}

pub mod tagvalue {
    //! Message encoder, field lookup and checksum.
    pub use fixlink_tagvalue::*;
}

pub mod transport {
    //! TLS transport and response framing.
    pub use fixlink_transport::*;
}

pub mod session {
    //! Session controller and the quote/trade channels.
    pub use fixlink_session::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use fixlink_core::{
        CompId, DecodeError, FixError, MsgType, Result, SeqNum, SessionError, Side, Timestamp,
        TransportError,
    };

    // Tag-value encoding
    pub use fixlink_tagvalue::{Encoder, display_message, get_tag_value};

    // Transport
    pub use fixlink_transport::{CertificatePolicy, ReadMode};

    // Session
    pub use fixlink_session::{
        MessageLog, PlacedOrder, QuoteChannel, SessionConfig, SessionStatus, TopOfBook,
        TradeChannel,
    };
}
