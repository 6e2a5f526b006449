/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # fixlink Session
//!
//! FIX 4.4 session controller and channel operations for fixlink.
//!
//! This crate provides:
//! - **Configuration**: validated [`SessionConfig`] built with a builder
//! - **Lifecycle**: explicit [`SessionStatus`] checked by every operation
//! - **Session controller**: logon, logout and heartbeat on [`FixSession`]
//! - **Quote channel**: spot bid/offer polling with [`QuoteChannel::request_prices`]
//! - **Trade channel**: market orders with [`TradeChannel::place_market_order`]
//! - **Message log**: every raw message sent and received, plus errors

pub mod channel;
pub mod config;
pub mod log;
pub mod quote;
pub mod session;
pub mod state;
pub mod trade;

#[cfg(test)]
mod testing;

pub use channel::{Channel, ChannelKind, Quote, Trade};
pub use config::{Credentials, SessionConfig, SessionConfigBuilder, account_from_comp_id};
pub use log::{LogEntry, MessageLog};
pub use quote::TopOfBook;
pub use session::{FixSession, QuoteChannel, TlsTcpStream, TradeChannel};
pub use state::SessionStatus;
pub use trade::PlacedOrder;
