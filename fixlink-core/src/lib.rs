/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # fixlink Core
//!
//! Core types, tags, and error definitions for the fixlink FIX 4.4 client.
//!
//! This crate provides the building blocks shared by every fixlink crate:
//! - **Error types**: the session error taxonomy built on `thiserror`
//! - **Field types**: tag constants and the zero-copy [`FieldRef`]
//! - **Message types**: the [`MsgType`] vocabulary used on the wire
//! - **Core types**: `SeqNum`, `Timestamp`, `CompId`, `Side` and the other
//!   FIX enumerations sent in request bodies

pub mod error;
pub mod field;
pub mod message;
pub mod types;

pub use error::{DecodeError, FixError, Result, SessionError, TransportError};
pub use field::{FieldRef, tags};
pub use message::MsgType;
pub use types::{
    CompId, MarketDepth, MdEntryType, MdUpdateType, OrdType, SeqNum, Side,
    SubscriptionRequestType, TimeInForce, Timestamp,
};
