/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # fixlink Transport
//!
//! Network transport layer for the fixlink FIX client.
//!
//! This crate provides:
//! - **TLS connector**: TCP connection upgraded to TLS with an explicit
//!   certificate policy
//! - **Transport**: one write followed by at most one response read, bounded
//!   by a timeout
//! - **Codec**: BodyLength-aware detection of complete frames

pub mod codec;
pub mod tls;
pub mod transport;

pub use codec::{CodecError, FixCodec};
pub use tls::CertificatePolicy;
pub use transport::{ReadMode, Response, Transport, TransportOptions, connect};
