/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # fixlink Tag-Value
//!
//! FIX tag=value encoding and field lookup for the fixlink client.
//!
//! ## Features
//!
//! - **Framing**: standard header, body length and checksum trailer
//! - **Zero-copy lookup**: field values borrow from the received buffer
//! - **Padding tolerant**: trailing bytes from a fixed read buffer never
//!   match as a field

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::calculate_checksum;
pub use decoder::{
    contains_msg_type, display_message, fields, get_tag_value, msg_types, tag_values,
    trim_padding,
};
pub use encoder::{Encoder, StandardHeader, build_header, finalize};
