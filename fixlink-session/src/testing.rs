/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Scripted in-memory counterparty for session tests.

use crate::config::SessionConfig;
use bytes::{Bytes, BytesMut};
use fixlink_core::message::MsgType;
use fixlink_core::types::{SeqNum, Timestamp};
use fixlink_tagvalue::encoder::{StandardHeader, build_header, finalize};
use fixlink_transport::{FixCodec, ReadMode};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::codec::Decoder;

/// A valid configuration with short timeouts.
pub(crate) fn config(read_mode: ReadMode) -> SessionConfig {
    SessionConfig::builder()
        .host("demo.ctraderapi.com")
        .sender_comp_id("demo.broker.3000001")
        .password("secret")
        .read_timeout(Duration::from_millis(200))
        .settle_delay(Duration::from_millis(20))
        .read_mode(read_mode)
        .build()
        .unwrap()
}

/// Builds a complete counterparty message with `body` fields.
pub(crate) fn reply(msg_type: &MsgType, body: &str) -> Vec<u8> {
    let header = StandardHeader {
        begin_string: "FIX.4.4",
        msg_type,
        sender_comp_id: "CSERVER",
        target_comp_id: "demo.broker.3000001",
        sender_sub_id: "QUOTE",
        seq_num: SeqNum::new(1),
        sending_time: Timestamp::from_millis(1_614_834_367_890),
    };
    finalize(build_header(&header, body.as_bytes())).to_vec()
}

/// Reads one client frame per script step and answers with the step's
/// reply, if any. After the script it drains the stream until the client
/// disconnects, then returns every frame it read.
pub(crate) async fn counterparty(
    mut stream: DuplexStream,
    script: Vec<Option<Vec<u8>>>,
) -> Vec<Bytes> {
    let mut codec = FixCodec::new();
    let mut buf = BytesMut::new();
    let mut requests = Vec::new();

    for step in script {
        let frame = loop {
            if let Some(frame) = codec.decode(&mut buf).unwrap() {
                break frame.freeze();
            }
            if stream.read_buf(&mut buf).await.unwrap() == 0 {
                return requests;
            }
        };
        requests.push(frame);
        if let Some(response) = step {
            stream.write_all(&response).await.unwrap();
        }
    }

    loop {
        buf.clear();
        match stream.read_buf(&mut buf).await {
            Ok(0) | Err(_) => return requests,
            Ok(_) => {}
        }
    }
}
