/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Order entry operations of the trade channel.

use crate::channel::Trade;
use crate::session::FixSession;
use crate::state::SessionStatus;
use bytes::Bytes;
use fixlink_core::error::Result;
use fixlink_core::field::tags;
use fixlink_core::message::MsgType;
use fixlink_core::types::{OrdType, SeqNum, Side, TimeInForce, Timestamp};
use fixlink_tagvalue::encoder::Encoder;
use rust_decimal::Decimal;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

/// An order that was sent, with the raw response read after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// ClOrdID (11) sent with the order.
    pub cl_ord_id: String,
    /// Raw response, usually an ExecutionReport. Not interpreted.
    pub response: Bytes,
}

impl<S> FixSession<Trade, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends an immediate-or-cancel market order.
    ///
    /// The ClOrdID is the sequence number the order is sent with, so ids
    /// restart whenever a new session starts at sequence 1.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless logged in, or a transport
    /// error, which also closes the session.
    pub async fn place_market_order(
        &mut self,
        side: Side,
        symbol_id: u64,
        volume: Decimal,
    ) -> Result<PlacedOrder> {
        self.status().require(SessionStatus::LoggedIn)?;

        let cl_ord_id = self.seq_num();
        let body = new_order_single(cl_ord_id, side, symbol_id, volume, Timestamp::now());
        let response = self.request(MsgType::NewOrderSingle, body).await?;

        info!(cl_ord_id = cl_ord_id.value(), %side, symbol_id, %volume, "market order sent");
        Ok(PlacedOrder {
            cl_ord_id: cl_ord_id.to_string(),
            response: response.raw,
        })
    }
}

/// Builds the NewOrderSingle body for a market IOC order.
#[must_use]
pub fn new_order_single(
    cl_ord_id: SeqNum,
    side: Side,
    symbol_id: u64,
    volume: Decimal,
    transact_time: Timestamp,
) -> Encoder {
    let mut body = Encoder::new();
    body.put_uint(tags::CL_ORD_ID, cl_ord_id.value());
    body.put_uint(tags::SYMBOL, symbol_id);
    body.put_char(tags::SIDE, side.as_char());
    body.put_str(tags::TRANSACT_TIME, &transact_time.format_secs());
    body.put_str(tags::ORDER_QTY, &volume.normalize().to_string());
    body.put_char(tags::ORD_TYPE, OrdType::Market.as_char());
    body.put_char(tags::TIME_IN_FORCE, TimeInForce::ImmediateOrCancel.as_char());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TradeChannel;
    use crate::testing::{config, counterparty, reply};
    use fixlink_tagvalue::decoder::{fields, get_tag_value};
    use fixlink_transport::ReadMode;
    use tokio::io::duplex;

    #[test]
    fn test_new_order_single_layout() {
        let body = new_order_single(
            SeqNum::new(2),
            Side::Buy,
            1,
            Decimal::from(100_000),
            Timestamp::from_millis(1_614_834_367_890),
        );
        assert_eq!(
            body.body(),
            b"11=2\x0155=1\x0154=1\x0160=20210304-05:06:07\x0138=100000\x0140=1\x0159=3\x01"
        );
    }

    #[test]
    fn test_volume_is_normalized() {
        let body = new_order_single(
            SeqNum::new(1),
            Side::Sell,
            7,
            Decimal::new(15_000_000, 2),
            Timestamp::from_millis(0),
        );
        let qty = fields(body.body()).find(|f| f.tag == tags::ORDER_QTY).unwrap();
        assert_eq!(qty.value, b"150000");
        let side = fields(body.body()).find(|f| f.tag == tags::SIDE).unwrap();
        assert_eq!(side.value, b"2");
    }

    #[tokio::test]
    async fn test_place_market_order() {
        let (client, server) = duplex(4096);
        let report = reply(&MsgType::ExecutionReport, "11=2\x0139=2\x01");
        let script = vec![Some(reply(&MsgType::Logon, "")), Some(report.clone())];
        let peer = tokio::spawn(counterparty(server, script));

        let mut session = TradeChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(session.logon().await.unwrap());

        let before = session.seq_num();
        let placed = session
            .place_market_order(Side::Buy, 1, Decimal::from(100_000))
            .await
            .unwrap();
        assert_eq!(placed.cl_ord_id, before.to_string());
        assert_eq!(placed.cl_ord_id, "2");
        assert_eq!(&placed.response[..], &report[..]);
        assert_eq!(session.seq_num(), SeqNum::new(3));

        drop(session);
        let requests = peer.await.unwrap();
        let order = &requests[1];
        assert_eq!(get_tag_value(order, tags::MSG_TYPE, 0), Some("D"));
        assert_eq!(get_tag_value(order, tags::MSG_SEQ_NUM, 0), Some("2"));
        assert_eq!(get_tag_value(order, tags::CL_ORD_ID, 0), Some("2"));
        assert_eq!(get_tag_value(order, tags::SYMBOL, 0), Some("1"));
        assert_eq!(get_tag_value(order, tags::SIDE, 0), Some("1"));
        assert_eq!(get_tag_value(order, tags::ORDER_QTY, 0), Some("100000"));
        assert_eq!(get_tag_value(order, tags::ORD_TYPE, 0), Some("1"));
        assert_eq!(get_tag_value(order, tags::TIME_IN_FORCE, 0), Some("3"));
        assert_eq!(get_tag_value(order, tags::SENDER_SUB_ID, 0), Some("TRADE"));
        assert_eq!(get_tag_value(order, tags::TARGET_SUB_ID, 0), Some("TRADE"));
    }

    #[tokio::test]
    async fn test_place_market_order_requires_logon() {
        let (client, _server) = duplex(64);
        let mut session = TradeChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(
            session
                .place_market_order(Side::Sell, 1, Decimal::ONE)
                .await
                .is_err()
        );
        assert!(session.log().is_empty());
    }
}
