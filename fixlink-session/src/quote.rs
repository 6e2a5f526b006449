/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Market data operations of the quote channel.

use crate::channel::Quote;
use crate::session::{FixSession, rejection_reason};
use crate::state::SessionStatus;
use fixlink_core::error::{DecodeError, Result};
use fixlink_core::field::{FieldRef, tags};
use fixlink_core::message::MsgType;
use fixlink_core::types::{MarketDepth, MdEntryType, MdUpdateType, SubscriptionRequestType};
use fixlink_tagvalue::decoder::{msg_types, tag_values};
use fixlink_tagvalue::encoder::Encoder;
use serde::Serialize;
use smallvec::SmallVec;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Best bid and offer for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopOfBook {
    /// Bid price (first MDEntryPx).
    pub bid: f64,
    /// Offer price (second MDEntryPx).
    pub ask: f64,
}

impl<S> FixSession<Quote, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Requests the current spot bid and offer for `symbol_id`.
    ///
    /// Each call sends a fresh MarketDataRequest and reads one response.
    ///
    /// # Returns
    /// `Ok(None)` if the response is not a snapshot or incremental refresh,
    /// for example a MarketDataRequestReject.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless logged in,
    /// `DecodeError` if the response lacks two numeric prices, or a transport
    /// error, which also closes the session.
    pub async fn request_prices(&mut self, symbol_id: u64) -> Result<Option<TopOfBook>> {
        self.status().require(SessionStatus::LoggedIn)?;

        let response = self
            .request(MsgType::MarketDataRequest, market_data_request(symbol_id))
            .await?;

        let accepted = response.framing_error.is_none()
            && msg_types(&response.raw).any(|msg_type| msg_type.is_market_data());
        if !accepted {
            let reason = rejection_reason(&response);
            warn!(symbol_id, %reason, "no market data");
            self.log_mut()
                .record_error(format!("market data for {symbol_id} not accepted: {reason}"));
            return Ok(None);
        }

        match top_of_book(&response.raw) {
            Ok(prices) => {
                debug!(symbol_id, bid = prices.bid, ask = prices.ask, "prices");
                Ok(Some(prices))
            }
            Err(err) => {
                self.log_mut()
                    .record_error(format!("market data for {symbol_id}: {err}"));
                Err(err.into())
            }
        }
    }
}

/// Builds the MarketDataRequest body for a spot bid/offer subscription.
///
/// The symbol id doubles as MDReqID, so only one request per symbol may be
/// outstanding at a time.
#[must_use]
pub fn market_data_request(symbol_id: u64) -> Encoder {
    let mut body = Encoder::new();
    body.put_uint(tags::MD_REQ_ID, symbol_id);
    body.put_char(
        tags::SUBSCRIPTION_REQUEST_TYPE,
        SubscriptionRequestType::SnapshotPlusUpdates.as_char(),
    );
    body.put_char(tags::MARKET_DEPTH, MarketDepth::Spot.as_char());
    body.put_char(tags::MD_UPDATE_TYPE, MdUpdateType::Incremental.as_char());
    body.put_uint(tags::NO_MD_ENTRY_TYPES, 2);
    body.put_char(tags::MD_ENTRY_TYPE, MdEntryType::Bid.as_char());
    body.put_char(tags::MD_ENTRY_TYPE, MdEntryType::Offer.as_char());
    body.put_uint(tags::NO_RELATED_SYM, 1);
    body.put_uint(tags::SYMBOL, symbol_id);
    body
}

/// Reads bid and ask from the first two MDEntryPx (270) fields.
///
/// # Errors
/// Returns `DecodeError::MissingRequiredField` if fewer than two prices are
/// present, `DecodeError::InvalidFieldValue` if one is not a number.
pub fn top_of_book(raw: &[u8]) -> std::result::Result<TopOfBook, DecodeError> {
    let prices: SmallVec<[&str; 2]> = tag_values(raw, tags::MD_ENTRY_PX).take(2).collect();
    let [bid, ask] = prices[..] else {
        return Err(DecodeError::MissingRequiredField {
            tag: tags::MD_ENTRY_PX,
        });
    };
    Ok(TopOfBook {
        bid: parse_price(bid)?,
        ask: parse_price(ask)?,
    })
}

fn parse_price(value: &str) -> std::result::Result<f64, DecodeError> {
    FieldRef::new(tags::MD_ENTRY_PX, value.as_bytes()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::QuoteChannel;
    use crate::log::LogEntry;
    use crate::testing::{config, counterparty, reply};
    use bytes::Bytes;
    use fixlink_core::error::FixError;
    use fixlink_core::types::SeqNum;
    use fixlink_tagvalue::decoder::{fields, get_tag_value};
    use fixlink_transport::ReadMode;
    use tokio::io::duplex;

    const SNAPSHOT_BODY: &str = "55=1\x01268=2\x01269=0\x01270=1.10500\x01269=1\x01270=1.10520\x01";

    #[test]
    fn test_market_data_request_layout() {
        let body = market_data_request(1);
        let order: Vec<u32> = fields(body.body()).map(|f| f.tag).collect();
        assert_eq!(order, vec![262, 263, 264, 265, 267, 269, 269, 146, 55]);
        assert_eq!(
            body.body(),
            b"262=1\x01263=1\x01264=1\x01265=1\x01267=2\x01269=0\x01269=1\x01146=1\x0155=1\x01"
        );
    }

    #[test]
    fn test_top_of_book() {
        let raw = reply(&MsgType::MarketDataSnapshotFullRefresh, SNAPSHOT_BODY);
        let prices = top_of_book(&raw).unwrap();
        assert_eq!(prices.bid, 1.10500);
        assert_eq!(prices.ask, 1.10520);
    }

    #[test]
    fn test_top_of_book_needs_two_prices() {
        let raw = reply(&MsgType::MarketDataIncrementalRefresh, "270=1.10500\x01");
        assert_eq!(
            top_of_book(&raw),
            Err(DecodeError::MissingRequiredField { tag: 270 })
        );
    }

    #[test]
    fn test_top_of_book_rejects_non_numeric() {
        let raw = reply(
            &MsgType::MarketDataSnapshotFullRefresh,
            "270=1.10500\x01270=n/a\x01",
        );
        assert!(matches!(
            top_of_book(&raw),
            Err(DecodeError::InvalidFieldValue { tag: 270, .. })
        ));
    }

    #[tokio::test]
    async fn test_request_prices_snapshot() {
        let (client, server) = duplex(4096);
        let script = vec![
            Some(reply(&MsgType::Logon, "")),
            Some(reply(&MsgType::MarketDataSnapshotFullRefresh, SNAPSHOT_BODY)),
            Some(reply(&MsgType::MarketDataIncrementalRefresh, SNAPSHOT_BODY)),
        ];
        let peer = tokio::spawn(counterparty(server, script));

        let mut session = QuoteChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(session.logon().await.unwrap());
        let expected = TopOfBook {
            bid: 1.10500,
            ask: 1.10520,
        };
        assert_eq!(session.request_prices(1).await.unwrap(), Some(expected));
        assert_eq!(session.request_prices(1).await.unwrap(), Some(expected));
        assert_eq!(session.seq_num(), SeqNum::new(4));

        drop(session);
        let requests = peer.await.unwrap();
        assert_eq!(get_tag_value(&requests[1], tags::MSG_TYPE, 0), Some("V"));
        assert_eq!(get_tag_value(&requests[1], tags::MSG_SEQ_NUM, 0), Some("2"));
        assert_eq!(get_tag_value(&requests[2], tags::MSG_SEQ_NUM, 0), Some("3"));
    }

    #[tokio::test]
    async fn test_request_prices_reads_after_its_request() {
        let (client, server) = duplex(4096);
        let snapshot = reply(&MsgType::MarketDataSnapshotFullRefresh, SNAPSHOT_BODY);
        let update = reply(
            &MsgType::MarketDataIncrementalRefresh,
            "270=1.10400\x01270=1.10410\x01",
        );
        let fresh = reply(
            &MsgType::MarketDataSnapshotFullRefresh,
            "270=1.10600\x01270=1.10620\x01",
        );
        let script = vec![
            Some(reply(&MsgType::Logon, "")),
            Some([snapshot, update.clone()].concat()),
            Some(fresh),
        ];
        let peer = tokio::spawn(counterparty(server, script));

        let mut session = QuoteChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(session.logon().await.unwrap());
        let first = session.request_prices(1).await.unwrap().unwrap();
        assert_eq!(first.bid, 1.10500);

        let second = session.request_prices(1).await.unwrap().unwrap();
        assert_eq!(second.bid, 1.10600);
        assert_eq!(second.ask, 1.10620);

        // the update is logged as received ahead of the second request
        let received: Vec<&Bytes> = session.log().received().collect();
        assert_eq!(received.len(), 4);
        assert_eq!(&received[2][..], &update[..]);
        let entries = session.log().entries();
        assert!(matches!(entries[4], LogEntry::Received(_)));
        assert!(matches!(entries[5], LogEntry::Sent(_)));

        drop(session);
        peer.await.unwrap();
    }

    #[test]
    fn test_market_data_marker_without_trailer() {
        assert!(msg_types(b"35=X").any(|t| t.is_market_data()));
        assert!(!msg_types(b"8=FIX.4.4\x0135=Y\x01").any(|t| t.is_market_data()));
    }

    #[tokio::test]
    async fn test_request_prices_reject_is_no_data() {
        let (client, server) = duplex(4096);
        let script = vec![
            Some(reply(&MsgType::Logon, "")),
            Some(reply(
                &MsgType::MarketDataRequestReject,
                "262=1\x0158=unknown symbol\x01",
            )),
        ];
        let peer = tokio::spawn(counterparty(server, script));

        let mut session = QuoteChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(session.logon().await.unwrap());
        assert_eq!(session.request_prices(1).await.unwrap(), None);
        assert!(session.is_logged_in());
        assert_eq!(
            session.log().errors().collect::<Vec<_>>(),
            vec!["market data for 1 not accepted: unknown symbol"]
        );

        drop(session);
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_prices_parse_failure() {
        let (client, server) = duplex(4096);
        let script = vec![
            Some(reply(&MsgType::Logon, "")),
            Some(reply(&MsgType::MarketDataSnapshotFullRefresh, "55=1\x01")),
        ];
        let peer = tokio::spawn(counterparty(server, script));

        let mut session = QuoteChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(session.logon().await.unwrap());
        let err = session.request_prices(1).await.unwrap_err();
        assert!(matches!(
            err,
            FixError::Decode(DecodeError::MissingRequiredField { tag: 270 })
        ));
        assert!(session.is_logged_in());
        assert_eq!(session.log().errors().count(), 1);

        drop(session);
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_prices_requires_logon() {
        let (client, _server) = duplex(64);
        let mut session = QuoteChannel::new(config(ReadMode::Framed));
        session.attach(client).unwrap();
        assert!(session.request_prices(1).await.is_err());
        assert_eq!(session.seq_num(), SeqNum::new(1));
    }
}
