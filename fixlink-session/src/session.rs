/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session controller shared by both channel kinds.
//!
//! [`FixSession`] owns one transport, the outgoing sequence number and the
//! message log. Every operation takes `&mut self`, so requests on one
//! channel are strictly serialized; separate channels are independent
//! values and may be driven concurrently.

use crate::channel::{Channel, ChannelKind, Quote, Trade};
use crate::config::SessionConfig;
use crate::log::MessageLog;
use crate::state::SessionStatus;
use fixlink_core::error::{FixError, Result, SessionError, TransportError};
use fixlink_core::field::tags;
use fixlink_core::message::MsgType;
use fixlink_core::types::{SeqNum, Timestamp};
use fixlink_tagvalue::decoder::{contains_msg_type, display_message, get_tag_value};
use fixlink_tagvalue::encoder::{Encoder, StandardHeader};
use fixlink_transport::{Response, Transport, connect};
use std::marker::PhantomData;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, error, info, trace, warn};

/// Stream type of a live TLS session.
pub type TlsTcpStream = TlsStream<TcpStream>;

/// A FIX session on one channel.
///
/// `K` selects the channel kind, `S` the underlying stream.
#[derive(Debug)]
pub struct FixSession<K: Channel, S = TlsTcpStream> {
    config: SessionConfig,
    status: SessionStatus,
    seq_num: SeqNum,
    transport: Option<Transport<S>>,
    log: MessageLog,
    _kind: PhantomData<K>,
}

/// Market data session.
pub type QuoteChannel<S = TlsTcpStream> = FixSession<Quote, S>;

/// Order entry session.
pub type TradeChannel<S = TlsTcpStream> = FixSession<Trade, S>;

impl<K: Channel, S> FixSession<K, S> {
    /// Creates a session that is not connected yet.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            status: SessionStatus::NotConnected,
            seq_num: SeqNum::default(),
            transport: None,
            log: MessageLog::new(),
            _kind: PhantomData,
        }
    }

    /// Returns the channel kind.
    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        K::KIND
    }

    /// Returns the port this session connects to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.config.port.unwrap_or(K::KIND.port())
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns true once logon has been acknowledged.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.status == SessionStatus::LoggedIn
    }

    /// Returns the sequence number the next message will carry.
    #[must_use]
    pub const fn seq_num(&self) -> SeqNum {
        self.seq_num
    }

    /// Returns the message log.
    #[must_use]
    pub const fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Hands the log over to the caller and starts an empty one.
    pub fn take_log(&mut self) -> MessageLog {
        std::mem::take(&mut self.log)
    }

    pub(crate) fn log_mut(&mut self) -> &mut MessageLog {
        &mut self.log
    }
}

impl<K: Channel> FixSession<K, TlsTcpStream> {
    /// Opens the TLS connection to the configured host and channel port.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is
    /// `NotConnected`. A transport failure closes the session and is
    /// returned as `FixError::Transport`.
    pub async fn connect(&mut self) -> Result<()> {
        self.status.require(SessionStatus::NotConnected)?;
        let port = self.port();
        let opened = connect(
            &self.config.host,
            port,
            self.config.certificate_policy,
            self.config.transport_options(),
        )
        .await;

        match opened {
            Ok(transport) => {
                self.transport = Some(transport);
                self.status = SessionStatus::Connected;
                info!(channel = %K::KIND, host = %self.config.host, port, "connected");
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }
}

impl<K, S> FixSession<K, S>
where
    K: Channel,
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Attaches an already connected stream.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is
    /// `NotConnected`.
    pub fn attach(&mut self, stream: S) -> Result<()> {
        self.status.require(SessionStatus::NotConnected)?;
        self.transport = Some(Transport::new(stream, self.config.transport_options()));
        self.status = SessionStatus::Connected;
        debug!(channel = %K::KIND, "stream attached");
        Ok(())
    }

    /// Sends Logon and reports whether the counterparty acknowledged it.
    ///
    /// # Returns
    /// `Ok(true)` if the response contains a Logon MsgType, `Ok(false)` for
    /// any other response. A refused logon leaves the session `Connected`.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is
    /// `Connected`, or a transport error, which also closes the session.
    pub async fn logon(&mut self) -> Result<bool> {
        self.status.require(SessionStatus::Connected)?;

        let mut body = Encoder::new();
        body.put_uint(tags::ENCRYPT_METHOD, 0);
        body.put_uint(tags::HEART_BT_INT, self.config.heartbeat_interval_secs());
        body.put_str(tags::USERNAME, self.config.credentials.username());
        body.put_str(tags::PASSWORD, self.config.credentials.password());

        let response = self.request(MsgType::Logon, body).await?;
        if response.framing_error.is_none() && contains_msg_type(&response.raw, &MsgType::Logon) {
            self.status = SessionStatus::LoggedIn;
            info!(channel = %K::KIND, "logged on");
            return Ok(true);
        }

        let reason = rejection_reason(&response);
        warn!(channel = %K::KIND, %reason, "logon refused");
        self.log.record_error(format!("logon refused: {reason}"));
        Ok(false)
    }

    /// Sends Logout if the session is logged in, then closes it.
    ///
    /// The response is read and logged but not interpreted. Calling this in any
    /// other state does nothing.
    ///
    /// # Errors
    /// Returns a transport error if the Logout exchange fails.
    pub async fn logout(&mut self) -> Result<()> {
        if self.status != SessionStatus::LoggedIn {
            debug!(channel = %K::KIND, status = %self.status, "not logged in, logout skipped");
            return Ok(());
        }

        self.request(MsgType::Logout, Encoder::new()).await?;
        self.status = SessionStatus::Closed;
        if let Some(transport) = self.transport.take() {
            let mut stream = transport.into_inner();
            if let Err(err) = stream.shutdown().await {
                warn!(channel = %K::KIND, error = %err, "stream shutdown failed");
                self.log.record_error(format!("stream shutdown failed: {err}"));
            }
        }
        info!(channel = %K::KIND, "logged out");
        Ok(())
    }

    /// Sends a Heartbeat without waiting for a response.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless the session is
    /// `LoggedIn`, or a transport error, which also closes the session.
    pub async fn heartbeat(&mut self) -> Result<()> {
        self.status.require(SessionStatus::LoggedIn)?;
        self.transmit(MsgType::Heartbeat, Encoder::new()).await
    }

    /// Frames `body`, writes it and advances the sequence number.
    ///
    /// Frames that arrived unread since the last response are logged as
    /// received first, so a later read only sees bytes sent after `body`.
    pub(crate) async fn transmit(&mut self, msg_type: MsgType, body: Encoder) -> Result<()> {
        let unread = self.transport_mut()?.take_buffered();
        for response in &unread {
            self.record_response(response, true);
        }

        let seq_num = self.seq_num;
        let header = StandardHeader {
            begin_string: &self.config.begin_string,
            msg_type: &msg_type,
            sender_comp_id: self.config.sender_comp_id.as_str(),
            target_comp_id: self.config.target_comp_id.as_str(),
            sender_sub_id: K::KIND.sub_id(),
            seq_num,
            sending_time: Timestamp::now(),
        };
        let message = body.finish(&header);
        trace!(channel = %K::KIND, raw = %display_message(&message), "sending");

        let written = self.transport_mut()?.send(&message).await;
        if let Err(err) = written {
            return Err(self.fail(err));
        }
        self.seq_num = seq_num.next();
        debug!(channel = %K::KIND, seq = seq_num.value(), %msg_type, "sent");
        self.log.record_sent(message);
        Ok(())
    }

    /// Sends one message and reads its response.
    pub(crate) async fn request(&mut self, msg_type: MsgType, body: Encoder) -> Result<Response> {
        self.transmit(msg_type, body).await?;

        let received = self.transport_mut()?.receive().await;
        match received {
            Ok(response) => {
                self.record_response(&response, false);
                Ok(response)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn record_response(&mut self, response: &Response, unread: bool) {
        if let Some(err) = &response.framing_error {
            self.log.record_error(format!("framing error: {err}"));
        }

        let msg_type = get_tag_value(&response.raw, tags::MSG_TYPE, 0).unwrap_or("?");
        debug!(channel = %K::KIND, bytes = response.raw.len(), msg_type, unread, "received");
        trace!(channel = %K::KIND, raw = %display_message(&response.raw), "received");
        self.log.record_received(response.raw.clone());
    }

    fn transport_mut(&mut self) -> Result<&mut Transport<S>> {
        let status = self.status;
        self.transport.as_mut().ok_or_else(|| {
            FixError::Session(SessionError::InvalidState {
                expected: SessionStatus::Connected.to_string(),
                current: status.to_string(),
            })
        })
    }

    /// Records a fatal transport failure and closes the session.
    fn fail(&mut self, err: TransportError) -> FixError {
        error!(channel = %K::KIND, error = %err, "transport failure, closing session");
        self.log.record_error(err.to_string());
        self.status = SessionStatus::Closed;
        self.transport = None;
        FixError::Transport(err)
    }
}

/// Extracts a human readable reason from a non-acknowledging response.
pub(crate) fn rejection_reason(response: &Response) -> String {
    if let Some(err) = &response.framing_error {
        return format!("framing error: {err}");
    }
    let raw = &response.raw[..];
    if let Some(text) = get_tag_value(raw, tags::TEXT, 0) {
        return text.to_string();
    }
    match get_tag_value(raw, tags::MSG_TYPE, 0) {
        Some(msg_type) => format!("unexpected MsgType {msg_type}"),
        None => format!("unrecognised response: {}", display_message(raw)),
    }
}
