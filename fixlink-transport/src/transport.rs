/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Request/response transport over one connection.
//!
//! Every exchange is a single write optionally followed by one response
//! read. How the response is read depends on [`ReadMode`].

use crate::codec::{CodecError, FixCodec};
use crate::tls::{CertificatePolicy, handshake};
use bytes::{Bytes, BytesMut};
use fixlink_core::error::TransportError;
use fixlink_tagvalue::decoder::trim_padding;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_rustls::client::TlsStream;
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

/// How a response is read after a request has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Accumulate bytes until BodyLength plus trailer have arrived.
    #[default]
    Framed,
    /// Wait the settle delay, then perform exactly one read into a
    /// fixed-size buffer and return whatever arrived.
    ///
    /// Fragmented, late or oversized responses are truncated or missed.
    /// Kept for compatibility with counterparties and test vectors that
    /// assume this behaviour.
    SingleRead,
}

/// Timing and buffering options for a [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Upper bound on one response read.
    pub read_timeout: Duration,
    /// Pause before the read in [`ReadMode::SingleRead`].
    pub settle_delay: Duration,
    /// Response read strategy.
    pub read_mode: ReadMode,
    /// Buffer size for [`ReadMode::SingleRead`].
    pub receive_buffer_size: usize,
    /// Largest frame accepted in [`ReadMode::Framed`].
    pub max_message_size: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(100),
            read_mode: ReadMode::Framed,
            receive_buffer_size: 1024,
            max_message_size: 1024 * 1024,
        }
    }
}

/// Bytes returned by one response read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Received bytes with trailing padding removed.
    pub raw: Bytes,
    /// Set when framed reading gave up on a malformed stream; `raw` then
    /// holds everything buffered at that point.
    pub framing_error: Option<CodecError>,
}

/// One connection carrying FIX request/response exchanges.
#[derive(Debug)]
pub struct Transport<S> {
    stream: S,
    options: TransportOptions,
    codec: FixCodec,
    pending: BytesMut,
}

/// Opens a TCP connection to `host:port` and upgrades it to TLS.
///
/// Connecting and the handshake together are bounded by the configured read
/// timeout.
///
/// # Errors
/// Returns `TransportError::ConnectionFailed` if the socket cannot be
/// opened, `TransportError::Tls` if the handshake fails, and
/// `TransportError::Timeout` if either does not finish in time.
pub async fn connect(
    host: &str,
    port: u16,
    policy: CertificatePolicy,
    options: TransportOptions,
) -> Result<Transport<TlsStream<TcpStream>>, TransportError> {
    let addr = format!("{host}:{port}");
    let open = async {
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        tcp.set_nodelay(true)?;
        handshake(host, tcp, policy).await
    };

    let stream = timeout(options.read_timeout, open)
        .await
        .map_err(|_| timeout_error(options.read_timeout))??;
    debug!(%addr, "connected");
    Ok(Transport::new(stream, options))
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established stream.
    #[must_use]
    pub fn new(stream: S, options: TransportOptions) -> Self {
        let codec = FixCodec::new().with_max_message_size(options.max_message_size);
        Self {
            stream,
            options,
            codec,
            pending: BytesMut::with_capacity(options.receive_buffer_size),
        }
    }

    /// Returns the transport options.
    #[must_use]
    pub const fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Writes the whole message and flushes it.
    ///
    /// # Errors
    /// Returns `TransportError::Io` if the write fails.
    pub async fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(message).await?;
        self.stream.flush().await?;
        trace!(bytes = message.len(), "request written");
        Ok(())
    }

    /// Reads one response according to the configured [`ReadMode`].
    ///
    /// # Errors
    /// Returns `TransportError::Timeout` if nothing usable arrives in time,
    /// `TransportError::ConnectionClosed` on EOF.
    pub async fn receive(&mut self) -> Result<Response, TransportError> {
        let read_timeout = self.options.read_timeout;
        let response = match self.options.read_mode {
            ReadMode::SingleRead => {
                sleep(self.options.settle_delay).await;
                timeout(read_timeout, self.read_once()).await
            }
            ReadMode::Framed => timeout(read_timeout, self.read_frame()).await,
        };
        response.map_err(|_| timeout_error(read_timeout))?
    }

    /// Removes every complete frame still buffered from earlier reads.
    ///
    /// These arrived before the next request is written, so they can never
    /// be its response. A buffered prefix that can never form a frame is
    /// returned last with `framing_error` set. An incomplete frame stays
    /// buffered. Always empty in [`ReadMode::SingleRead`].
    pub fn take_buffered(&mut self) -> Vec<Response> {
        let mut stale = Vec::new();
        loop {
            match self.codec.decode(&mut self.pending) {
                Ok(Some(frame)) => stale.push(Response {
                    raw: frame.freeze(),
                    framing_error: None,
                }),
                Ok(None) => break,
                Err(err) => {
                    stale.push(Response {
                        raw: Bytes::copy_from_slice(trim_padding(&self.pending.split())),
                        framing_error: Some(err),
                    });
                    break;
                }
            }
        }
        if !stale.is_empty() {
            debug!(frames = stale.len(), "took unread frames before request");
        }
        stale
    }

    /// Writes `message` and, if `expect_response` is set, reads one response.
    ///
    /// Frames buffered before the write are discarded, so the response is read
    /// after the request. Call [`Transport::take_buffered`] first to keep them.
    ///
    /// # Errors
    /// Propagates errors from [`Transport::send`] and [`Transport::receive`].
    pub async fn exchange(
        &mut self,
        message: &[u8],
        expect_response: bool,
    ) -> Result<Option<Response>, TransportError> {
        self.take_buffered();
        self.send(message).await?;
        if !expect_response {
            return Ok(None);
        }
        self.receive().await.map(Some)
    }

    /// Consumes the transport and returns the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn read_once(&mut self) -> Result<Response, TransportError> {
        let mut buf = vec![0u8; self.options.receive_buffer_size];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        if n == buf.len() {
            warn!(bytes = n, "response filled the receive buffer and may be truncated");
        }
        buf.truncate(n);
        let raw = Bytes::copy_from_slice(trim_padding(&buf));
        Ok(Response {
            raw,
            framing_error: None,
        })
    }

    async fn read_frame(&mut self) -> Result<Response, TransportError> {
        loop {
            match self.codec.decode(&mut self.pending) {
                Ok(Some(frame)) => {
                    return Ok(Response {
                        raw: frame.freeze(),
                        framing_error: None,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, buffered = self.pending.len(), "response is not a valid frame");
                    let raw = Bytes::copy_from_slice(trim_padding(&self.pending.split()));
                    return Ok(Response {
                        raw,
                        framing_error: Some(err),
                    });
                }
            }

            if self.stream.read_buf(&mut self.pending).await? == 0 {
                return Err(TransportError::ConnectionClosed);
            }
        }
    }
}

fn timeout_error(elapsed: Duration) -> TransportError {
    TransportError::Timeout {
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}
