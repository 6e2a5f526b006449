/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session configuration.
//!
//! A [`SessionConfig`] is built once per channel with
//! [`SessionConfigBuilder`] and never changes afterwards.

use fixlink_core::error::SessionError;
use fixlink_core::types::{COMP_ID_MAX_LEN, CompId};
use fixlink_transport::{CertificatePolicy, ReadMode, TransportOptions};
use std::fmt;
use std::time::Duration;

/// Default TargetCompID of the counterparty.
pub const DEFAULT_TARGET_COMP_ID: &str = "CSERVER";

/// Default BeginString.
pub const DEFAULT_BEGIN_STRING: &str = "FIX.4.4";

/// Logon credentials (tags 553 and 554).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one FIX channel.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// FIX host name, also used as the TLS server name.
    pub host: String,
    /// Port override; the channel kind's port is used when `None`.
    pub port: Option<u16>,
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56).
    pub target_comp_id: CompId,
    /// Logon credentials.
    pub credentials: Credentials,
    /// FIX version BeginString (tag 8).
    pub begin_string: String,
    /// Heartbeat interval announced on logon (tag 108).
    pub heartbeat_interval: Duration,
    /// Bound on each response read.
    pub read_timeout: Duration,
    /// Pause before the read in [`ReadMode::SingleRead`].
    pub settle_delay: Duration,
    /// Response read strategy.
    pub read_mode: ReadMode,
    /// Receive buffer size for [`ReadMode::SingleRead`].
    pub receive_buffer_size: usize,
    /// Largest accepted framed response.
    pub max_message_size: usize,
    /// Server certificate validation policy.
    pub certificate_policy: CertificatePolicy,
}

impl SessionConfig {
    /// Returns a builder with every optional field at its default.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Returns the heartbeat interval in seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }

    /// Returns the transport options derived from this configuration.
    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            read_timeout: self.read_timeout,
            settle_delay: self.settle_delay,
            read_mode: self.read_mode,
            receive_buffer_size: self.receive_buffer_size,
            max_message_size: self.max_message_size,
        }
    }
}

/// Returns the account number encoded in a sender CompID.
///
/// This is the text after the last `.`, or the whole id when it has none.
///
/// # Examples
/// ```
/// use fixlink_session::config::account_from_comp_id;
///
/// assert_eq!(account_from_comp_id("demo.broker.3000001"), "3000001");
/// assert_eq!(account_from_comp_id("3000001"), "3000001");
/// ```
#[must_use]
pub fn account_from_comp_id(sender_comp_id: &str) -> &str {
    sender_comp_id
        .rsplit_once('.')
        .map_or(sender_comp_id, |(_, account)| account)
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    sender_comp_id: Option<String>,
    target_comp_id: String,
    username: Option<String>,
    password: Option<String>,
    begin_string: String,
    heartbeat_interval: Duration,
    read_timeout: Duration,
    settle_delay: Duration,
    read_mode: ReadMode,
    receive_buffer_size: usize,
    max_message_size: usize,
    certificate_policy: CertificatePolicy,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        let transport = TransportOptions::default();
        Self {
            host: None,
            port: None,
            sender_comp_id: None,
            target_comp_id: DEFAULT_TARGET_COMP_ID.to_string(),
            username: None,
            password: None,
            begin_string: DEFAULT_BEGIN_STRING.to_string(),
            heartbeat_interval: Duration::from_secs(30),
            read_timeout: transport.read_timeout,
            settle_delay: transport.settle_delay,
            read_mode: transport.read_mode,
            receive_buffer_size: transport.receive_buffer_size,
            max_message_size: transport.max_message_size,
            certificate_policy: CertificatePolicy::default(),
        }
    }
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the FIX host name.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Overrides the channel port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: impl Into<String>) -> Self {
        self.sender_comp_id = Some(id.into());
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: impl Into<String>) -> Self {
        self.target_comp_id = id.into();
        self
    }

    /// Sets the logon username.
    ///
    /// When unset, the account number is taken from the sender CompID.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the logon password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the FIX version.
    #[must_use]
    pub fn begin_string(mut self, version: impl Into<String>) -> Self {
        self.begin_string = version.into();
        self
    }

    /// Sets the heartbeat interval announced on logon.
    #[must_use]
    pub const fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the response read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the settle delay used by [`ReadMode::SingleRead`].
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the response read strategy.
    #[must_use]
    pub const fn read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// Sets the receive buffer size used by [`ReadMode::SingleRead`].
    #[must_use]
    pub const fn receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    /// Sets the largest accepted framed response.
    #[must_use]
    pub const fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the server certificate validation policy.
    #[must_use]
    pub const fn certificate_policy(mut self, policy: CertificatePolicy) -> Self {
        self.certificate_policy = policy;
        self
    }

    /// Validates the settings and builds the configuration.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if a required field is missing
    /// or empty, a value contains the SOH byte, a CompID is longer than
    /// 32 bytes, or a buffer size is zero.
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        let host = required("host", self.host)?;
        let sender = required("sender comp id", self.sender_comp_id)?;
        let password = required("password", self.password)?;
        let username = match self.username {
            Some(username) => username,
            None => account_from_comp_id(&sender).to_string(),
        };
        let username = required("username", Some(username))?;
        let begin_string = required("begin string", Some(self.begin_string))?;

        if self.receive_buffer_size == 0 || self.max_message_size == 0 {
            return Err(SessionError::Configuration(
                "buffer sizes must be greater than zero".to_string(),
            ));
        }

        Ok(SessionConfig {
            host,
            port: self.port,
            sender_comp_id: comp_id("sender comp id", &sender)?,
            target_comp_id: comp_id("target comp id", &self.target_comp_id)?,
            credentials: Credentials::new(username, password),
            begin_string,
            heartbeat_interval: self.heartbeat_interval,
            read_timeout: self.read_timeout,
            settle_delay: self.settle_delay,
            read_mode: self.read_mode,
            receive_buffer_size: self.receive_buffer_size,
            max_message_size: self.max_message_size,
            certificate_policy: self.certificate_policy,
        })
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, SessionError> {
    match value {
        None => Err(SessionError::Configuration(format!("{name} is required"))),
        Some(v) if v.is_empty() => Err(SessionError::Configuration(format!(
            "{name} must not be empty"
        ))),
        Some(v) if v.contains('\u{1}') => Err(SessionError::Configuration(format!(
            "{name} must not contain the SOH byte"
        ))),
        Some(v) => Ok(v),
    }
}

fn comp_id(name: &str, value: &str) -> Result<CompId, SessionError> {
    let value = required(name, Some(value.to_string()))?;
    CompId::new(&value).ok_or_else(|| {
        SessionError::Configuration(format!("{name} exceeds {COMP_ID_MAX_LEN} bytes"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> SessionConfigBuilder {
        SessionConfig::builder()
            .host("demo.ctraderapi.com")
            .sender_comp_id("demo.broker.3000001")
            .password("secret")
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.host, "demo.ctraderapi.com");
        assert_eq!(config.port, None);
        assert_eq!(config.target_comp_id.as_str(), "CSERVER");
        assert_eq!(config.begin_string, "FIX.4.4");
        assert_eq!(config.heartbeat_interval_secs(), 30);
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_millis(100));
        assert_eq!(config.read_mode, ReadMode::Framed);
        assert_eq!(config.receive_buffer_size, 1024);
        assert_eq!(config.certificate_policy, CertificatePolicy::Verify);
    }

    #[test]
    fn test_username_derived_from_sender_comp_id() {
        let config = builder().build().unwrap();
        assert_eq!(config.credentials.username(), "3000001");

        let config = builder().username("trader").build().unwrap();
        assert_eq!(config.credentials.username(), "trader");
    }

    #[test]
    fn test_account_from_comp_id() {
        assert_eq!(account_from_comp_id("demo.broker.3000001"), "3000001");
        assert_eq!(account_from_comp_id("plain"), "plain");
        assert_eq!(account_from_comp_id("trailing."), "");
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let err = SessionConfig::builder()
            .sender_comp_id("a.b")
            .password("p")
            .build()
            .unwrap_err();
        assert_eq!(err, SessionError::Configuration("host is required".to_string()));

        let err = builder().password("").build().unwrap_err();
        assert_eq!(
            err,
            SessionError::Configuration("password must not be empty".to_string())
        );

        // "trailing." derives an empty username
        assert!(builder().sender_comp_id("trailing.").build().is_err());
    }

    #[test]
    fn test_soh_is_rejected() {
        let err = builder().password("se\u{1}cret").build().unwrap_err();
        assert_eq!(
            err,
            SessionError::Configuration("password must not contain the SOH byte".to_string())
        );
        assert!(builder().target_comp_id("CSER\u{1}VER").build().is_err());
    }

    #[test]
    fn test_comp_id_length_is_checked() {
        let err = builder().sender_comp_id("x".repeat(33)).build().unwrap_err();
        assert_eq!(
            err,
            SessionError::Configuration("sender comp id exceeds 32 bytes".to_string())
        );
    }

    #[test]
    fn test_password_is_redacted() {
        let config = builder().build().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_transport_options() {
        let config = builder()
            .read_mode(ReadMode::SingleRead)
            .receive_buffer_size(2048)
            .build()
            .unwrap();
        let options = config.transport_options();
        assert_eq!(options.read_mode, ReadMode::SingleRead);
        assert_eq!(options.receive_buffer_size, 2048);
        assert_eq!(options.read_timeout, Duration::from_secs(10));
    }
}
