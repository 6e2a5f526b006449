/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! TLS client setup.
//!
//! The FIX endpoints are only reachable over TLS. [`CertificatePolicy`]
//! selects how the server certificate is checked.

use fixlink_core::error::TransportError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

/// How the server certificate is validated during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificatePolicy {
    /// Validate the chain against the platform's native root store.
    #[default]
    Verify,
    /// Accept any certificate.
    ///
    /// Only for wire-compatibility testing against a known counterparty.
    /// Never use this for real accounts.
    AcceptAny,
}

/// Builds the rustls client configuration for `policy`.
///
/// # Errors
/// Returns `TransportError::Tls` if no usable root certificate is found or
/// the protocol versions cannot be configured.
pub fn client_config(policy: CertificatePolicy) -> Result<ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    let config = match policy {
        CertificatePolicy::Verify => builder
            .with_root_certificates(native_roots()?)
            .with_no_client_auth(),
        CertificatePolicy::AcceptAny => {
            warn!("server certificate validation is disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
                .with_no_client_auth()
        }
    };
    Ok(config)
}

/// Performs the client side of the TLS handshake over `tcp`.
///
/// # Arguments
/// * `host` - Server name sent in SNI and checked against the certificate
/// * `tcp` - An established TCP connection
/// * `policy` - Certificate validation policy
///
/// # Errors
/// Returns `TransportError::Tls` on an invalid host name or a failed handshake.
pub async fn handshake(
    host: &str,
    tcp: TcpStream,
    policy: CertificatePolicy,
) -> Result<TlsStream<TcpStream>, TransportError> {
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|e| TransportError::Tls(format!("invalid server name {host}: {e}")))?;
    let connector = TlsConnector::from(Arc::new(client_config(policy)?));

    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| TransportError::Tls(e.to_string()))?;
    debug!(host, ?policy, "tls handshake complete");
    Ok(stream)
}

fn native_roots() -> Result<RootCertStore, TransportError> {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        warn!(error = %err, "failed to load a native root certificate");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    debug!(added, ignored, "loaded native root certificates");
    if roots.is_empty() {
        return Err(TransportError::Tls(
            "no native root certificates available".to_string(),
        ));
    }
    Ok(roots)
}

/// Verifier that skips chain validation but still checks handshake
/// signatures, so the session keys are bound to the presented certificate.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_verifies() {
        assert_eq!(CertificatePolicy::default(), CertificatePolicy::Verify);
    }

    #[test]
    fn test_accept_any_config_builds() {
        let config = client_config(CertificatePolicy::AcceptAny).unwrap();
        assert!(config.alpn_protocols.is_empty());
    }

    #[test]
    fn test_accept_any_supports_signature_schemes() {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = AcceptAnyCertificate(provider);
        assert!(!verifier.supported_verify_schemes().is_empty());
    }
}
