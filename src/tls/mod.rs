//! TLS certificate fetching.
//!
//! This module connects to TLS endpoints and captures certificate details:
//! - Certificate subject, issuer and serial number
//! - Validity period (not before/after dates)
//! - Subject Alternative Names (SANs)
//! - Signature algorithm and presented chain length
//! - Negotiated TLS version and cipher suite
//! - Chain-of-trust outcome against the configured root store
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod extract;
mod verifier;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error_handling::{FetchError, InitializationError};
use crate::models::{CertificateInfo, ChainTrust};

use extract::parse_leaf;
use verifier::{RecordingVerifier, TrustSlot};

/// Time allowed for sending `close_notify` before the socket is dropped.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Fetches certificate information from a host.
///
/// The batch scanner only talks to this trait, so tests can substitute a
/// fetcher that never touches the network.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Connects to `host:port`, performs a TLS handshake with SNI set to
    /// `host` and returns the presented certificate details.
    ///
    /// `timeout` bounds each network stage (resolution, TCP connect, TLS
    /// handshake) separately. The connection is closed before returning.
    async fn fetch(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<CertificateInfo, FetchError>;
}

/// Production fetcher backed by tokio-rustls.
pub struct TlsFetcher {
    roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
}

impl TlsFetcher {
    /// Creates a fetcher that judges chains against `roots`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::TlsConfigError` if the root store is empty.
    pub fn new(roots: Arc<RootCertStore>) -> Result<Self, InitializationError> {
        if roots.is_empty() {
            return Err(InitializationError::TlsConfigError(
                "root store contains no trust anchors".to_string(),
            ));
        }
        Ok(Self {
            roots,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        })
    }

    fn client_config(&self, outcome: TrustSlot) -> Result<ClientConfig, FetchError> {
        let verifier = RecordingVerifier::new(
            Arc::clone(&self.roots),
            Arc::clone(&self.provider),
            outcome,
        );
        let config = ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| FetchError::HandshakeFailed(format!("TLS configuration error: {e}")))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();
        Ok(config)
    }
}

#[async_trait]
impl CertificateFetcher for TlsFetcher {
    async fn fetch(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<CertificateInfo, FetchError> {
        debug!("Attempting to get TLS info for {host}:{port}");

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| FetchError::HandshakeFailed(format!("invalid server name {host}: {e}")))?;

        let addrs = resolve(host, port, timeout).await?;

        let sock = match tokio::time::timeout(timeout, TcpStream::connect(&addrs[..])).await {
            Ok(Ok(sock)) => sock,
            Ok(Err(e)) => {
                debug!("Failed to connect to {host}:{port} - {e}");
                return Err(FetchError::ConnectionRefused {
                    host: host.to_string(),
                    port,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    stage: "TCP connect",
                    limit: timeout,
                })
            }
        };

        let outcome: TrustSlot = Arc::new(Mutex::new(None));
        let connector = TlsConnector::from(Arc::new(self.client_config(Arc::clone(&outcome))?));

        let mut tls_stream =
            match tokio::time::timeout(timeout, connector.connect(server_name, sock)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    debug!("TLS handshake failed for {host}:{port}: {e}");
                    return Err(FetchError::HandshakeFailed(e.to_string()));
                }
                Err(_) => {
                    return Err(FetchError::Timeout {
                        stage: "TLS handshake",
                        limit: timeout,
                    })
                }
            };

        let (tls_version, cipher_suite, chain) = {
            let conn = tls_stream.get_ref().1;
            let tls_version = conn
                .protocol_version()
                .map(|v| format!("{v:?}"))
                .unwrap_or_else(|| "Unknown".to_string());
            let cipher_suite = conn
                .negotiated_cipher_suite()
                .map(|cs| format!("{:?}", cs.suite()))
                .unwrap_or_else(|| "Unknown".to_string());
            let chain: Vec<Vec<u8>> = conn
                .peer_certificates()
                .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
                .unwrap_or_default();
            (tls_version, cipher_suite, chain)
        };

        // Best-effort close_notify; the socket is dropped either way.
        let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, tls_stream.shutdown()).await;
        drop(tls_stream);

        let leaf_der = chain
            .first()
            .ok_or_else(|| FetchError::NoCertificate("peer presented no certificates".to_string()))?;
        let leaf = parse_leaf(leaf_der).map_err(FetchError::NoCertificate)?;

        let chain_trust = outcome
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .unwrap_or_else(|| ChainTrust::Untrusted("certificate was not verified".to_string()));

        info!("TLS certificate info extracted for {host}:{port}");

        Ok(CertificateInfo {
            subject: leaf.subject,
            issuer: leaf.issuer,
            serial_number: leaf.serial_number,
            not_before: leaf.not_before,
            not_after: leaf.not_after,
            subject_alternative_names: leaf.subject_alternative_names,
            common_name: leaf.common_name,
            signature_algorithm: leaf.signature_algorithm,
            chain_length: chain.len(),
            tls_version,
            cipher_suite,
            chain_trust,
        })
    }
}

/// Resolves `host:port`, failing with `DnsError` when nothing comes back.
async fn resolve(host: &str, port: u16, timeout: Duration) -> Result<Vec<SocketAddr>, FetchError> {
    match tokio::time::timeout(timeout, tokio::net::lookup_host((host, port))).await {
        Ok(Ok(addrs)) => {
            let addrs: Vec<SocketAddr> = addrs.collect();
            if addrs.is_empty() {
                Err(FetchError::DnsError {
                    host: host.to_string(),
                    message: "no addresses returned".to_string(),
                })
            } else {
                Ok(addrs)
            }
        }
        Ok(Err(e)) => Err(FetchError::DnsError {
            host: host.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(FetchError::Timeout {
            stage: "DNS resolution",
            limit: timeout,
        }),
    }
}
