//! Certificate verifier that records the chain-of-trust outcome instead of
//! aborting the handshake.
//!
//! Expired, untrusted and mismatched certificates still have to be inspected,
//! so `verify_server_cert` always lets the handshake continue. The trust
//! decision made against the configured root store is kept in a shared slot
//! and read back once the handshake completes. Handshake signatures are still
//! checked with the crypto provider's algorithms.

use std::sync::{Arc, Mutex};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{DigitallySignedStruct, Error as RustlsError, RootCertStore, SignatureScheme};

use crate::models::ChainTrust;

/// Shared slot the verifier writes its trust decision into.
pub(crate) type TrustSlot = Arc<Mutex<Option<ChainTrust>>>;

#[derive(Debug)]
pub(crate) struct RecordingVerifier {
    roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
    outcome: TrustSlot,
}

impl RecordingVerifier {
    pub(crate) fn new(
        roots: Arc<RootCertStore>,
        provider: Arc<CryptoProvider>,
        outcome: TrustSlot,
    ) -> Self {
        Self {
            roots,
            provider,
            outcome,
        }
    }

    fn chain_trust(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> ChainTrust {
        let parsed = match ParsedCertificate::try_from(end_entity) {
            Ok(parsed) => parsed,
            Err(e) => return ChainTrust::Untrusted(format!("{e}")),
        };
        match rustls::client::verify_server_cert_signed_by_trust_anchor(
            &parsed,
            &self.roots,
            intermediates,
            now,
            self.provider.signature_verification_algorithms.all,
        ) {
            Ok(()) => ChainTrust::Trusted,
            Err(e) => ChainTrust::Untrusted(format!("{e}")),
        }
    }
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        let trust = self.chain_trust(end_entity, intermediates, now);
        if let Ok(mut slot) = self.outcome.lock() {
            *slot = Some(trust);
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(slot: TrustSlot) -> RecordingVerifier {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        RecordingVerifier::new(
            Arc::new(roots),
            Arc::new(rustls::crypto::ring::default_provider()),
            slot,
        )
    }

    #[test]
    fn test_unparseable_certificate_is_recorded_as_untrusted() {
        let slot: TrustSlot = Arc::new(Mutex::new(None));
        let v = verifier(Arc::clone(&slot));
        let garbage = CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00]);
        let server_name = ServerName::try_from("example.com").expect("valid name");

        let result = v.verify_server_cert(&garbage, &[], &server_name, &[], UnixTime::now());
        assert!(result.is_ok(), "handshake must be allowed to continue");

        let recorded = slot.lock().expect("lock").clone();
        assert!(matches!(recorded, Some(ChainTrust::Untrusted(_))));
    }

    #[test]
    fn test_supported_schemes_not_empty() {
        let slot: TrustSlot = Arc::new(Mutex::new(None));
        assert!(!verifier(slot).supported_verify_schemes().is_empty());
    }
}
