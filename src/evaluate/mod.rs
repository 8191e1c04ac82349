//! Certificate evaluation.
//!
//! Turns a fetched [`CertificateInfo`] into exactly one [`ScanVerdict`]. The
//! checks run in a fixed order and the first failing check decides the
//! verdict:
//!
//! 1. validity window (`not_before <= now <= not_after`, both inclusive)
//! 2. hostname against the SANs (subject CN only when there are no DNS SANs)
//! 3. chain of trust against the configured root store
//! 4. protocol version and cipher strength
//!
//! Evaluation is pure: no I/O and the same inputs always give the same verdict.

mod hostname;

use chrono::{DateTime, Utc};

use crate::config::{EXPIRY_WARNING_DAYS, WEAK_CIPHER_MARKERS};
use crate::models::{CertificateInfo, ChainTrust, ScanVerdict, Verdict};

pub use hostname::{hostname_matches, hostname_matches_any};

/// Evaluates a certificate for `requested_hostname` at instant `now`.
pub fn evaluate(
    cert: &CertificateInfo,
    requested_hostname: &str,
    now: DateTime<Utc>,
) -> ScanVerdict {
    if now < cert.not_before {
        return ScanVerdict::new(
            Verdict::NotYetValid,
            format!("certificate not valid before {}", cert.not_before.to_rfc3339()),
        );
    }
    if now > cert.not_after {
        return ScanVerdict::new(
            Verdict::Expired,
            format!(
                "certificate expired {} ({} days ago)",
                cert.not_after.to_rfc3339(),
                (now - cert.not_after).num_days()
            ),
        );
    }

    if !certificate_covers(cert, requested_hostname) {
        return ScanVerdict::new(
            Verdict::HostnameMismatch,
            format!(
                "{requested_hostname} not covered by certificate names [{}]",
                presented_names(cert).join(", ")
            ),
        );
    }

    if let ChainTrust::Untrusted(reason) = &cert.chain_trust {
        return ScanVerdict::new(
            Verdict::UntrustedChain,
            format!("chain not anchored in a trusted root: {reason}"),
        );
    }

    if let Some(reason) = protocol_weakness(&cert.tls_version, &cert.cipher_suite) {
        return ScanVerdict::new(Verdict::WeakProtocol, reason);
    }

    let days_left = (cert.not_after - now).num_days();
    let detail = if days_left < EXPIRY_WARNING_DAYS {
        format!("valid, expires soon (in {days_left} days)")
    } else {
        format!("valid, expires in {days_left} days")
    };
    ScanVerdict::new(Verdict::Valid, detail)
}

fn certificate_covers(cert: &CertificateInfo, hostname: &str) -> bool {
    hostname_matches_any(hostname, &cert.subject_alternative_names)
        || (!has_dns_san(cert)
            && cert
                .common_name
                .as_deref()
                .is_some_and(|cn| hostname_matches(hostname, cn)))
}

/// IP SANs are stored as their textual address; anything else is a DNS name.
fn has_dns_san(cert: &CertificateInfo) -> bool {
    cert.subject_alternative_names
        .iter()
        .any(|san| san.parse::<std::net::IpAddr>().is_err())
}

fn presented_names(cert: &CertificateInfo) -> Vec<String> {
    let mut names = cert.subject_alternative_names.clone();
    if !has_dns_san(cert) {
        names.extend(cert.common_name.iter().cloned());
    }
    names
}

/// Returns a reason when the negotiated parameters are below TLS 1.2 or the
/// cipher suite is on the deny-list.
fn protocol_weakness(tls_version: &str, cipher_suite: &str) -> Option<String> {
    if !is_acceptable_version(tls_version) {
        return Some(format!("protocol {tls_version} is older than TLS 1.2"));
    }
    let upper = cipher_suite.to_ascii_uppercase();
    WEAK_CIPHER_MARKERS
        .iter()
        .find(|marker| upper.contains(*marker))
        .map(|marker| format!("cipher suite {cipher_suite} uses {marker}"))
}

/// Accepts the version names rustls reports (`TLSv1_2`, `TLSv1_3`) and the
/// dotted forms (`TLS 1.2`, `TLSv1.3`).
fn is_acceptable_version(tls_version: &str) -> bool {
    let compact: String = tls_version
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();
    matches!(compact.as_str(), "TLSV12" | "TLSV13" | "TLS12" | "TLS13")
}
