//! Certificate extraction utilities.

use chrono::{DateTime, Utc};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::time::ASN1Time;

/// Fields read from the leaf certificate.
pub(crate) struct LeafFields {
    pub subject: String,
    pub issuer: String,
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub subject_alternative_names: Vec<String>,
    pub common_name: Option<String>,
    pub signature_algorithm: String,
}

/// Parses a DER-encoded leaf certificate.
pub(crate) fn parse_leaf(der: &[u8]) -> Result<LeafFields, String> {
    let (_, cert) =
        x509_parser::parse_x509_certificate(der).map_err(|e| format!("X.509 parse error: {e}"))?;
    let tbs_cert = &cert.tbs_certificate;

    let common_name = tbs_cert
        .subject
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    Ok(LeafFields {
        subject: tbs_cert.subject.to_string(),
        issuer: tbs_cert.issuer.to_string(),
        serial_number: format_serial(tbs_cert.raw_serial()),
        not_before: asn1_to_utc(&tbs_cert.validity.not_before)?,
        not_after: asn1_to_utc(&tbs_cert.validity.not_after)?,
        subject_alternative_names: extract_certificate_sans(&cert),
        common_name,
        signature_algorithm: signature_algorithm_name(
            &cert.signature_algorithm.algorithm.to_id_string(),
        ),
    })
}

/// Extracts DNS names and IP addresses from the Subject Alternative Name
/// extension, in order. Other name types are ignored.
pub(crate) fn extract_certificate_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(ref san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                match general_name {
                    GeneralName::DNSName(dns_name) => sans.push(dns_name.to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(ip) = ip_from_bytes(bytes) {
                            sans.push(ip);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    sans
}

fn ip_from_bytes(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(std::net::Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(std::net::Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

fn asn1_to_utc(time: &ASN1Time) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| format!("certificate time out of range: {}", time.timestamp()))
}

/// Formats a serial number as colon-separated lowercase hex.
pub(crate) fn format_serial(raw: &[u8]) -> String {
    raw.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Maps a signature algorithm OID to its conventional name.
///
/// Unknown OIDs are returned unchanged.
pub(crate) fn signature_algorithm_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption",
        "1.2.840.113549.1.1.4" => "md5WithRSAEncryption",
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption",
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption",
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption",
        "1.2.840.113549.1.1.10" => "rsassaPss",
        "1.2.840.10045.4.1" => "ecdsa-with-SHA1",
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256",
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384",
        "1.2.840.10045.4.3.4" => "ecdsa-with-SHA512",
        "1.3.101.112" => "Ed25519",
        "1.3.101.113" => "Ed448",
        other => other,
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_serial() {
        assert_eq!(format_serial(&[0x0a, 0xff, 0x01]), "0a:ff:01");
        assert_eq!(format_serial(&[]), "");
    }

    #[test]
    fn test_signature_algorithm_names() {
        assert_eq!(
            signature_algorithm_name("1.2.840.113549.1.1.11"),
            "sha256WithRSAEncryption"
        );
        assert_eq!(
            signature_algorithm_name("1.2.840.10045.4.3.2"),
            "ecdsa-with-SHA256"
        );
        assert_eq!(signature_algorithm_name("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn test_ip_from_bytes() {
        assert_eq!(ip_from_bytes(&[192, 0, 2, 1]), Some("192.0.2.1".to_string()));
        assert_eq!(ip_from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_parse_leaf_rejects_garbage() {
        assert!(parse_leaf(b"definitely not DER").is_err());
    }
}
