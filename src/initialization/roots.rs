//! Root certificate store construction.

use std::path::Path;

use log::{info, warn};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;

use crate::config::Config;
use crate::error_handling::InitializationError;

/// Builds the trust anchors used for chain-of-trust verification.
///
/// Starts from the Mozilla root set shipped in `webpki-roots` unless
/// `use_default_roots` is off, then adds every certificate from the
/// optional `ca_bundle` PEM file.
///
/// # Errors
///
/// Returns `InitializationError::TrustAnchorError` if the bundle cannot be
/// read, contains no usable certificate, or the resulting store is empty.
pub fn build_root_store(config: &Config) -> Result<RootCertStore, InitializationError> {
    let mut roots = RootCertStore::empty();

    if config.use_default_roots {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        info!("Loaded {} default trust anchors", roots.len());
    }

    if let Some(bundle) = &config.ca_bundle {
        let added = add_pem_bundle(&mut roots, bundle)?;
        info!("Loaded {added} trust anchors from {}", bundle.display());
    }

    if roots.is_empty() {
        return Err(InitializationError::TrustAnchorError(
            "no trust anchors loaded".to_string(),
        ));
    }
    Ok(roots)
}

fn add_pem_bundle(roots: &mut RootCertStore, path: &Path) -> Result<usize, InitializationError> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| {
            InitializationError::TrustAnchorError(format!("{}: {e}", path.display()))
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            InitializationError::TrustAnchorError(format!("{}: {e}", path.display()))
        })?;

    let (added, ignored) = roots.add_parsable_certificates(certs);
    if ignored > 0 {
        warn!(
            "Ignored {ignored} unparseable certificates in {}",
            path.display()
        );
    }
    if added == 0 {
        return Err(InitializationError::TrustAnchorError(format!(
            "{} contains no usable certificates",
            path.display()
        )));
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_roots_loaded() {
        let roots = build_root_store(&Config::default()).expect("default roots");
        assert!(!roots.is_empty());
    }

    #[test]
    fn test_missing_bundle_is_an_error() {
        let config = Config {
            ca_bundle: Some(PathBuf::from("/nonexistent/bundle.pem")),
            ..Default::default()
        };
        assert!(matches!(
            build_root_store(&config),
            Err(InitializationError::TrustAnchorError(_))
        ));
    }

    #[test]
    fn test_bundle_without_certificates_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "not a certificate").expect("write");
        let config = Config {
            ca_bundle: Some(file.path().to_path_buf()),
            use_default_roots: false,
            ..Default::default()
        };
        assert!(matches!(
            build_root_store(&config),
            Err(InitializationError::TrustAnchorError(_))
        ));
    }
}
