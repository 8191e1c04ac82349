//! URL validation and normalization into scan targets.

use std::collections::HashSet;

use log::warn;

use crate::config::{DEFAULT_TLS_PORT, MAX_URL_LENGTH};
use crate::models::ScanTarget;

/// Validates a URL and turns it into a [`ScanTarget`].
///
/// Adds an https:// prefix when no scheme is present, then requires a URL that
/// parses, uses http or https, and has a host. Any other scheme, including
/// scheme-only forms like `mailto:`, is rejected. `http` URLs are scanned on
/// the TLS port (443) unless they carry an explicit port, `:80` included. Returns the reason as
/// `Err` when the URL cannot be scanned.
///
/// # Arguments
///
/// * `raw` - The URL string as submitted
pub fn normalize_target(raw: &str) -> Result<ScanTarget, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty URL".to_string());
    }

    if trimmed.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping URL exceeding maximum length ({} > {}): {}...",
            trimmed.len(),
            MAX_URL_LENGTH,
            trimmed.chars().take(50).collect::<String>()
        );
        return Err(format!("URL exceeds {MAX_URL_LENGTH} characters"));
    }

    let (normalized, parsed) = match url::Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "https" | "http") => {
            (trimmed.to_string(), parsed)
        }
        // `example.com:8443` parses with `example.com` as the scheme
        Ok(_) if is_host_and_port(trimmed) => with_https_prefix(trimmed)?,
        Ok(parsed) => return Err(format!("unsupported scheme '{}'", parsed.scheme())),
        Err(url::ParseError::RelativeUrlWithoutBase) => with_https_prefix(trimmed)?,
        Err(e) => return Err(e.to_string()),
    };

    let host = match parsed.host() {
        Some(url::Host::Domain(domain)) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Some(url::Host::Ipv4(addr)) => addr.to_string(),
        Some(url::Host::Ipv6(addr)) => addr.to_string(),
        None => return Err("URL has no host".to_string()),
    };
    if host.is_empty() {
        return Err("URL has no host".to_string());
    }

    let port = explicit_port(&normalized, &parsed).unwrap_or(DEFAULT_TLS_PORT);

    Ok(ScanTarget {
        url: trimmed.to_string(),
        host,
        port,
    })
}

fn with_https_prefix(trimmed: &str) -> Result<(String, url::Url), String> {
    let normalized = format!("https://{trimmed}");
    let parsed = url::Url::parse(&normalized).map_err(|e| e.to_string())?;
    Ok((normalized, parsed))
}

/// True for scheme-less `host:port` input such as `localhost:8443/health`.
fn is_host_and_port(trimmed: &str) -> bool {
    let Some((_, rest)) = trimmed.split_once(':') else {
        return false;
    };
    let port = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
}

/// The port written in the URL, if any.
///
/// `Url::port()` drops a scheme's default port, which would turn an explicit
/// `http://host:80` into a scan of 443. Re-parsing an http URL as https keeps
/// `:80` as an explicit port.
fn explicit_port(normalized: &str, parsed: &url::Url) -> Option<u16> {
    if parsed.scheme() == "http" {
        url::Url::parse(&format!("https{}", &normalized["http".len()..]))
            .ok()
            .and_then(|u| u.port())
    } else {
        parsed.port()
    }
}

/// Removes duplicate URLs, keeping the first occurrence of each.
///
/// URLs are compared after trimming surrounding whitespace.
pub fn dedup_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(|u| u.trim().to_string())
        .filter(|u| seen.insert(u.clone()))
        .collect()
}
