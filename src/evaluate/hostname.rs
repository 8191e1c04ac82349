//! Hostname matching against certificate names.

use std::net::IpAddr;

/// Returns true when `hostname` is covered by one of `names`.
///
/// Comparison is case-insensitive and ignores a trailing dot. A name of the
/// form `*.example.com` matches exactly one extra label on the left
/// (`a.example.com`), never the bare parent (`example.com`) nor deeper names
/// (`a.b.example.com`). IP-literal hostnames only match an identical name.
pub fn hostname_matches_any<S: AsRef<str>>(hostname: &str, names: &[S]) -> bool {
    names
        .iter()
        .any(|name| hostname_matches(hostname, name.as_ref()))
}

/// Matches one hostname against one certificate name.
pub fn hostname_matches(hostname: &str, pattern: &str) -> bool {
    let host = normalize(hostname);
    let pattern = normalize(pattern);
    if host.is_empty() || pattern.is_empty() {
        return false;
    }

    if host.parse::<IpAddr>().is_ok() {
        return host == pattern;
    }

    match pattern.strip_prefix("*.") {
        Some(suffix) => {
            // "*.com" style patterns are too broad to honour
            if suffix.is_empty() || !suffix.contains('.') {
                return false;
            }
            match host.split_once('.') {
                Some((label, rest)) => !label.is_empty() && rest == suffix,
                None => false,
            }
        }
        None => host == pattern,
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
