//! URL discovery in a codebase.
//!
//! The batch scanner asks a [`UrlExtractor`] for candidate URLs; the shipped
//! [`CodebaseUrlExtractor`] walks a source tree and collects absolute
//! `http(s)://` URLs embedded in text files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;

use crate::config::{EXTRACT_FILE_EXTENSIONS, EXTRACT_SKIPPED_DIRS, MAX_EXTRACT_FILE_SIZE};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'`<>()\[\]{}\\|^]+"#).expect("URL pattern is a valid regex")
});

/// Characters stripped from the end of a match (sentence punctuation).
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Source of URLs to scan.
#[async_trait]
pub trait UrlExtractor: Send + Sync {
    /// Returns the discovered URLs, deduplicated and sorted.
    async fn extract(&self) -> Result<Vec<String>>;
}

/// Walks a directory tree and collects absolute URLs with a regex.
///
/// Hidden directories and `target`, `node_modules`, `vendor` are skipped, as
/// are files over 1 MiB, non-UTF-8 files and files with an extension not in
/// the configured list. Symlinks are not followed.
pub struct CodebaseUrlExtractor {
    root: Option<PathBuf>,
}

impl CodebaseUrlExtractor {
    /// Creates an extractor for `root`. With `None`, extraction yields nothing.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

#[async_trait]
impl UrlExtractor for CodebaseUrlExtractor {
    async fn extract(&self) -> Result<Vec<String>> {
        let Some(root) = self.root.clone() else {
            debug!("No codebase root configured, nothing to extract");
            return Ok(Vec::new());
        };

        // Directory walking is blocking filesystem work
        let urls = tokio::task::spawn_blocking(move || extract_from_tree(&root))
            .await
            .context("URL extraction task failed")??;

        info!("Discovered {} URLs in codebase", urls.len());
        Ok(urls)
    }
}

fn extract_from_tree(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        anyhow::bail!("codebase root {} is not a directory", root.display());
    }

    let mut files = Vec::new();
    collect_files(root, &mut files)
        .with_context(|| format!("Failed to walk {}", root.display()))?;

    let mut urls = BTreeSet::new();
    for file in files {
        match std::fs::read_to_string(&file) {
            Ok(content) => urls.extend(extract_urls_from_text(&content)),
            Err(e) => debug!("Skipping {}: {e}", file.display()),
        }
    }
    Ok(urls.into_iter().collect())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if name.starts_with('.') || EXTRACT_SKIPPED_DIRS.contains(&&*name) {
                continue;
            }
            if let Err(e) = collect_files(&entry.path(), files) {
                warn!("Skipping unreadable directory {}: {e}", entry.path().display());
            }
        } else if file_type.is_file() && has_scanned_extension(&entry.path()) {
            match entry.metadata() {
                Ok(meta) if meta.len() <= MAX_EXTRACT_FILE_SIZE => files.push(entry.path()),
                Ok(_) => debug!("Skipping large file {}", entry.path().display()),
                Err(e) => debug!("Skipping {}: {e}", entry.path().display()),
            }
        }
    }
    Ok(())
}

fn has_scanned_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTRACT_FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Finds absolute URLs in `text`, in order of appearance.
///
/// Matches that do not parse as a URL with a host are dropped.
pub fn extract_urls_from_text(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .filter(|candidate| {
            url::Url::parse(candidate)
                .ok()
                .is_some_and(|u| u.host_str().is_some_and(|h| !h.is_empty()))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_urls_from_text() {
        let text = r#"
            $endpoint = "https://api.example.com/v1/items";
            See https://docs.example.org/guide. Also (http://legacy.example.net).
            not a url: https:// or ftp://files.example.com
        "#;
        assert_eq!(
            extract_urls_from_text(text),
            vec![
                "https://api.example.com/v1/items",
                "https://docs.example.org/guide",
                "http://legacy.example.net",
            ]
        );
    }

    #[test]
    fn test_extract_keeps_ports_and_queries() {
        assert_eq!(
            extract_urls_from_text("url: 'https://example.com:8443/path?a=1&b=2'"),
            vec!["https://example.com:8443/path?a=1&b=2"]
        );
    }

    #[tokio::test]
    async fn test_no_root_yields_empty_list() {
        let extractor = CodebaseUrlExtractor::new(None);
        assert!(extractor.extract().await.expect("extract").is_empty());
    }

    #[tokio::test]
    async fn test_walk_skips_hidden_and_vendor_dirs() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).expect("mkdir");
        std::fs::create_dir_all(root.join("vendor/lib")).expect("mkdir");
        std::fs::create_dir_all(root.join(".git")).expect("mkdir");

        std::fs::write(
            root.join("src/settings.php"),
            "$base = 'https://b.example.com';\n$alt = 'https://a.example.com';",
        )
        .expect("write");
        std::fs::write(root.join("src/dup.yml"), "url: https://a.example.com").expect("write");
        std::fs::write(root.join("src/image.png"), "https://ignored.example.com").expect("write");
        std::fs::write(root.join("vendor/lib/x.php"), "https://vendor.example.com")
            .expect("write");
        std::fs::write(root.join(".git/config"), "https://git.example.com").expect("write");

        let extractor = CodebaseUrlExtractor::new(Some(root.to_path_buf()));
        let urls = extractor.extract().await.expect("extract");
        assert_eq!(urls, vec!["https://a.example.com", "https://b.example.com"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let extractor = CodebaseUrlExtractor::new(Some(PathBuf::from("/nonexistent/codebase")));
        assert!(extractor.extract().await.is_err());
    }
}
