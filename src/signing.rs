// SPDX-License-Identifier: AGPL-3.0-or-later
//! Repository trust artifacts
//!
//! Handles the two filesystem artifacts the provisioning sequence owns: the
//! signing-key file (downloaded over HTTPS, optionally checksum-verified,
//! written atomically) and the apt source-list file (rewritten whole so a
//! re-run can never duplicate the entry).

use std::fs;
use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{JenkupError, Result};

/// Download the signing key from `url` and return its raw bytes.
///
/// Transport failures and non-success HTTP statuses are both reported as
/// network errors; nothing is written to disk here.
pub async fn fetch_key(url: &str) -> Result<Vec<u8>> {
    info!(url = %url, "Downloading signing key");

    let response = reqwest::get(url).await.map_err(|e| JenkupError::Network {
        message: format!("GET {}: {}", url, e),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(JenkupError::Network {
            message: format!("GET {}: HTTP {}", url, status),
        });
    }

    let bytes = response.bytes().await.map_err(|e| JenkupError::Network {
        message: format!("GET {}: {}", url, e),
    })?;

    debug!(bytes = bytes.len(), "Signing key downloaded");
    Ok(bytes.to_vec())
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Verify `bytes` against an expected SHA-256 hex digest (case-insensitive).
pub fn verify_checksum(bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual != expected.to_ascii_lowercase() {
        return Err(JenkupError::ChecksumMismatch {
            expected: expected.to_ascii_lowercase(),
            actual,
        });
    }
    Ok(())
}

/// Whether the keyring file at `path` already holds the expected key.
///
/// With a configured checksum this demands an exact content match; without
/// one, any existing file is accepted (the keyring is write-once and never
/// rotated).
pub fn keyring_matches(path: &Path, expected_sha256: Option<&str>) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    match expected_sha256 {
        None => Ok(true),
        Some(expected) => {
            let bytes = fs::read(path)?;
            Ok(sha256_hex(&bytes) == expected.to_ascii_lowercase())
        }
    }
}

/// Atomically write `bytes` to `path` (temp file in the same directory,
/// then rename). Creates parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| JenkupError::InvalidConfig {
        message: format!("'{}' has no parent directory", path.display()),
    })?;

    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes).map_err(|e| map_write_error(path, e))?;
    tmp.persist(path)
        .map_err(|e| JenkupError::IoError(e.error))?;

    info!(path = %path.display(), "Wrote file");
    Ok(())
}

fn map_write_error(path: &Path, e: std::io::Error) -> JenkupError {
    match e.raw_os_error() {
        // ENOSPC
        Some(28) => JenkupError::DiskFull {
            path: path.display().to_string(),
        },
        _ => JenkupError::IoError(e),
    }
}

/// Render the single `deb` line the source-list file must contain.
pub fn render_source_line(keyring_path: &Path, repo_url: &str, suite: &str) -> String {
    format!(
        "deb [signed-by={}] {} {}",
        keyring_path.display(),
        repo_url,
        suite
    )
}

/// Whether the source-list file already holds exactly the desired line.
///
/// Comment and blank lines are ignored; any other difference (missing file,
/// extra entries, stale URL) counts as not registered.
pub fn is_registered(path: &Path, line: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let contents = fs::read_to_string(path)?;
    let entries: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    Ok(entries == [line])
}

/// Rewrite the source-list file to contain exactly the desired line.
pub fn write_source_list(path: &Path, line: &str) -> Result<()> {
    let contents = format!("# Managed by jenkup; edits will be overwritten.\n{}\n", line);
    write_atomic(path, contents.as_bytes())
}
