// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for jenkup

use thiserror::Error;

/// Result type alias for jenkup operations
pub type Result<T> = std::result::Result<T, JenkupError>;

/// Errors that can occur while provisioning a host
#[derive(Error, Debug)]
pub enum JenkupError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Network unreachable or remote endpoint unavailable
    #[error("Network error: {message}")]
    Network { message: String },

    /// Operation requires privileges the process does not have
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// The package manager could not locate a requested package
    #[error("Package not found: {package}")]
    PackageNotFound { package: String },

    /// Repository signature could not be verified
    #[error("Signature verification failed: {message}")]
    SignatureMismatch { message: String },

    /// Downloaded key did not match the configured checksum
    #[error("Checksum mismatch for signing key: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// No space left on the target filesystem
    #[error("Disk full while writing {path}")]
    DiskFull { path: String },

    /// A subprocess exceeded its timeout
    #[error("'{command}' timed out after {seconds} seconds")]
    Timeout { command: String, seconds: u64 },

    /// A subprocess exited with a failure status not otherwise classified
    #[error("'{command}' exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
