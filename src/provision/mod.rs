// SPDX-License-Identifier: AGPL-3.0-or-later
//! Provisioning sequence model
//!
//! The sequence that brings a host to the desired end state is derived from
//! configuration as an ordered list of [`Step`]s. Steps are causally
//! ordered: the key must exist before the source line references it, and
//! the source must be registered before its package can be installed.

mod executor;

pub use executor::{HostStatus, Provisioner};

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;

/// A single provisioning step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Step {
    /// Refresh the package index
    RefreshIndex,

    /// Install a package, skipped when already installed
    InstallPackage {
        /// Package name
        package: String,
    },

    /// Download the repository signing key to the keyring path
    FetchSigningKey {
        /// Key distribution URL
        url: String,
        /// Destination keyring file
        keyring_path: PathBuf,
        /// Expected SHA-256 (hex), verified when set
        sha256: Option<String>,
    },

    /// Rewrite the source-list file to exactly one deb line
    RegisterSource {
        /// Source-list file owned by jenkup
        source_list_path: PathBuf,
        /// Rendered deb line
        line: String,
    },
}

impl Step {
    /// Short machine-readable step name.
    pub fn name(&self) -> &'static str {
        match self {
            Step::RefreshIndex => "refresh-index",
            Step::InstallPackage { .. } => "install-package",
            Step::FetchSigningKey { .. } => "fetch-signing-key",
            Step::RegisterSource { .. } => "register-source",
        }
    }

    /// Human-readable description for plan and report output.
    pub fn describe(&self) -> String {
        match self {
            Step::RefreshIndex => "Refresh package index".to_string(),
            Step::InstallPackage { package } => format!("Install package '{}'", package),
            Step::FetchSigningKey { url, keyring_path, .. } => {
                format!("Fetch signing key {} -> {}", url, keyring_path.display())
            }
            Step::RegisterSource { source_list_path, line } => {
                format!("Register source '{}' in {}", line, source_list_path.display())
            }
        }
    }
}

/// Build the ordered provisioning plan for a configuration.
pub fn plan(config: &Config) -> Vec<Step> {
    let line = crate::signing::render_source_line(
        &config.jenkins.keyring_path,
        &config.jenkins.repo_url,
        &config.jenkins.suite,
    );

    vec![
        Step::RefreshIndex,
        Step::InstallPackage {
            package: config.java.package.clone(),
        },
        Step::FetchSigningKey {
            url: config.jenkins.key_url.clone(),
            keyring_path: config.jenkins.keyring_path.clone(),
            sha256: config.jenkins.key_sha256.clone(),
        },
        Step::RegisterSource {
            source_list_path: config.jenkins.source_list_path.clone(),
            line,
        },
        Step::RefreshIndex,
        Step::InstallPackage {
            package: config.jenkins.package.clone(),
        },
    ]
}

/// Outcome of a single executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum StepOutcome {
    /// The step ran and changed host state
    Changed,
    /// The step's artifact was already in the desired state
    Skipped {
        /// Why the step was skipped
        reason: String,
    },
    /// Dry run: the step would have run
    WouldChange,
    /// The step failed; the sequence aborts here
    Failed {
        /// Error message
        error: String,
    },
}

/// Report for a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Step name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Outcome
    #[serde(flatten)]
    pub outcome: StepOutcome,
    /// Duration of the step
    pub duration_ms: u64,
}

/// Report for a complete provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    /// Whether every executed step succeeded
    pub success: bool,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-step reports, in execution order
    pub steps: Vec<StepReport>,
    /// Steps that changed host state
    pub changed: usize,
    /// Steps skipped as already satisfied
    pub skipped: usize,
    /// Total wall time
    pub total_duration_ms: u64,
}
