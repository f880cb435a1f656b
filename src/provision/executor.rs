// SPDX-License-Identifier: AGPL-3.0-or-later
//! Provisioning sequence executor
//!
//! Runs the planned steps in order. Each step checks its artifact before
//! acting, so a re-run on an already provisioned host only refreshes the
//! package index. The first failing step aborts the sequence.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{plan, ProvisionReport, Step, StepOutcome, StepReport};
use crate::apt::AptClient;
use crate::config::Config;
use crate::error::Result;
use crate::signing;

/// Executor for the provisioning sequence.
pub struct Provisioner {
    config: Config,
    apt: AptClient,
    /// Whether to run in dry-run mode (no subprocesses, no writes)
    dry_run: bool,
}

/// Current host state relative to the desired end state.
#[derive(Debug, Clone, Serialize)]
pub struct HostStatus {
    /// JDK package installed
    pub jdk_installed: bool,
    /// Keyring file present (and matching the checksum, when configured)
    pub keyring_present: bool,
    /// Source-list file holds exactly the desired line
    pub source_registered: bool,
    /// Jenkins package installed
    pub jenkins_installed: bool,
}

impl HostStatus {
    /// Whether the host is fully provisioned.
    pub fn is_provisioned(&self) -> bool {
        self.jdk_installed && self.keyring_present && self.source_registered && self.jenkins_installed
    }
}

impl Provisioner {
    /// Create a provisioner using the system package manager.
    pub fn new(config: Config, dry_run: bool) -> Self {
        let apt = AptClient::new(config.apt.command_timeout_secs);
        Self::with_apt_client(config, apt, dry_run)
    }

    /// Create a provisioner with an explicit [`AptClient`] (used by tests).
    pub fn with_apt_client(config: Config, apt: AptClient, dry_run: bool) -> Self {
        Self { config, apt, dry_run }
    }

    /// Execute the provisioning sequence.
    ///
    /// Steps run in plan order; the first failure aborts the run and the
    /// remaining steps are not attempted.
    pub async fn execute(&self) -> ProvisionReport {
        let start_time = Instant::now();
        let steps = plan(&self.config);

        let mut reports = Vec::new();
        let mut changed = 0usize;
        let mut skipped = 0usize;
        let mut success = true;

        info!(
            name = %self.config.name,
            steps = steps.len(),
            dry_run = self.dry_run,
            "Starting provisioning sequence"
        );

        for (index, step) in steps.iter().enumerate() {
            debug!(step = step.name(), index, "Executing step");
            let step_start = Instant::now();

            let outcome = self.execute_step(step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match &outcome {
                StepOutcome::Changed => {
                    changed += 1;
                    info!(step = step.name(), duration_ms, "Step changed host state");
                }
                StepOutcome::Skipped { reason } => {
                    skipped += 1;
                    info!(step = step.name(), reason = %reason, "Step skipped");
                }
                StepOutcome::WouldChange => {
                    debug!(step = step.name(), "Dry run, step not executed");
                }
                StepOutcome::Failed { error } => {
                    success = false;
                    error!(step = step.name(), error = %error, "Step failed");
                }
            }

            let failed = matches!(outcome, StepOutcome::Failed { .. });
            reports.push(StepReport {
                name: step.name().to_string(),
                description: step.describe(),
                outcome,
                duration_ms,
            });

            if failed {
                warn!("Aborting provisioning sequence after step failure");
                break;
            }
        }

        let total_duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            success,
            changed,
            skipped,
            duration_ms = total_duration_ms,
            "Provisioning sequence completed"
        );

        ProvisionReport {
            success,
            dry_run: self.dry_run,
            steps: reports,
            changed,
            skipped,
            total_duration_ms,
        }
    }

    async fn execute_step(&self, step: &Step) -> StepOutcome {
        if self.dry_run {
            return StepOutcome::WouldChange;
        }

        let result = match step {
            Step::RefreshIndex => self.apt.update().await.map(|_| StepOutcome::Changed),
            Step::InstallPackage { package } => self.install_package(package).await,
            Step::FetchSigningKey {
                url,
                keyring_path,
                sha256,
            } => self.fetch_signing_key(url, keyring_path, sha256.as_deref()).await,
            Step::RegisterSource {
                source_list_path,
                line,
            } => self.register_source(source_list_path, line),
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn install_package(&self, package: &str) -> Result<StepOutcome> {
        if self.apt.is_installed(package).await? {
            return Ok(StepOutcome::Skipped {
                reason: format!("package '{}' already installed", package),
            });
        }

        self.apt.install(package).await?;
        Ok(StepOutcome::Changed)
    }

    async fn fetch_signing_key(
        &self,
        url: &str,
        keyring_path: &Path,
        sha256: Option<&str>,
    ) -> Result<StepOutcome> {
        if signing::keyring_matches(keyring_path, sha256)? {
            return Ok(StepOutcome::Skipped {
                reason: format!("keyring '{}' already present", keyring_path.display()),
            });
        }

        let bytes = signing::fetch_key(url).await?;
        if let Some(expected) = sha256 {
            signing::verify_checksum(&bytes, expected)?;
        }
        signing::write_atomic(keyring_path, &bytes)?;

        Ok(StepOutcome::Changed)
    }

    fn register_source(&self, source_list_path: &Path, line: &str) -> Result<StepOutcome> {
        if signing::is_registered(source_list_path, line)? {
            return Ok(StepOutcome::Skipped {
                reason: format!("source already registered in '{}'", source_list_path.display()),
            });
        }

        signing::write_source_list(source_list_path, line)?;
        Ok(StepOutcome::Changed)
    }

    /// Report the host's current state relative to the desired end state.
    pub async fn status(&self) -> Result<HostStatus> {
        let jdk_installed = self.apt.is_installed(&self.config.java.package).await?;
        let jenkins_installed = self.apt.is_installed(&self.config.jenkins.package).await?;

        let keyring_present = signing::keyring_matches(
            &self.config.jenkins.keyring_path,
            self.config.jenkins.key_sha256.as_deref(),
        )?;

        let line = signing::render_source_line(
            &self.config.jenkins.keyring_path,
            &self.config.jenkins.repo_url,
            &self.config.jenkins.suite,
        );
        let source_registered =
            signing::is_registered(&self.config.jenkins.source_list_path, &line)?;

        Ok(HostStatus {
            jdk_installed,
            keyring_present,
            source_registered,
            jenkins_installed,
        })
    }
}
