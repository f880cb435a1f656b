// SPDX-License-Identifier: AGPL-3.0-or-later
//! apt/dpkg adapter
//!
//! All package-manager interaction goes through [`AptClient`]: index
//! refreshes, installs, and installed-state queries. Subprocess stderr is
//! classified into the jenkup error taxonomy so callers see typed failures
//! (network, permission, missing package, bad signature, full disk) instead
//! of raw exit codes.

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{JenkupError, Result};

/// Client for the Debian package manager.
///
/// The `apt-get` and `dpkg-query` binaries are constructor parameters so
/// tests can point the client at stub executables.
pub struct AptClient {
    apt_get: PathBuf,
    dpkg_query: PathBuf,
    timeout_secs: u64,
}

impl AptClient {
    /// Create a client using the system `apt-get` and `dpkg-query`.
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_commands("apt-get", "dpkg-query", timeout_secs)
    }

    /// Create a client with explicit binary paths.
    pub fn with_commands<A, D>(apt_get: A, dpkg_query: D, timeout_secs: u64) -> Self
    where
        A: Into<PathBuf>,
        D: Into<PathBuf>,
    {
        Self {
            apt_get: apt_get.into(),
            dpkg_query: dpkg_query.into(),
            timeout_secs,
        }
    }

    /// Refresh the local package index (`apt-get update`).
    pub async fn update(&self) -> Result<()> {
        info!("Refreshing package index");
        let output = self.run(&self.apt_get, &["update"]).await?;

        if !output.status.success() {
            return Err(classify_apt_error("apt-get update", None, &output));
        }

        Ok(())
    }

    /// Install a package (`apt-get install -y <package>`).
    pub async fn install(&self, package: &str) -> Result<()> {
        info!(package = %package, "Installing package");
        let output = self
            .run(&self.apt_get, &["install", "-y", package])
            .await?;

        if !output.status.success() {
            return Err(classify_apt_error(
                &format!("apt-get install {}", package),
                Some(package),
                &output,
            ));
        }

        Ok(())
    }

    /// Query whether a package is installed (`dpkg-query -W -f=${Status}`).
    pub async fn is_installed(&self, package: &str) -> Result<bool> {
        let output = self
            .run(&self.dpkg_query, &["-W", "-f=${Status}", package])
            .await?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let installed = stdout.contains("install ok installed");
            debug!(package = %package, installed, "Queried package state");
            return Ok(installed);
        }

        // dpkg-query exits non-zero for packages it has never heard of.
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no packages found matching") {
            return Ok(false);
        }

        Err(classify_apt_error(
            &format!("dpkg-query {}", package),
            Some(package),
            &output,
        ))
    }

    async fn run(&self, program: &PathBuf, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(program);
        command
            .args(args)
            .env("LC_ALL", "C")
            .env("DEBIAN_FRONTEND", "noninteractive");

        debug!(program = %program.display(), ?args, "Spawning command");

        let duration = Duration::from_secs(self.timeout_secs);
        match timeout(duration, command.output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(JenkupError::Timeout {
                command: format!("{} {}", program.display(), args.join(" ")),
                seconds: self.timeout_secs,
            }),
        }
    }
}

/// Map a failed apt/dpkg invocation to a typed error by stderr pattern.
fn classify_apt_error(command: &str, package: Option<&str>, output: &Output) -> JenkupError {
    let stderr = String::from_utf8_lossy(&output.stderr);

    if stderr.contains("Permission denied")
        || stderr.contains("permission denied")
        || stderr.contains("are you root?")
        || stderr.contains("/var/lib/dpkg/lock")
    {
        return JenkupError::PermissionDenied {
            message: format!("{}: {}", command, first_line(&stderr)),
        };
    }

    if stderr.contains("Could not resolve")
        || stderr.contains("Failed to fetch")
        || stderr.contains("Temporary failure resolving")
        || stderr.contains("Network is unreachable")
    {
        return JenkupError::Network {
            message: format!("{}: {}", command, first_line(&stderr)),
        };
    }

    if stderr.contains("NO_PUBKEY")
        || stderr.contains("is not signed")
        || stderr.contains("invalid signature")
        || stderr.contains("GPG error")
    {
        return JenkupError::SignatureMismatch {
            message: format!("{}: {}", command, first_line(&stderr)),
        };
    }

    if let Some(pkg) = package {
        if stderr.contains("Unable to locate package") {
            return JenkupError::PackageNotFound {
                package: pkg.to_string(),
            };
        }
    }

    if stderr.contains("No space left on device") {
        return JenkupError::DiskFull {
            path: "/var/cache/apt".to_string(),
        };
    }

    JenkupError::CommandFailed {
        command: command.to_string(),
        status: output.status.code().unwrap_or(-1),
        stderr: stderr.trim().to_string(),
    }
}

fn first_line(stderr: &str) -> String {
    stderr.lines().next().unwrap_or("").trim().to_string()
}
