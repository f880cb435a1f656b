// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration management for jenkup

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{JenkupError, Result};

/// Main configuration structure for jenkup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance name, used in log output
    #[serde(default = "default_name")]
    pub name: String,

    /// Java runtime configuration
    #[serde(default)]
    pub java: JavaConfig,

    /// Jenkins package and repository configuration
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Package manager configuration
    #[serde(default)]
    pub apt: AptConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Java runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaConfig {
    /// JDK package to install
    #[serde(default = "default_java_package")]
    pub package: String,
}

/// Jenkins package and repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Jenkins package to install
    #[serde(default = "default_jenkins_package")]
    pub package: String,

    /// URL of the repository signing key
    #[serde(default = "default_key_url")]
    pub key_url: String,

    /// Expected SHA-256 of the signing key (64 hex chars), verified when set
    pub key_sha256: Option<String>,

    /// Destination path for the signing key
    #[serde(default = "default_keyring_path")]
    pub keyring_path: PathBuf,

    /// apt source-list file owned by jenkup
    #[serde(default = "default_source_list_path")]
    pub source_list_path: PathBuf,

    /// Package repository URL
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    /// Repository suite component of the deb line
    #[serde(default = "default_suite")]
    pub suite: String,
}

/// Package manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AptConfig {
    /// Timeout for each apt invocation in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            java: JavaConfig::default(),
            jenkins: JenkinsConfig::default(),
            apt: AptConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            package: default_java_package(),
        }
    }
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            package: default_jenkins_package(),
            key_url: default_key_url(),
            key_sha256: None,
            keyring_path: default_keyring_path(),
            source_list_path: default_source_list_path(),
            repo_url: default_repo_url(),
            suite: default_suite(),
        }
    }
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(JenkupError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// Load the file at `path` when it exists, otherwise fall back to defaults.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.java.package.is_empty() {
            return Err(JenkupError::InvalidConfig {
                message: "java.package cannot be empty".to_string(),
            });
        }

        if self.jenkins.package.is_empty() {
            return Err(JenkupError::InvalidConfig {
                message: "jenkins.package cannot be empty".to_string(),
            });
        }

        for (field, url) in [
            ("jenkins.key_url", &self.jenkins.key_url),
            ("jenkins.repo_url", &self.jenkins.repo_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(JenkupError::InvalidConfig {
                    message: format!("{} must be an http(s) URL, got '{}'", field, url),
                });
            }
        }

        if let Some(sum) = &self.jenkins.key_sha256 {
            if sum.len() != 64 || !sum.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(JenkupError::InvalidConfig {
                    message: "jenkins.key_sha256 must be 64 hex characters".to_string(),
                });
            }
        }

        if self.apt.command_timeout_secs == 0 {
            return Err(JenkupError::InvalidConfig {
                message: "apt.command_timeout_secs must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Commented default configuration written by `jenkup init`.
pub fn default_config_toml() -> &'static str {
    r#"# SPDX-License-Identifier: AGPL-3.0-or-later
# jenkup configuration

name = "jenkup"

[java]
package = "openjdk-17-jdk"

[jenkins]
package = "jenkins"
key_url = "https://pkg.jenkins.io/debian-stable/jenkins.io-2023.key"
# key_sha256 = "0000000000000000000000000000000000000000000000000000000000000000"
keyring_path = "/usr/share/keyrings/jenkins-keyring.asc"
source_list_path = "/etc/apt/sources.list.d/jenkins.list"
repo_url = "https://pkg.jenkins.io/debian-stable"
suite = "binary/"

[apt]
command_timeout_secs = 600

[logging]
level = "info"
format = "text"
"#
}

// Default value functions

fn default_name() -> String {
    "jenkup".to_string()
}

fn default_java_package() -> String {
    "openjdk-17-jdk".to_string()
}

fn default_jenkins_package() -> String {
    "jenkins".to_string()
}

fn default_key_url() -> String {
    "https://pkg.jenkins.io/debian-stable/jenkins.io-2023.key".to_string()
}

fn default_keyring_path() -> PathBuf {
    PathBuf::from("/usr/share/keyrings/jenkins-keyring.asc")
}

fn default_source_list_path() -> PathBuf {
    PathBuf::from("/etc/apt/sources.list.d/jenkins.list")
}

fn default_repo_url() -> String {
    "https://pkg.jenkins.io/debian-stable".to_string()
}

fn default_suite() -> String {
    "binary/".to_string()
}

fn default_command_timeout() -> u64 {
    600 // 10 minutes; apt installs can be slow on first run
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}
