// SPDX-License-Identifier: AGPL-3.0-or-later
//! jenkup: Idempotent Jenkins provisioning for Debian-family hosts
//!
//! Brings a host to a known end state in six ordered steps: refresh the
//! package index, install a JDK, fetch the Jenkins repository signing key,
//! register the apt source, refresh the index again, install Jenkins.
//!
//! # Features
//!
//! * **Idempotent:** every step checks its artifact first; a re-run on a
//!   provisioned host only refreshes the package index
//! * **Fail-fast:** the first failing step aborts the sequence with a typed
//!   error instead of limping on partially provisioned
//! * **Verified:** the downloaded signing key can be pinned to a SHA-256
//!   checksum before anything trusts it

pub mod apt;
pub mod config;
pub mod error;
pub mod provision;
pub mod signing;

pub use config::Config;
pub use error::{JenkupError, Result};
pub use provision::{plan, HostStatus, Provisioner, Step};
