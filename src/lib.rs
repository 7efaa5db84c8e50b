//! # sos-collector
//!
//! Collect sosreports from every node of a cluster in parallel and bundle
//! them into a single archive for a support case.
//!
//! ## Overview
//!
//! A run detects the cluster type from a primary node (the local host, or a
//! designated master), asks the cluster for its members, runs `sosreport` on
//! each of them with a bounded number of concurrent tasks and packs every
//! retrieved report together with the run logs into one `tar.gz`.
//!
//! ## Features
//!
//! - **Cluster detection**: kubernetes, oVirt and pacemaker profiles
//! - **Bounded parallelism**: one task per node on a capped worker pool
//! - **Partial failure**: unreachable or failing nodes never abort the run
//! - **Run logs**: a diagnostic log and a console transcript ship inside the archive
//! - **SSH transport**: key, agent or password authentication with optional sudo
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use sos_collector::clusters::load_profiles;
//! use sos_collector::config::RunConfig;
//! use sos_collector::models::CancelFlag;
//! use sos_collector::nodes::{LocalIdentity, SshConnector};
//! use sos_collector::orchestrator::Orchestrator;
//! use sos_collector::reporting::RunLog;
//! use sos_collector::utils::archive::WorkDir;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RunConfig {
//!     nodes: vec!["node1".to_string(), "node2".to_string()],
//!     ..RunConfig::default()
//! };
//! let identity = LocalIdentity::detect();
//! let work_dir = WorkDir::create(None)?;
//! let reporter = Arc::new(RunLog::create(work_dir.path())?);
//! let connector = Arc::new(SshConnector::new(config.auth_config()?, &identity.hostname));
//!
//! let outcome = Orchestrator::new(
//!     config,
//!     load_profiles(),
//!     connector,
//!     identity,
//!     reporter,
//!     CancelFlag::new(),
//!     work_dir.path().to_path_buf(),
//! )
//! .run()?;
//!
//! println!("Archive written to {}", outcome.archive.path.display());
//! work_dir.cleanup()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Run configuration and cluster option validation
//! - [`clusters`]: Cluster profiles and cluster type resolution
//! - [`nodes`]: Node connections and node list construction
//! - [`collectors`]: sosreport command construction and the collection scheduler
//! - [`utils`]: Working directory and archive assembly
//! - [`orchestrator`]: The end-to-end run
//! - [`reporting`]: Run logs
//! - [`security`]: Credential scrubbing and file name sanitizing

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models shared across the pipeline
pub mod models;

/// Cluster profiles and resolution
pub mod clusters;

/// sosreport collection scheduling
pub mod collectors;

/// Node connections and node list handling
pub mod nodes;

/// Working directory and archive utilities
pub mod utils;

/// Run configuration and cluster options
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Error types
pub mod error;

/// End-to-end collection run
pub mod orchestrator;

/// Diagnostic log and console transcript
pub mod reporting;

/// Security utilities for log output and file names
pub mod security;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
