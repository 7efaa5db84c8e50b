//! Connections to the nodes being collected from.
//!
//! The scheduler and the cluster profiles only see the [`NodeClient`] and
//! [`NodeConnector`] traits. [`ssh`] provides the remote transport and
//! [`local`] runs the same operations on this host.

use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::collectors::command::RemoteCommand;
use crate::error::NodeError;

pub mod list;
pub mod local;
pub mod ssh;

pub use list::{build_node_list, host_width, prefer_local_hostname, reduce_node_list, NodeListInputs};
pub use local::LocalNode;
pub use ssh::{SshConnector, SshNode};

/// Exit status and captured output of one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A connected node
pub trait NodeClient: Send + Sync {
    /// Address the node was reached at
    fn address(&self) -> &str;

    /// Hostname reported by the node itself
    fn hostname(&self) -> &str;

    /// Whether this client runs on the collecting host
    fn is_local(&self) -> bool;

    fn is_connected(&self) -> bool;

    fn run_command(&self, command: &str) -> Result<CommandOutput, NodeError>;

    /// Run sosreport and copy the resulting archive into `dest_dir`
    fn run_collection(&self, command: &RemoteCommand, dest_dir: &Path) -> Result<PathBuf, NodeError>;

    /// Bundle `files` on the node and copy the bundle into `dest_dir`
    fn run_extra_collection(&self, files: &[String], dest_dir: &Path) -> Result<PathBuf, NodeError>;

    fn close(&self);
}

/// Opens connections to nodes
#[cfg_attr(test, mockall::automock)]
pub trait NodeConnector: Send + Sync {
    fn connect(&self, address: &str) -> Result<Arc<dyn NodeClient>, NodeError>;

    /// Client for the collecting host itself
    fn local(&self) -> Arc<dyn NodeClient>;
}

/// Who the collecting host is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalIdentity {
    pub hostname: String,
    pub ip_addrs: Vec<String>,
}

impl LocalIdentity {
    /// Detect the local hostname and the addresses it resolves to
    pub fn detect() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());

        let mut ip_addrs: Vec<String> = match (hostname.as_str(), 0).to_socket_addrs() {
            Ok(addrs) => addrs.map(|a| a.ip().to_string()).collect(),
            Err(e) => {
                debug!("Could not resolve local hostname {}: {}", hostname, e);
                Vec::new()
            }
        };
        ip_addrs.sort();
        ip_addrs.dedup();

        Self { hostname, ip_addrs }
    }

    pub fn short_hostname(&self) -> &str {
        short_hostname(&self.hostname)
    }
}

/// Hostname up to the first `.`
pub fn short_hostname(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

lazy_static! {
    static ref REPORT_PATH: Regex = Regex::new(r"(/[^\s]*sosreport-[^\s]*\.tar(\.\w+)?)").unwrap();
}

/// Pull the generated archive path out of sosreport's output
pub fn find_report_path(output: &str) -> Option<String> {
    REPORT_PATH
        .captures_iter(output)
        .last()
        .map(|c| c[1].to_string())
}

/// Shell snippet bundling `files` into a tarball at `archive`
pub(crate) fn bundle_command(files: &[String], archive: &str) -> String {
    let quoted: Vec<String> = files.iter().map(|f| crate::collectors::command::shell_quote(f)).collect();
    format!(
        "tar -czf {} {}",
        crate::collectors::command::shell_quote(archive),
        quoted.join(" ")
    )
}
