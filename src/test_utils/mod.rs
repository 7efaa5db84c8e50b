//! Test utilities for sos-collector
//!
//! In-memory fakes for the node, profile and reporter seams so unit tests
//! can drive components without SSH or real clusters.

#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::clusters::ClusterProfile;
use crate::collectors::command::RemoteCommand;
use crate::config::{ClusterOption, ClusterOptions};
use crate::error::{EnumerationError, NodeError};
use crate::nodes::{CommandOutput, NodeClient};
use crate::reporting::Reporter;

/// Profile with a single boolean option `flag`, a fixed applicability
/// answer and call counters shared between clones
#[derive(Debug, Clone)]
pub struct FakeProfile {
    name: String,
    applicable: bool,
    options: ClusterOptions,
    nodes: Vec<String>,
    extra: Option<Vec<String>>,
    probes: Arc<AtomicUsize>,
    extra_runs: Arc<AtomicUsize>,
}

impl FakeProfile {
    pub fn new(name: &str, applicable: bool) -> Self {
        Self {
            name: name.to_string(),
            applicable,
            options: ClusterOptions::new(vec![ClusterOption::boolean(name, "flag", false, "Test flag")]),
            nodes: Vec::new(),
            extra: None,
            probes: Arc::new(AtomicUsize::new(0)),
            extra_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_nodes(mut self, nodes: &[&str]) -> Self {
        self.nodes = nodes.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_extra(mut self, files: &[&str]) -> Self {
        self.extra = Some(files.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn extra_runs(&self) -> usize {
        self.extra_runs.load(Ordering::SeqCst)
    }
}

impl ClusterProfile for FakeProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &ClusterOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ClusterOptions {
        &mut self.options
    }

    fn check_applicable(&self, _probe: &dyn NodeClient) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.applicable
    }

    fn enumerate_nodes(&self, _primary: &dyn NodeClient) -> Result<Vec<String>, EnumerationError> {
        Ok(self.nodes.clone())
    }

    fn supports_extra_collection(&self) -> bool {
        self.extra.is_some()
    }

    fn run_extra_command(&self, _primary: &dyn NodeClient) -> Result<Option<Vec<String>>, NodeError> {
        self.extra_runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.extra.clone())
    }
}

/// Node answering commands from canned output and writing fake reports
pub struct FakeNode {
    address: String,
    hostname: String,
    local: bool,
    failing: bool,
    outputs: Vec<(String, CommandOutput)>,
    commands: Mutex<Vec<String>>,
    extra_collections: AtomicUsize,
    connected: AtomicBool,
}

impl FakeNode {
    fn new(address: &str, local: bool) -> Self {
        Self {
            address: address.to_string(),
            hostname: address.to_string(),
            local,
            failing: false,
            outputs: Vec::new(),
            commands: Mutex::new(Vec::new()),
            extra_collections: AtomicUsize::new(0),
            connected: AtomicBool::new(true),
        }
    }

    pub fn local(address: &str) -> Self {
        Self::new(address, true)
    }

    pub fn remote(address: &str) -> Self {
        Self::new(address, false)
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    /// Commands containing `pattern` print `stdout` and succeed
    pub fn with_output(mut self, pattern: &str, stdout: &str) -> Self {
        self.outputs.push((
            pattern.to_string(),
            CommandOutput {
                status: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Commands containing `pattern` exit with `status`
    pub fn with_status(mut self, pattern: &str, status: i32) -> Self {
        self.outputs.push((
            pattern.to_string(),
            CommandOutput {
                status,
                ..CommandOutput::default()
            },
        ));
        self
    }

    /// Every collection on this node fails
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn extra_collections(&self) -> usize {
        self.extra_collections.load(Ordering::SeqCst)
    }

    fn write_artifact(&self, dest_dir: &Path, name: String) -> Result<PathBuf, NodeError> {
        let path = dest_dir.join(name);
        fs::write(&path, self.hostname.as_bytes()).map_err(|source| NodeError::Io {
            address: self.address.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl NodeClient for FakeNode {
    fn address(&self) -> &str {
        &self.address
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput, NodeError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(self
            .outputs
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }

    fn run_collection(&self, command: &RemoteCommand, dest_dir: &Path) -> Result<PathBuf, NodeError> {
        self.commands.lock().unwrap().push(command.to_string());
        if self.failing {
            return Err(NodeError::Command {
                address: self.address.clone(),
                command: command.to_string(),
                status: 1,
                stderr: "sosreport failed".to_string(),
            });
        }
        self.write_artifact(dest_dir, format!("sosreport-{}.tar.xz", self.hostname))
    }

    fn run_extra_collection(&self, _files: &[String], dest_dir: &Path) -> Result<PathBuf, NodeError> {
        self.extra_collections.fetch_add(1, Ordering::SeqCst);
        self.write_artifact(dest_dir, format!("{}-cluster-data.tar.gz", self.hostname))
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Reporter keeping every message in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn record(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, msg: &str) {
        self.record(msg);
    }

    fn debug(&self, msg: &str) {
        self.record(msg);
    }

    fn error(&self, msg: &str) {
        self.record(msg);
        self.errors.lock().unwrap().push(msg.to_string());
    }

    fn console(&self, msg: &str) {
        self.record(msg);
    }

    fn log(&self, msg: &str) {
        self.record(msg);
    }
}
