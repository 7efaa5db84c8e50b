//! Shared fakes for the integration tests.
//!
//! Nodes write a small file as their "sosreport" so the archive stage has
//! real input, and can record how many collections run at the same time.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use sos_collector::clusters::ClusterProfile;
use sos_collector::collectors::RemoteCommand;
use sos_collector::config::{ClusterOption, ClusterOptions};
use sos_collector::error::{EnumerationError, NodeError};
use sos_collector::nodes::{CommandOutput, NodeClient, NodeConnector};

pub const LOCAL_HOSTNAME: &str = "collector.example.com";

/// Tracks concurrently running collections
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

pub struct TestNode {
    address: String,
    local: bool,
    fail: bool,
    delay: Duration,
    gauge: Arc<Gauge>,
    connected: AtomicBool,
}

impl NodeClient for TestNode {
    fn address(&self) -> &str {
        &self.address
    }

    fn hostname(&self) -> &str {
        &self.address
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn run_command(&self, _command: &str) -> Result<CommandOutput, NodeError> {
        Ok(CommandOutput::default())
    }

    fn run_collection(&self, command: &RemoteCommand, dest_dir: &Path) -> Result<PathBuf, NodeError> {
        self.gauge.enter();
        thread::sleep(self.delay);
        self.gauge.exit();

        if self.fail {
            return Err(NodeError::Command {
                address: self.address.clone(),
                command: command.to_string(),
                status: 1,
                stderr: "plugin timeout".to_string(),
            });
        }

        let path = dest_dir.join(format!("sosreport-{}-2024-01-01-abcdef.tar.xz", self.address));
        fs::write(&path, self.address.as_bytes()).map_err(|source| NodeError::Io {
            address: self.address.clone(),
            source,
        })?;
        Ok(path)
    }

    fn run_extra_collection(&self, _files: &[String], dest_dir: &Path) -> Result<PathBuf, NodeError> {
        Ok(dest_dir.to_path_buf())
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Connector handing out [`TestNode`]s
#[derive(Default)]
pub struct TestConnector {
    pub unreachable: HashSet<String>,
    pub failing: HashSet<String>,
    pub delay: Duration,
    pub gauge: Arc<Gauge>,
    pub connects: AtomicUsize,
    /// Every address passed to `connect`, in call order
    pub addresses: Mutex<Vec<String>>,
}

impl TestConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable(mut self, nodes: &[&str]) -> Self {
        self.unreachable.extend(nodes.iter().map(|n| n.to_string()));
        self
    }

    pub fn failing(mut self, nodes: &[&str]) -> Self {
        self.failing.extend(nodes.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn connected_to(&self) -> Vec<String> {
        self.addresses.lock().unwrap().clone()
    }

    fn node(&self, address: &str, local: bool) -> TestNode {
        TestNode {
            address: address.to_string(),
            local,
            fail: self.failing.contains(address),
            delay: self.delay,
            gauge: Arc::clone(&self.gauge),
            connected: AtomicBool::new(true),
        }
    }
}

impl NodeConnector for TestConnector {
    fn connect(&self, address: &str) -> Result<Arc<dyn NodeClient>, NodeError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().unwrap().push(address.to_string());
        if self.unreachable.contains(address) {
            return Err(NodeError::Connect {
                address: address.to_string(),
                reason: "connection timed out".to_string(),
            });
        }
        Ok(Arc::new(self.node(address, false)))
    }

    fn local(&self) -> Arc<dyn NodeClient> {
        Arc::new(self.node(LOCAL_HOSTNAME, true))
    }
}

/// Profile tagged `cluster` with one boolean option `flag`
#[derive(Debug, Clone)]
pub struct TestProfile {
    applicable: bool,
    nodes: Vec<String>,
    options: ClusterOptions,
}

impl TestProfile {
    pub fn new(applicable: bool, nodes: &[&str]) -> Self {
        Self {
            applicable,
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            options: ClusterOptions::new(vec![ClusterOption::boolean("cluster", "flag", false, "Test flag")]),
        }
    }

    pub fn boxed(self) -> Vec<Box<dyn ClusterProfile>> {
        vec![Box::new(self)]
    }
}

impl ClusterProfile for TestProfile {
    fn name(&self) -> &str {
        "cluster"
    }

    fn options(&self) -> &ClusterOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ClusterOptions {
        &mut self.options
    }

    fn check_applicable(&self, _probe: &dyn NodeClient) -> bool {
        self.applicable
    }

    fn enumerate_nodes(&self, _primary: &dyn NodeClient) -> Result<Vec<String>, EnumerationError> {
        Ok(self.nodes.clone())
    }
}

/// Count files per name in a directory
pub fn dir_listing(dir: &Path) -> HashMap<String, u64> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (e.file_name().to_string_lossy().to_string(), e.metadata().unwrap().len())
        })
        .collect()
}
