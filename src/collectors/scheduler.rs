//! Bounded-concurrency collection.
//!
//! Connections are opened up front on the calling thread. Each connected
//! node then gets one task on a rayon pool capped at the configured limit;
//! tasks hand their [`CollectionResult`] back over a crossbeam channel and the
//! calling thread does all of the accounting.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam::channel::unbounded;
use rayon::ThreadPoolBuilder;

use crate::clusters::ClusterProfile;
use crate::collectors::command::RemoteCommand;
use crate::error::{CollectorError, Result};
use crate::models::{CancelFlag, CollectionResult, Tally, UnreachableNode};
use crate::nodes::{NodeClient, NodeConnector};
use crate::reporting::Reporter;

/// Everything a finished (or interrupted) collection produced
pub struct CollectionReport {
    pub results: Vec<CollectionResult>,
    pub tally: Tally,
    pub unreachable: Vec<UnreachableNode>,
    /// Every client a task ran on, primary first when it took part
    pub clients: Vec<Arc<dyn NodeClient>>,
    pub interrupted: bool,
}

pub struct CollectionScheduler<'a> {
    connector: &'a dyn NodeConnector,
    reporter: &'a dyn Reporter,
    limit: usize,
    skip_local: bool,
    cancel: CancelFlag,
    work_dir: PathBuf,
}

impl<'a> CollectionScheduler<'a> {
    pub fn new(
        connector: &'a dyn NodeConnector,
        reporter: &'a dyn Reporter,
        limit: usize,
        skip_local: bool,
        cancel: CancelFlag,
        work_dir: &Path,
    ) -> Self {
        Self {
            connector,
            reporter,
            limit: limit.max(1),
            skip_local,
            cancel,
            work_dir: work_dir.to_path_buf(),
        }
    }

    /// Open a client for every node the primary does not already cover.
    ///
    /// Failed connections are returned separately and never become tasks.
    pub fn connect_all(
        &self,
        nodes: &BTreeSet<String>,
        primary: &Arc<dyn NodeClient>,
    ) -> (Vec<Arc<dyn NodeClient>>, Vec<UnreachableNode>) {
        let mut clients = Vec::new();
        let mut unreachable = Vec::new();

        if primary.is_connected() {
            if primary.is_local() && self.skip_local {
                self.reporter.log(&format!("Local collection disabled, skipping {}", primary.hostname()));
            } else {
                clients.push(Arc::clone(primary));
            }
        }

        for node in nodes {
            if node == primary.address() || node == primary.hostname() {
                continue;
            }
            match self.connector.connect(node) {
                Ok(client) => clients.push(client),
                Err(e) => {
                    self.reporter.error(&format!("Could not connect to {}: {}", node, e));
                    unreachable.push(UnreachableNode {
                        node: node.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (clients, unreachable)
    }

    /// Collect from every node in `nodes`, then run the profile's extra
    /// collection once on the primary
    pub fn collect(
        &self,
        nodes: &BTreeSet<String>,
        primary: &Arc<dyn NodeClient>,
        command: &RemoteCommand,
        profile: Option<&dyn ClusterProfile>,
        width: usize,
    ) -> Result<CollectionReport> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.limit)
            .thread_name(|i| format!("collector-{}", i))
            .build()
            .map_err(|e| CollectorError::WorkerPool(e.to_string()))?;

        let (clients, unreachable) = self.connect_all(nodes, primary);
        let mut tally = Tally::new(clients.len());
        let mut results = Vec::with_capacity(clients.len());

        self.reporter.log(&format!(
            "Collecting from {} node(s) with up to {} concurrent task(s)",
            clients.len(),
            self.limit
        ));

        let (sender, receiver) = unbounded::<CollectionResult>();
        pool.in_place_scope(|scope| {
            for client in &clients {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    let result = self.run_task(client.as_ref(), command, width);
                    // The receiver outlives every task in this scope
                    let _ = sender.send(result);
                });
            }
            drop(sender);

            for result in receiver.iter() {
                tally.record(&result);
                results.push(result);
                self.reporter.log(&format!(
                    "{} of {} collection task(s) finished, {} succeeded",
                    results.len(),
                    tally.attempted,
                    tally.succeeded
                ));
            }
        });

        let interrupted = self.cancel.is_cancelled();
        if !interrupted {
            if let Some(profile) = profile.filter(|p| p.supports_extra_collection()) {
                self.run_extra(profile, primary.as_ref());
            }
        }

        Ok(CollectionReport {
            results,
            tally,
            unreachable,
            clients,
            interrupted,
        })
    }

    fn run_task(&self, client: &dyn NodeClient, command: &RemoteCommand, width: usize) -> CollectionResult {
        let hostname = client.hostname();

        if self.cancel.is_cancelled() {
            return CollectionResult::failed(client.address(), hostname, "collection cancelled");
        }

        self.reporter
            .console(&format!("{:<width$}  : Generating sosreport...", hostname, width = width));

        match client.run_collection(command, &self.work_dir) {
            Ok(artifact) => {
                self.reporter.console(&format!(
                    "{:<width$}  : Retrieved sosreport {}",
                    hostname,
                    artifact.display(),
                    width = width
                ));
                CollectionResult::collected(client.address(), hostname, artifact)
            }
            Err(e) => {
                self.reporter
                    .error(&format!("{:<width$}  : {}", hostname, e, width = width));
                CollectionResult::failed(client.address(), hostname, e)
            }
        }
    }

    fn run_extra(&self, profile: &dyn ClusterProfile, primary: &dyn NodeClient) {
        self.reporter
            .info(&format!("Collecting additional {} data from {}", profile.name(), primary.hostname()));

        let files = match profile.run_extra_command(primary) {
            Ok(Some(files)) if !files.is_empty() => files,
            Ok(_) => return,
            Err(e) => {
                self.reporter.error(&format!("Extra {} collection failed: {}", profile.name(), e));
                return;
            }
        };

        match primary.run_extra_collection(&files, &self.work_dir) {
            Ok(path) => self.reporter.log(&format!("Retrieved cluster data {}", path.display())),
            Err(e) => self
                .reporter
                .error(&format!("Could not retrieve {} data: {}", profile.name(), e)),
        }
    }
}
