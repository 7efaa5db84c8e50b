//! Composition root of a collection run.
//!
//! The orchestrator applies cluster options, picks the primary node,
//! resolves the cluster type, builds the node list, runs the scheduler and
//! finally hands the working directory to the archive builder. Every client
//! it opened is closed before it returns, on success and on failure.

use std::path::PathBuf;
use std::sync::Arc;

use crate::clusters::{resolve_cluster, ClusterProfile};
use crate::collectors::{CollectionReport, CollectionScheduler, RemoteCommand};
use crate::config::{apply_overrides, RunConfig};
use crate::constants::VERSION;
use crate::error::{CollectorError, Result};
use crate::models::{CancelFlag, Tally, UnreachableNode};
use crate::nodes::{
    build_node_list, host_width, prefer_local_hostname, reduce_node_list, LocalIdentity, NodeClient,
    NodeConnector, NodeListInputs,
};
use crate::reporting::Reporter;
use crate::utils::archive::{Archive, ArchiveBuilder};

/// What a successful run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub archive: Archive,
    pub tally: Tally,
    pub unreachable: Vec<UnreachableNode>,
}

pub struct Orchestrator {
    config: RunConfig,
    profiles: Vec<Box<dyn ClusterProfile>>,
    connector: Arc<dyn NodeConnector>,
    identity: LocalIdentity,
    reporter: Arc<dyn Reporter>,
    cancel: CancelFlag,
    work_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        profiles: Vec<Box<dyn ClusterProfile>>,
        connector: Arc<dyn NodeConnector>,
        identity: LocalIdentity,
        reporter: Arc<dyn Reporter>,
        cancel: CancelFlag,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            profiles,
            connector,
            identity,
            reporter,
            cancel,
            work_dir,
        }
    }

    /// Run the whole collection and build the archive
    pub fn run(mut self) -> Result<RunOutcome> {
        self.intro();

        let overrides = self.config.overrides()?;
        apply_overrides(&mut self.profiles, &overrides)?;

        let primary = self.connect_primary()?;
        let result = self.run_with_primary(&primary);

        primary.close();
        self.reporter.flush();
        result
    }

    fn intro(&self) {
        self.reporter.console(&format!("sos-collector (version {})", VERSION));
        self.reporter.console(
            "This utility is used to collect sosreports from multiple nodes \
             simultaneously. Collected reports are bundled into a single archive.",
        );
        if !self.config.password_auth {
            self.reporter.console(
                "Nodes must be set up for key-based SSH authentication or reachable \
                 through a running ssh-agent.",
            );
        }
        self.reporter.log(&format!("Run configuration: {:?}", self.config));
    }

    fn connect_primary(&self) -> Result<Arc<dyn NodeClient>> {
        match &self.config.master {
            Some(master) => {
                self.reporter.log(&format!("Connecting to master node {}", master));
                self.connector
                    .connect(master)
                    .map_err(|source| CollectorError::MasterUnreachable {
                        address: master.clone(),
                        source,
                    })
            }
            None => Ok(self.connector.local()),
        }
    }

    fn run_with_primary(&mut self, primary: &Arc<dyn NodeClient>) -> Result<RunOutcome> {
        let profiles = std::mem::take(&mut self.profiles);
        let profile = resolve_cluster(
            profiles,
            primary.as_ref(),
            self.config.cluster_type.as_deref(),
            !self.config.nodes.is_empty(),
            self.reporter.as_ref(),
        )?;
        let profile = profile.as_deref();

        let nodes = build_node_list(&self.config.nodes, profile, primary.as_ref())?;
        self.reporter.log(&format!("Node list: {:?}", nodes));
        let nodes = prefer_local_hostname(nodes, &self.identity, self.config.master.is_some());

        let master = self
            .config
            .master
            .as_deref()
            .map(|address| (address, primary.hostname()));
        let inputs = NodeListInputs {
            identity: &self.identity,
            exclude_local: self.config.skip_local(),
            master,
        };
        let nodes = reduce_node_list(nodes, &inputs);
        self.reporter.log(&format!("Node list reduced to {:?}", nodes));

        if nodes.is_empty() && !primary.is_connected() {
            return Err(CollectorError::NoNodes);
        }

        let width = host_width(&nodes, self.config.master.as_deref());
        self.reporter.console("\nThe following is a list of nodes to collect from:");
        if let Some(master) = &self.config.master {
            self.reporter.console(&format!("\t{:<width$} (master)", master, width = width));
        }
        for node in &nodes {
            self.reporter.console(&format!("\t{:<width$}", node, width = width));
        }

        let command = RemoteCommand::configure(&self.config, profile);
        self.reporter.log(&format!("Initial sos command set to {}", command));

        self.reporter.console("\nConnecting to nodes...");
        let scheduler = CollectionScheduler::new(
            self.connector.as_ref(),
            self.reporter.as_ref(),
            self.config.threads,
            self.config.skip_local(),
            self.cancel.clone(),
            &self.work_dir,
        );
        let report = scheduler.collect(&nodes, primary, &command, profile, width)?;
        self.finish(report)
    }

    fn finish(&self, report: CollectionReport) -> Result<RunOutcome> {
        let CollectionReport {
            tally,
            unreachable,
            clients,
            interrupted,
            ..
        } = report;

        for client in &clients {
            client.close();
        }

        if interrupted {
            return Err(CollectorError::Interrupted);
        }

        self.reporter.info(&format!(
            "Successfully captured {} of {} sosreports",
            tally.succeeded, tally.attempted
        ));
        if !unreachable.is_empty() {
            self.reporter.info(&format!(
                "{} node(s) could not be reached: {}",
                unreachable.len(),
                unreachable
                    .iter()
                    .map(|u| u.node.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if tally.succeeded == 0 {
            return Err(CollectorError::NoReportsCollected {
                attempted: tally.attempted,
            });
        }

        self.reporter.flush();
        let archive = ArchiveBuilder::new(self.config.name.as_deref(), self.config.case_id.as_deref()).build(
            &self.work_dir,
            &self.config.out_dir,
            self.reporter.log_files().as_ref(),
        )?;

        Ok(RunOutcome {
            archive,
            tally,
            unreachable,
        })
    }
}
