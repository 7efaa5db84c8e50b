//! Error types for the collection pipeline.
//!
//! [`CollectorError`] covers every condition that aborts a run. Failures that
//! are local to a single node are [`NodeError`]s and never leave the task that
//! produced them; cluster profiles report discovery problems as
//! [`EnumerationError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::config::OptionKind;

/// Result type alias for fallible run-level operations
pub type Result<T, E = CollectorError> = std::result::Result<T, E>;

/// Fatal conditions that abort a collection run
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown cluster type provided: {0}")]
    UnknownCluster(String),

    #[error("Unknown option provided: {cluster}.{name}")]
    UnknownOption { cluster: String, name: String },

    #[error("Invalid option type for {name}. Expected {expected} got {actual}")]
    OptionType {
        name: String,
        expected: OptionKind,
        actual: OptionKind,
    },

    #[error("Invalid value '{value}' for {name}. Accepted values are: 'true', 'false', 'on', 'off'")]
    OptionValue { name: String, value: String },

    #[error("Could not connect to master node {address}: {source}")]
    MasterUnreachable {
        address: String,
        #[source]
        source: NodeError,
    },

    #[error("Cluster type could not be determined and no nodes provided")]
    Unresolvable,

    #[error("Could not get node list from cluster {cluster}: {source}")]
    Enumeration {
        cluster: String,
        #[source]
        source: EnumerationError,
    },

    #[error("No nodes were detected, or nodes do not have sos installed")]
    NoNodes,

    #[error("No sosreports were collected from {attempted} node(s), nothing to archive")]
    NoReportsCollected { attempted: usize },

    #[error("Collection interrupted")]
    Interrupted,

    #[error("Could not start collection workers: {0}")]
    WorkerPool(String),

    #[error("Could not create archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a single node's connection or collection task
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("Authentication failed for {user}@{address}")]
    Auth { address: String, user: String },

    #[error("Command '{command}' failed on {address} with status {status}: {stderr}")]
    Command {
        address: String,
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("No sosreport archive reported by {address}")]
    MissingArtifact { address: String },

    #[error("Failed to transfer {remote} from {address}: {reason}")]
    Transfer {
        address: String,
        remote: String,
        reason: String,
    },

    #[error("IO error on {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of a cluster profile's node discovery
#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("cluster reported no nodes")]
    Empty,

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("unexpected output: {0}")]
    Parse(String),
}
