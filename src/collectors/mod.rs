//! Per-node sosreport collection.
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │            Orchestrator               │
//! ├───────────────────────────────────────┤
//! │         CollectionScheduler           │
//! │   connect ─► rayon pool ─► channel    │
//! ├───────────────────────────────────────┤
//! │  NodeClient::run_collection(command)  │
//! │  ┌──────────┬──────────┬──────────┐   │
//! │  │  node 1  │  node 2  │   ...    │   │
//! │  └──────────┴──────────┴──────────┘   │
//! └───────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use sos_collector::collectors::command::RemoteCommand;
//! use sos_collector::config::RunConfig;
//!
//! let config = RunConfig {
//!     case_id: Some("01234567".to_string()),
//!     ..RunConfig::default()
//! };
//! let command = RemoteCommand::configure(&config, None);
//! assert_eq!(command.as_str(), "sosreport --batch --case-id='01234567'");
//! ```

/// sosreport command line construction
pub mod command;

/// Bounded worker pool running one collection per node
pub mod scheduler;

pub use command::RemoteCommand;
pub use scheduler::{CollectionReport, CollectionScheduler};
