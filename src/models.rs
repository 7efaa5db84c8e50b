use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of one node's collection task
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult {
    pub node: String,
    pub hostname: String,
    pub artifact: Option<PathBuf>,
    pub error: Option<String>,
}

impl CollectionResult {
    pub fn collected(node: &str, hostname: &str, artifact: PathBuf) -> Self {
        Self {
            node: node.to_string(),
            hostname: hostname.to_string(),
            artifact: Some(artifact),
            error: None,
        }
    }

    pub fn failed(node: &str, hostname: &str, error: impl ToString) -> Self {
        Self {
            node: node.to_string(),
            hostname: hostname.to_string(),
            artifact: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.artifact.is_some()
    }
}

/// Attempted versus succeeded collection tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub attempted: usize,
    pub succeeded: usize,
}

impl Tally {
    pub fn new(attempted: usize) -> Self {
        Self { attempted, succeeded: 0 }
    }

    pub fn record(&mut self, result: &CollectionResult) {
        if result.is_success() {
            self.succeeded += 1;
        }
    }
}

/// A node whose connection attempt failed before any task was submitted
#[derive(Debug, Clone, PartialEq)]
pub struct UnreachableNode {
    pub node: String,
    pub reason: String,
}

/// Shared interrupt flag checked before each task starts
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
