//! Run reporting.
//!
//! Every component receives a [`Reporter`] instead of logging to global
//! handlers. The production implementation, [`RunLog`], keeps two files in the
//! working directory so they end up inside the final archive:
//!
//! - the diagnostic log, holding everything including internal-only detail
//! - the transcript, holding exactly what the operator saw on the console
//!
//! Console output goes through the `log` facade, initialised by the binary.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use log::{debug, error, info};

use crate::security::scrub_credentials;

/// Sink for run messages, shared by all components of a run
pub trait Reporter: Send + Sync {
    /// Diagnostic log, transcript and console
    fn info(&self, msg: &str);

    /// Diagnostic log, transcript and console at debug level
    fn debug(&self, msg: &str);

    /// Diagnostic log, transcript and console at error level
    fn error(&self, msg: &str);

    /// Transcript and console only
    fn console(&self, msg: &str);

    /// Diagnostic log only
    fn log(&self, msg: &str);

    /// Flush buffered output to disk
    fn flush(&self) {}

    /// On-disk log files, when the reporter keeps any
    fn log_files(&self) -> Option<LogFiles> {
        None
    }
}

/// Paths of the two run logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    pub diagnostic: PathBuf,
    pub transcript: PathBuf,
}

/// File-backed [`Reporter`] used for real runs
pub struct RunLog {
    diagnostic: Mutex<BufWriter<File>>,
    transcript: Mutex<BufWriter<File>>,
    files: LogFiles,
}

impl RunLog {
    /// Open both logs under temporary names inside `dir`
    pub fn create(dir: &Path) -> io::Result<Self> {
        let (diagnostic_file, diagnostic) = keep_temp_file(dir)?;
        let (transcript_file, transcript) = keep_temp_file(dir)?;

        Ok(Self {
            diagnostic: Mutex::new(BufWriter::new(diagnostic_file)),
            transcript: Mutex::new(BufWriter::new(transcript_file)),
            files: LogFiles { diagnostic, transcript },
        })
    }

    fn write_line(target: &Mutex<BufWriter<File>>, level: &str, msg: &str) {
        let line = format!(
            "{} {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level,
            scrub_credentials(msg)
        );
        // A poisoned writer only means another task panicked mid-line
        let mut writer = match target.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", line) {
            debug!("Failed to write run log line: {}", e);
        }
    }

    fn both(&self, level: &str, msg: &str) {
        Self::write_line(&self.diagnostic, level, msg);
        Self::write_line(&self.transcript, level, msg);
    }
}

fn keep_temp_file(dir: &Path) -> io::Result<(File, PathBuf)> {
    tempfile::Builder::new()
        .prefix("tmp")
        .suffix(".log")
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)
}

impl Reporter for RunLog {
    fn info(&self, msg: &str) {
        self.both("INFO", msg);
        info!("{}", msg);
    }

    fn debug(&self, msg: &str) {
        self.both("DEBUG", msg);
        debug!("{}", msg);
    }

    fn error(&self, msg: &str) {
        self.both("ERROR", msg);
        error!("{}", msg);
    }

    fn console(&self, msg: &str) {
        Self::write_line(&self.transcript, "INFO", msg);
        info!("{}", msg);
    }

    fn log(&self, msg: &str) {
        Self::write_line(&self.diagnostic, "INFO", msg);
    }

    fn flush(&self) {
        for target in [&self.diagnostic, &self.transcript] {
            if let Ok(mut writer) = target.lock() {
                if let Err(e) = writer.flush() {
                    debug!("Failed to flush run log: {}", e);
                }
            }
        }
    }

    fn log_files(&self) -> Option<LogFiles> {
        Some(self.files.clone())
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_log_routes_messages() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::create(dir.path()).unwrap();

        log.info("both logs");
        log.console("transcript only");
        log.log("diagnostic only");
        log.error("failure");
        log.flush();

        let files = log.log_files().unwrap();
        let diagnostic = fs::read_to_string(&files.diagnostic).unwrap();
        let transcript = fs::read_to_string(&files.transcript).unwrap();

        assert!(diagnostic.contains("INFO: both logs"));
        assert!(diagnostic.contains("diagnostic only"));
        assert!(diagnostic.contains("ERROR: failure"));
        assert!(!diagnostic.contains("transcript only"));

        assert!(transcript.contains("both logs"));
        assert!(transcript.contains("transcript only"));
        assert!(!transcript.contains("diagnostic only"));
    }

    #[test]
    fn test_run_log_files_live_in_dir() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::create(dir.path()).unwrap();
        let files = log.log_files().unwrap();

        assert_eq!(files.diagnostic.parent(), Some(dir.path()));
        assert_eq!(files.transcript.parent(), Some(dir.path()));
        assert_ne!(files.diagnostic, files.transcript);
    }

    #[test]
    fn test_run_log_scrubs_credentials() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::create(dir.path()).unwrap();
        log.log("sos cmd: sosreport --batch -k plugin.password=hunter2");
        log.flush();

        let diagnostic = fs::read_to_string(log.log_files().unwrap().diagnostic).unwrap();
        assert!(!diagnostic.contains("hunter2"));
    }
}
