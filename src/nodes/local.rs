use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::collectors::command::{shell_quote, RemoteCommand};
use crate::constants::{EXTRA_BUNDLE_SUFFIX, REMOTE_SCRATCH_DIR};
use crate::error::NodeError;
use crate::nodes::{bundle_command, find_report_path, short_hostname, CommandOutput, NodeClient};

/// The collecting host, driven through `sh -c`
pub struct LocalNode {
    hostname: String,
    sudo_password: Option<String>,
    connected: AtomicBool,
}

impl LocalNode {
    pub fn new(hostname: &str, sudo_password: Option<String>) -> Self {
        Self {
            hostname: hostname.to_string(),
            sudo_password,
            connected: AtomicBool::new(true),
        }
    }

    fn io_err(&self, source: std::io::Error) -> NodeError {
        NodeError::Io {
            address: self.hostname.clone(),
            source,
        }
    }

    fn needs_sudo(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        euid != 0 && self.sudo_password.is_some()
    }

    fn checked(&self, command: &str) -> Result<CommandOutput, NodeError> {
        let output = self.run_command(command)?;
        if output.status != 0 {
            return Err(NodeError::Command {
                address: self.hostname.clone(),
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Move a file produced on this host into `dest_dir`
    fn take(&self, source: &str, dest_dir: &Path) -> Result<PathBuf, NodeError> {
        let file_name = Path::new(source).file_name().ok_or_else(|| NodeError::Transfer {
            address: self.hostname.clone(),
            remote: source.to_string(),
            reason: "path has no file name".to_string(),
        })?;
        let dest = dest_dir.join(file_name);

        if self.needs_sudo() {
            // SAFETY: getuid has no preconditions and cannot fail
            let uid = unsafe { libc::getuid() };
            self.checked(&format!("chown {} {}", uid, shell_quote(source)))?;
        }

        fs::copy(source, &dest).map_err(|e| self.io_err(e))?;
        if let Err(e) = fs::remove_file(source) {
            warn!("Could not remove {}: {}", source, e);
        }
        debug!("Moved {} to {}", source, dest.display());
        Ok(dest)
    }
}

impl NodeClient for LocalNode {
    fn address(&self) -> &str {
        &self.hostname
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn is_local(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput, NodeError> {
        let (program, args, stdin) = match &self.sudo_password {
            Some(password) if self.needs_sudo() => (
                "sudo",
                vec!["-S", "-p", "", "sh", "-c", command],
                Some(format!("{}\n", password)),
            ),
            _ => ("sh", vec!["-c", command], None),
        };

        let mut child = Command::new(program)
            .args(&args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.io_err(e))?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).map_err(|e| self.io_err(e))?;
        }

        let output = child.wait_with_output().map_err(|e| self.io_err(e))?;
        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn run_collection(&self, command: &RemoteCommand, dest_dir: &Path) -> Result<PathBuf, NodeError> {
        let output = self.checked(command.as_str())?;
        let report = find_report_path(&output.stdout).ok_or_else(|| NodeError::MissingArtifact {
            address: self.hostname.clone(),
        })?;
        self.take(&report, dest_dir)
    }

    fn run_extra_collection(&self, files: &[String], dest_dir: &Path) -> Result<PathBuf, NodeError> {
        let archive = format!(
            "{}/{}{}",
            REMOTE_SCRATCH_DIR,
            short_hostname(&self.hostname),
            EXTRA_BUNDLE_SUFFIX
        );
        self.checked(&bundle_command(files, &archive))?;
        for file in files {
            if let Err(e) = fs::remove_file(file) {
                debug!("Could not remove {}: {}", file, e);
            }
        }
        self.take(&archive, dest_dir)
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
