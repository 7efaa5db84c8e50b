use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use ssh2::Session;

use crate::collectors::command::{shell_quote, RemoteCommand};
use crate::config::AuthConfig;
use crate::constants::{
    ERROR_AUTHENTICATION_FAILED, ERROR_FAILED_TO_CREATE_SESSION, EXTRA_BUNDLE_SUFFIX, ERROR_FAILED_TO_CREATE_SFTP,
    REMOTE_SCRATCH_DIR, TRANSFER_BUFFER_SIZE,
};
use crate::error::NodeError;
use crate::nodes::{bundle_command, find_report_path, short_hostname, CommandOutput, LocalNode, NodeClient, NodeConnector};

/// A node reached over SSH
pub struct SshNode {
    address: String,
    hostname: String,
    session: Mutex<Session>,
    auth: AuthConfig,
    connected: AtomicBool,
}

impl SshNode {
    /// Open and authenticate a session, then ask the node for its hostname
    pub fn connect(address: &str, auth: &AuthConfig) -> Result<Self, NodeError> {
        let session = create_session(address, auth)?;
        let mut node = Self {
            address: address.to_string(),
            hostname: address.to_string(),
            session: Mutex::new(session),
            auth: auth.clone(),
            connected: AtomicBool::new(true),
        };

        let output = node.run_command("hostname")?;
        let reported = output.stdout.trim();
        if output.status == 0 && !reported.is_empty() {
            node.hostname = reported.to_string();
        }
        debug!("Connected to {} (hostname {})", node.address, node.hostname);
        Ok(node)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        match self.session.lock() {
            Ok(session) => session,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ssh_err(&self, e: impl ToString) -> NodeError {
        NodeError::Connect {
            address: self.address.clone(),
            reason: e.to_string(),
        }
    }

    /// Execute `command` in a fresh channel, feeding `stdin` when given
    fn exec(&self, command: &str, stdin: Option<&str>) -> Result<CommandOutput, NodeError> {
        let session = self.session();
        let mut channel = session.channel_session().map_err(|e| self.ssh_err(e))?;
        channel.exec(command).map_err(|e| self.ssh_err(e))?;

        if let Some(input) = stdin {
            channel
                .write_all(input.as_bytes())
                .map_err(|e| self.io_err(e))?;
        }
        channel.send_eof().map_err(|e| self.ssh_err(e))?;

        let mut stdout = String::new();
        channel.read_to_string(&mut stdout).map_err(|e| self.io_err(e))?;
        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| self.io_err(e))?;

        channel.wait_close().map_err(|e| self.ssh_err(e))?;
        let status = channel.exit_status().map_err(|e| self.ssh_err(e))?;

        Ok(CommandOutput { status, stdout, stderr })
    }

    fn io_err(&self, source: io::Error) -> NodeError {
        NodeError::Io {
            address: self.address.clone(),
            source,
        }
    }

    fn checked(&self, command: &str) -> Result<CommandOutput, NodeError> {
        let output = self.run_command(command)?;
        if output.status != 0 {
            return Err(NodeError::Command {
                address: self.address.clone(),
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Copy a remote file into `dest_dir` over SFTP
    fn fetch(&self, remote: &str, dest_dir: &Path) -> Result<PathBuf, NodeError> {
        let transfer_err = |reason: String| NodeError::Transfer {
            address: self.address.clone(),
            remote: remote.to_string(),
            reason,
        };

        if self.auth.needs_sudo() {
            // Reports are written root-only
            self.checked(&format!("chown {} {}", shell_quote(&self.auth.user), shell_quote(remote)))?;
        }

        let file_name = Path::new(remote)
            .file_name()
            .ok_or_else(|| transfer_err("remote path has no file name".to_string()))?;
        let local_path = dest_dir.join(file_name);

        let bytes = {
            let session = self.session();
            let sftp = session
                .sftp()
                .map_err(|e| transfer_err(format!("{}: {}", ERROR_FAILED_TO_CREATE_SFTP, e)))?;
            let mut remote_file = sftp
                .open(Path::new(remote))
                .map_err(|e| transfer_err(e.to_string()))?;

            let local_file = File::create(&local_path).map_err(|e| self.io_err(e))?;
            let mut writer = BufWriter::with_capacity(TRANSFER_BUFFER_SIZE, local_file);
            let bytes = io::copy(&mut remote_file, &mut writer).map_err(|e| transfer_err(e.to_string()))?;
            writer.flush().map_err(|e| self.io_err(e))?;
            bytes
        };

        debug!("Fetched {} ({} bytes) from {}", remote, bytes, self.address);
        self.remove_remote(remote);
        Ok(local_path)
    }

    fn remove_remote(&self, remote: &str) {
        let command = format!("rm -f {}", shell_quote(remote));
        match self.run_command(&command) {
            Ok(o) if o.status == 0 => {}
            Ok(o) => warn!("Could not remove {} on {}: {}", remote, self.address, o.stderr.trim()),
            Err(e) => warn!("Could not remove {} on {}: {}", remote, self.address, e),
        }
    }
}

fn create_session(address: &str, auth: &AuthConfig) -> Result<Session, NodeError> {
    let connect_err = |reason: String| NodeError::Connect {
        address: address.to_string(),
        reason,
    };

    let socket_addr = (address, auth.port)
        .to_socket_addrs()
        .map_err(|e| connect_err(e.to_string()))?
        .next()
        .ok_or_else(|| connect_err("address did not resolve".to_string()))?;

    let tcp = TcpStream::connect_timeout(&socket_addr, auth.timeout)
        .map_err(|e| connect_err(e.to_string()))?;

    let mut session = Session::new()
        .map_err(|e| connect_err(format!("{}: {}", ERROR_FAILED_TO_CREATE_SESSION, e)))?;
    session.set_tcp_stream(tcp);
    // Bounded handshake and auth; sosreport itself may run for many minutes
    session.set_timeout(auth.timeout.as_millis().min(u32::MAX as u128) as u32);
    session
        .handshake()
        .map_err(|e| connect_err(format!("SSH handshake failed: {}", e)))?;

    let auth_result = if let Some(password) = &auth.password {
        session.userauth_password(&auth.user, password)
    } else if let Some(key) = &auth.private_key {
        session.userauth_pubkey_file(&auth.user, None, key, None)
    } else {
        session.userauth_agent(&auth.user)
    };

    if let Err(e) = auth_result {
        debug!("{} for {}@{}: {}", ERROR_AUTHENTICATION_FAILED, auth.user, address, e);
    }
    if !session.authenticated() {
        return Err(NodeError::Auth {
            address: address.to_string(),
            user: auth.user.clone(),
        });
    }

    session.set_timeout(0);
    Ok(session)
}

impl NodeClient for SshNode {
    fn address(&self) -> &str {
        &self.address
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn is_local(&self) -> bool {
        false
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput, NodeError> {
        match &self.auth.sudo_password {
            Some(password) if self.auth.needs_sudo() => {
                let wrapped = format!("sudo -S -p '' sh -c {}", shell_quote(command));
                self.exec(&wrapped, Some(&format!("{}\n", password)))
            }
            _ => self.exec(command, None),
        }
    }

    fn run_collection(&self, command: &RemoteCommand, dest_dir: &Path) -> Result<PathBuf, NodeError> {
        let output = self.checked(command.as_str())?;
        let remote = find_report_path(&output.stdout).ok_or_else(|| NodeError::MissingArtifact {
            address: self.address.clone(),
        })?;
        self.fetch(&remote, dest_dir)
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
            self.remove_remote(file);
        }
        self.fetch(&archive, dest_dir)
    }

    fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.session().disconnect(None, "collection finished", None) {
                debug!("Error closing session to {}: {}", self.address, e);
            }
        }
    }
}

/// Opens [`SshNode`]s with one set of credentials
pub struct SshConnector {
    auth: AuthConfig,
    local_hostname: String,
}

impl SshConnector {
    pub fn new(auth: AuthConfig, local_hostname: &str) -> Self {
        Self {
            auth,
            local_hostname: local_hostname.to_string(),
        }
    }
}

impl NodeConnector for SshConnector {
    fn connect(&self, address: &str) -> Result<Arc<dyn NodeClient>, NodeError> {
        Ok(Arc::new(SshNode::connect(address, &self.auth)?))
    }

    fn local(&self) -> Arc<dyn NodeClient> {
        Arc::new(LocalNode::new(&self.local_hostname, self.auth.sudo_password.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;

    fn auth() -> AuthConfig {
        AuthConfig {
            user: "root".to_string(),
            port: 22,
            private_key: None,
            password: None,
            sudo_password: None,
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_connect_refused_is_connect_error() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = AuthConfig { port, ..auth() };

        let err = SshNode::connect("127.0.0.1", &config).err().unwrap();
        assert!(matches!(err, NodeError::Connect { ref address, .. } if address == "127.0.0.1"));
    }

    #[test]
    fn test_connector_local_client() {
        let connector = SshConnector::new(auth(), "collector.example.com");
        let local = connector.local();
        assert!(local.is_local());
        assert_eq!(local.hostname(), "collector.example.com");
    }
}
