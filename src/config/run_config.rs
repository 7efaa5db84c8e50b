use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::config::options::OptionOverride;
use crate::constants::{
    DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_OUT_DIR, DEFAULT_SSH_PORT, DEFAULT_SSH_USER,
    DEFAULT_THREADS, PASSWORD_ENV, SOS_COMPRESSION_TYPES, SUDO_PASSWORD_ENV,
};
use crate::error::{CollectorError, Result};

/// Run parameters shared by every component.
///
/// Built once from the YAML file and the command line, validated, and never
/// mutated after scheduling starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub case_id: Option<String>,
    /// Label used in the archive name
    pub name: Option<String>,
    pub threads: usize,
    pub ssh_user: String,
    pub ssh_port: u16,
    pub ssh_key: Option<PathBuf>,
    pub password_auth: bool,
    pub connect_timeout_secs: u64,
    pub out_dir: PathBuf,
    pub tmp_dir: Option<PathBuf>,
    pub nodes: Vec<String>,
    pub master: Option<String>,
    pub cluster_type: Option<String>,
    pub cluster_options: BTreeMap<String, serde_yaml::Value>,
    #[serde(skip)]
    pub cli_cluster_options: Vec<String>,
    pub no_local: bool,
    pub verify: bool,
    pub alloptions: bool,
    pub sysroot: Option<String>,
    pub chroot: Option<String>,
    pub compression: Option<String>,
    pub sos_opt_line: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            case_id: None,
            name: None,
            threads: DEFAULT_THREADS,
            ssh_user: DEFAULT_SSH_USER.to_string(),
            ssh_port: DEFAULT_SSH_PORT,
            ssh_key: None,
            password_auth: false,
            connect_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            tmp_dir: None,
            nodes: Vec::new(),
            master: None,
            cluster_type: None,
            cluster_options: BTreeMap::new(),
            cli_cluster_options: Vec::new(),
            no_local: false,
            verify: false,
            alloptions: false,
            sysroot: None,
            chroot: None,
            compression: None,
            sos_opt_line: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: RunConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Build the run configuration from the optional config file and the
    /// command line. Command-line values win.
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        if let Some(nodes) = &args.nodes {
            self.nodes = parse_node_list(nodes);
        }
        set_opt(&mut self.master, &args.master);
        set_opt(&mut self.cluster_type, &args.cluster_type);
        set(&mut self.threads, &args.threads);
        set_opt(&mut self.case_id, &args.case_id);
        set_opt(&mut self.name, &args.name);
        set(&mut self.ssh_user, &args.ssh_user);
        set(&mut self.ssh_port, &args.ssh_port);
        set_opt(&mut self.ssh_key, &args.ssh_key);
        set(&mut self.connect_timeout_secs, &args.timeout);
        set(&mut self.out_dir, &args.out_dir);
        set_opt(&mut self.tmp_dir, &args.tmp_dir);
        set_opt(&mut self.sysroot, &args.sysroot);
        set_opt(&mut self.chroot, &args.chroot);
        set_opt(&mut self.compression, &args.compression);
        set_opt(&mut self.sos_opt_line, &args.sos_opt_line);

        self.password_auth |= args.password;
        self.no_local |= args.no_local;
        self.verify |= args.verify;
        self.alloptions |= args.alloptions;
        self.cli_cluster_options.extend(args.cluster_options.iter().cloned());
    }

    /// Reject settings that can never lead to a successful run
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(CollectorError::Config(
                "The number of concurrent collections must be at least 1".to_string(),
            ));
        }
        if let Some(compression) = &self.compression {
            if !SOS_COMPRESSION_TYPES.contains(&compression.as_str()) {
                return Err(CollectorError::Config(format!(
                    "Unsupported compression type '{}'. Expected one of: {}",
                    compression,
                    SOS_COMPRESSION_TYPES.join(", ")
                )));
            }
        }
        if self.master.as_deref().map(str::trim) == Some("") {
            return Err(CollectorError::Config("Master node may not be empty".to_string()));
        }
        Ok(())
    }

    /// All cluster option overrides, file entries first
    pub fn overrides(&self) -> Result<Vec<OptionOverride>> {
        let mut overrides = self
            .cluster_options
            .iter()
            .map(|(key, value)| OptionOverride::from_yaml(key, value))
            .collect::<Result<Vec<_>>>()?;
        for raw in &self.cli_cluster_options {
            overrides.push(raw.parse()?);
        }
        Ok(overrides)
    }

    /// Whether local collection is disabled, either explicitly or because a
    /// master node was designated
    pub fn skip_local(&self) -> bool {
        self.no_local || self.master.is_some()
    }

    /// Resolve authentication settings, reading secrets from the environment
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let password = if self.password_auth {
            Some(std::env::var(PASSWORD_ENV).map_err(|_| {
                CollectorError::Config(format!(
                    "Password authentication requested but {} is not set",
                    PASSWORD_ENV
                ))
            })?)
        } else {
            None
        };

        Ok(AuthConfig {
            user: self.ssh_user.clone(),
            port: self.ssh_port,
            private_key: self.ssh_key.clone(),
            password,
            sudo_password: std::env::var(SUDO_PASSWORD_ENV).ok(),
            timeout: Duration::from_secs(self.connect_timeout_secs),
        })
    }
}

/// Split a comma-separated node list, dropping blank entries
pub fn parse_node_list(nodes: &str) -> Vec<String> {
    nodes
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

/// Credentials and connection settings for remote nodes
#[derive(Clone)]
pub struct AuthConfig {
    pub user: String,
    pub port: u16,
    pub private_key: Option<PathBuf>,
    pub password: Option<String>,
    pub sudo_password: Option<String>,
    pub timeout: Duration,
}

impl AuthConfig {
    /// Whether commands must be wrapped in sudo
    pub fn needs_sudo(&self) -> bool {
        self.user != "root" && self.sudo_password.is_some()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user)
            .field("port", &self.port)
            .field("private_key", &self.private_key)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sudo_password", &self.sudo_password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
