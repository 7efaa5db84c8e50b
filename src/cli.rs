use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for sos-collector.
///
/// Every option that also exists in the YAML configuration file is optional
/// here so that a value given on the command line overrides the file only
/// when it is actually present.
#[derive(Parser, Debug)]
#[clap(
    name = "sos-collector",
    version,
    about = "Collect sosreports from multiple cluster nodes simultaneously"
)]
pub struct Args {
    /// Path to configuration YAML file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated list of nodes to collect from
    #[clap(short, long)]
    pub nodes: Option<String>,

    /// Master node used for cluster discovery instead of the local host
    #[clap(long)]
    pub master: Option<String>,

    /// Force a cluster type instead of detecting it
    #[clap(long)]
    pub cluster_type: Option<String>,

    /// Cluster option override in the form cluster.name=value (repeatable)
    #[clap(short = 'c', long = "cluster-option")]
    pub cluster_options: Vec<String>,

    /// Number of nodes to collect from concurrently
    #[clap(short, long)]
    pub threads: Option<usize>,

    /// Case id passed to sosreport and used in the archive name
    #[clap(long)]
    pub case_id: Option<String>,

    /// Label used in the archive name, typically the operator's name
    #[clap(long)]
    pub name: Option<String>,

    /// SSH user for remote nodes
    #[clap(long)]
    pub ssh_user: Option<String>,

    /// SSH port for remote nodes
    #[clap(long)]
    pub ssh_port: Option<u16>,

    /// Private key used for SSH authentication
    #[clap(short = 'i', long)]
    pub ssh_key: Option<PathBuf>,

    /// Use password authentication (password read from SOS_COLLECTOR_PASSWORD)
    #[clap(long)]
    pub password: bool,

    /// Connection timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Directory the final archive is written to
    #[clap(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Working directory for collected reports (default: new temporary directory)
    #[clap(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Do not collect a sosreport from the local host
    #[clap(long)]
    pub no_local: bool,

    /// Ask sosreport to verify installed packages
    #[clap(long)]
    pub verify: bool,

    /// Enable all sosreport plugin options
    #[clap(short, long)]
    pub alloptions: bool,

    /// Alternate root file system passed to sosreport
    #[clap(short, long)]
    pub sysroot: Option<String>,

    /// Chroot mode passed to sosreport
    #[clap(long)]
    pub chroot: Option<String>,

    /// Compression type passed to sosreport (auto, gzip, bzip2, xz)
    #[clap(short = 'z', long)]
    pub compression: Option<String>,

    /// Raw option line appended to sosreport, replacing all generated options
    #[clap(long = "sos-cmd")]
    pub sos_opt_line: Option<String>,

    /// List the options of every known cluster type and exit
    #[clap(short, long)]
    pub list_options: bool,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}
