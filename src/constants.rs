//! Global constants for the sos-collector application.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

/// Collector version reported in the banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Archive naming
/// Fixed prefix of every generated archive name
pub const ARCHIVE_PREFIX: &str = "sos-collector";

/// Extension of the final archive
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Length of the random lowercase suffix appended to archive names
pub const ARCHIVE_SUFFIX_LEN: usize = 5;

/// Canonical member name of the diagnostic log inside the archive
pub const DIAGNOSTIC_LOG_NAME: &str = "sos-collector.log";

/// Canonical member name of the user-facing transcript inside the archive
pub const TRANSCRIPT_LOG_NAME: &str = "ui.log";

/// Suffix of the bundle fetched by a profile's extra collection
pub const EXTRA_BUNDLE_SUFFIX: &str = "-cluster-data.tar.gz";

/// Files matching this pattern are removed from a user-supplied working directory
pub const REPORT_FILE_PATTERN: &str = r"^(sosreport-.*\.tar|.+-cluster-data\.tar\.gz$)";

// Working directory
/// Prefix of the temporary working directory created per run
pub const WORK_DIR_PREFIX: &str = "sos-collector-";

/// Default directory the final archive is written to
pub const DEFAULT_OUT_DIR: &str = "/var/tmp";

/// Remote directory used for intermediate files of the extra collection
pub const REMOTE_SCRATCH_DIR: &str = "/var/tmp";

// Collection
/// Default number of nodes collected from concurrently
pub const DEFAULT_THREADS: usize = 4;

/// Command every node runs unless the user supplies an option line
pub const BASE_SOS_COMMAND: &str = "sosreport --batch";

/// Compression types accepted by sosreport's `-z` flag
pub const SOS_COMPRESSION_TYPES: &[&str] = &["auto", "gzip", "bzip2", "xz"];

// SSH
/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default SSH user
pub const DEFAULT_SSH_USER: &str = "root";

/// Default connection timeout in seconds
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Buffer size for artifact transfers (1MB)
pub const TRANSFER_BUFFER_SIZE: usize = 1024 * 1024;

// Environment
/// Environment variable holding the SSH password for password authentication
pub const PASSWORD_ENV: &str = "SOS_COLLECTOR_PASSWORD";

/// Environment variable holding the sudo password for non-root users
pub const SUDO_PASSWORD_ENV: &str = "SOS_COLLECTOR_SUDO_PASSWORD";

// Error messages
pub const ERROR_FAILED_TO_CREATE_SESSION: &str = "Failed to create SSH session";
pub const ERROR_FAILED_TO_CREATE_SFTP: &str = "Failed to create SFTP subsystem";
pub const ERROR_AUTHENTICATION_FAILED: &str = "Authentication failed";
