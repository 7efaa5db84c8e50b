//! Credential scrubbing for run logs.
//!
//! Command lines, remote stderr and cluster query output end up in the
//! diagnostic log that is shipped inside the archive. Every line passes
//! through [`scrub_credentials`] before it is written.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex patterns for detecting credentials in log lines
    static ref CREDENTIAL_PATTERNS: Vec<(Regex, &'static str)> = vec![
        // Passwords passed as options or environment assignments
        (Regex::new(r"(?i)(password|passwd|pwd)\s*[:=]\s*([^\s]+)").unwrap(),
         "$1=<REDACTED_PASSWORD>"),

        // Bearer tokens from kubeconfig or API errors
        (Regex::new(r"(?i)(bearer|authorization|token)\s*[:=]?\s*(bearer\s+)?([A-Za-z0-9\-._~+/]{20,}=*)").unwrap(),
         "$1=<REDACTED_TOKEN>"),

        // Database connection strings
        (Regex::new(r"(?i)(postgres|postgresql|mysql)://([^:]+):([^@]+)@").unwrap(),
         "$1://<REDACTED_USER>:<REDACTED_PASS>@"),

        // Basic auth in URLs
        (Regex::new(r"(https?://)([^:/]+):([^@]+)@").unwrap(),
         "$1<REDACTED_USER>:<REDACTED_PASS>@"),
    ];
}

/// Replace credentials in a string with placeholders.
///
/// ```
/// use sos_collector::security::scrub_credentials;
///
/// let scrubbed = scrub_credentials("engine-psql failed: password=secret123");
/// assert_eq!(scrubbed, "engine-psql failed: password=<REDACTED_PASSWORD>");
/// ```
pub fn scrub_credentials(input: &str) -> String {
    let mut result = input.to_string();

    for (pattern, replacement) in CREDENTIAL_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}
