use std::fmt;

use crate::clusters::ClusterProfile;
use crate::config::RunConfig;
use crate::constants::BASE_SOS_COMMAND;

/// The sosreport command line every node runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    line: String,
}

impl RemoteCommand {
    /// Bare `sosreport --batch`
    pub fn new() -> Self {
        Self {
            line: BASE_SOS_COMMAND.to_string(),
        }
    }

    /// A command line used exactly as given
    pub fn raw(line: &str) -> Self {
        Self { line: line.to_string() }
    }

    /// Build the command for this run.
    ///
    /// A user-supplied option line replaces every generated flag, including
    /// the profile's adjustment.
    pub fn configure(config: &RunConfig, profile: Option<&dyn ClusterProfile>) -> Self {
        let mut command = Self::new();

        if let Some(line) = config.sos_opt_line.as_deref().filter(|l| !l.trim().is_empty()) {
            command.push_arg(line.trim());
            return command;
        }

        if let Some(case_id) = &config.case_id {
            command.push_arg(&format!("--case-id={}", shell_quote(case_id)));
        }
        if config.alloptions {
            command.push_arg("--alloptions");
        }
        if let Some(profile) = profile {
            profile.adjust_remote_command(&mut command);
        }
        if config.verify {
            command.push_arg("--verify");
        }
        if let Some(sysroot) = &config.sysroot {
            command.push_arg(&format!("-s {}", shell_quote(sysroot)));
        }
        if let Some(chroot) = &config.chroot {
            command.push_arg(&format!("-c {}", shell_quote(chroot)));
        }
        if let Some(compression) = &config.compression {
            command.push_arg(&format!("-z {}", shell_quote(compression)));
        }
        command
    }

    pub fn push_arg(&mut self, arg: &str) {
        self.line.push(' ');
        self.line.push_str(arg);
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }
}

impl Default for RemoteCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Single-quote `value` for POSIX shells
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clusters::kubernetes::Kubernetes;

    #[test]
    fn test_default_command() {
        let command = RemoteCommand::configure(&RunConfig::default(), None);
        assert_eq!(command.as_str(), "sosreport --batch");
    }

    #[test]
    fn test_flags_in_order() {
        let config = RunConfig {
            case_id: Some("01234".to_string()),
            alloptions: true,
            verify: true,
            sysroot: Some("/host".to_string()),
            chroot: Some("always".to_string()),
            compression: Some("xz".to_string()),
            ..RunConfig::default()
        };
        let profile = Kubernetes::new();
        let command = RemoteCommand::configure(&config, Some(&profile as &dyn ClusterProfile));
        assert_eq!(
            command.as_str(),
            "sosreport --batch --case-id='01234' --alloptions -e kubernetes --verify -s '/host' -c 'always' -z 'xz'"
        );
    }

    #[test]
    fn test_profile_adjustment_applied_once() {
        let profile = Kubernetes::new();
        let command = RemoteCommand::configure(&RunConfig::default(), Some(&profile as &dyn ClusterProfile));
        assert_eq!(command.as_str().matches("-e kubernetes").count(), 1);
    }

    #[test]
    fn test_option_line_replaces_flags() {
        let config = RunConfig {
            case_id: Some("01234".to_string()),
            verify: true,
            sos_opt_line: Some(" -o networking --all-logs ".to_string()),
            ..RunConfig::default()
        };
        let profile = Kubernetes::new();
        let command = RemoteCommand::configure(&config, Some(&profile as &dyn ClusterProfile));
        assert_eq!(command.as_str(), "sosreport --batch -o networking --all-logs");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }
}
