//! Cluster profiles.
//!
//! A profile knows how to recognise one cluster technology from a probe node,
//! how to ask the cluster for its members and how to tailor the sosreport
//! command line. Profiles live in a static registry keyed by tag; the run
//! creates one instance of each at startup.

use std::io::{self, Write};

use crate::collectors::command::RemoteCommand;
use crate::config::ClusterOptions;
use crate::error::{EnumerationError, NodeError};
use crate::nodes::NodeClient;

pub mod kubernetes;
pub mod ovirt;
pub mod pacemaker;
pub mod resolver;

pub use resolver::resolve_cluster;

/// Behaviour shared by all cluster technologies
pub trait ClusterProfile: Send + Sync {
    /// Registry tag, also the prefix of the profile's option names
    fn name(&self) -> &str;

    fn options(&self) -> &ClusterOptions;

    fn options_mut(&mut self) -> &mut ClusterOptions;

    /// Whether the probe node belongs to a cluster of this type
    fn check_applicable(&self, probe: &dyn NodeClient) -> bool;

    /// Ask the cluster for its member nodes through the primary node
    fn enumerate_nodes(&self, primary: &dyn NodeClient) -> Result<Vec<String>, EnumerationError>;

    /// Append profile-specific flags to the sosreport command
    fn adjust_remote_command(&self, _command: &mut RemoteCommand) {}

    /// Whether [`ClusterProfile::run_extra_command`] collects anything
    fn supports_extra_collection(&self) -> bool {
        false
    }

    /// Produce cluster-wide data on the primary node once all per-node
    /// collections finished. Returns the remote files to fetch.
    fn run_extra_command(&self, _primary: &dyn NodeClient) -> Result<Option<Vec<String>>, NodeError> {
        Ok(None)
    }
}

type ProfileCtor = fn() -> Box<dyn ClusterProfile>;

/// Known profiles, sorted by tag
const REGISTRY: &[(&str, ProfileCtor)] = &[
    ("kubernetes", kubernetes::Kubernetes::boxed),
    ("ovirt", ovirt::Ovirt::boxed),
    ("pacemaker", pacemaker::Pacemaker::boxed),
];

/// Tags of every known profile in registry order
pub fn profile_tags() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(tag, _)| *tag)
}

/// Instantiate one of every known profile, in registry order
pub fn load_profiles() -> Vec<Box<dyn ClusterProfile>> {
    REGISTRY.iter().map(|(_, ctor)| ctor()).collect()
}

/// Write the option table printed by `--list-options`
pub fn write_options_table<W: Write>(
    out: &mut W,
    profiles: &[Box<dyn ClusterProfile>],
) -> io::Result<()> {
    writeln!(out, "The following cluster options are available:\n")?;
    writeln!(
        out,
        "{:<15} {:<15} {:<6} {:<10} {}",
        "Cluster", "Option Name", "Type", "Default", "Description"
    )?;

    for profile in profiles {
        for opt in profile.options().iter() {
            writeln!(
                out,
                "{:<15} {:<15} {:<6} {:<10} {}",
                opt.cluster,
                opt.name,
                opt.kind.to_string(),
                opt.default.to_string(),
                opt.description
            )?;
        }
    }

    writeln!(
        out,
        "\nOptions take the form cluster.name=value, e.g. \"ovirt.no-database=True\""
    )?;
    Ok(())
}

/// Run a command on `node` and return its stdout, failing on non-zero status
pub(crate) fn query(node: &dyn NodeClient, command: &str) -> Result<String, NodeError> {
    let output = node.run_command(command)?;
    if output.status != 0 {
        return Err(NodeError::Command {
            address: node.address().to_string(),
            command: command.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Whether `command -v <binary>` succeeds on `node`
pub(crate) fn has_binary(node: &dyn NodeClient, binary: &str) -> bool {
    node.run_command(&format!("command -v {}", binary))
        .map(|o| o.status == 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_sorted_by_tag() {
        let tags: Vec<&str> = profile_tags().collect();
        let mut sorted = tags.clone();
        sorted.sort_unstable();
        assert_eq!(tags, sorted);
    }

    #[test]
    fn test_load_profiles_matches_registry() {
        let profiles = load_profiles();
        let names: Vec<&str> = profiles.iter().map(|p| p.name()).collect();
        assert_eq!(names, profile_tags().collect::<Vec<_>>());
    }

    #[test]
    fn test_options_belong_to_their_profile() {
        for profile in load_profiles() {
            for opt in profile.options().iter() {
                assert_eq!(opt.cluster, profile.name());
                assert_eq!(opt.value, opt.default);
            }
        }
    }

    #[test]
    fn test_options_table_lists_every_option() {
        let profiles = load_profiles();
        let mut out = Vec::new();
        write_options_table(&mut out, &profiles).unwrap();
        let table = String::from_utf8(out).unwrap();

        assert!(table.contains("no-database"));
        assert!(table.contains("pacemaker"));
        assert!(table.contains("online"));
        assert!(table.contains("label"));
    }
}
