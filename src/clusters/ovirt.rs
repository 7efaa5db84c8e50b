use chrono::Local;
use log::debug;

use crate::clusters::{query, ClusterProfile};
use crate::collectors::command::{shell_quote, RemoteCommand};
use crate::config::{ClusterOption, ClusterOptions};
use crate::constants::REMOTE_SCRATCH_DIR;
use crate::error::{EnumerationError, NodeError};
use crate::nodes::NodeClient;

const TAG: &str = "ovirt";
const ENGINE_PSQL: &str = "/usr/share/ovirt-engine/dbscripts/engine-psql.sh";

/// oVirt / RHV engines. Hypervisors are read from the engine database and
/// the database itself is backed up as the cluster-wide extra artifact.
#[derive(Debug, Clone)]
pub struct Ovirt {
    options: ClusterOptions,
}

impl Ovirt {
    pub fn new() -> Self {
        Self {
            options: ClusterOptions::new(vec![
                ClusterOption::boolean(TAG, "no-database", false, "Do not collect a database dump"),
                ClusterOption::string(TAG, "cluster", "", "Only collect from hosts in this cluster"),
                ClusterOption::string(TAG, "datacenter", "", "Only collect from hosts in this datacenter"),
            ]),
        }
    }

    pub fn boxed() -> Box<dyn ClusterProfile> {
        Box::new(Self::new())
    }

    /// SQL selecting host names, filtered by cluster and datacenter
    fn host_query(&self) -> String {
        let sql = format!(
            "SELECT host_name FROM vds WHERE cluster_name LIKE '{}' AND storage_pool_name LIKE '{}'",
            like_filter(self.options.get_str("cluster")),
            like_filter(self.options.get_str("datacenter")),
        );
        format!("{} -t -A -c {}", ENGINE_PSQL, shell_quote(&sql))
    }

    fn backup_command(path: &str) -> String {
        format!(
            "engine-backup --mode=backup --scope=db --file={} --log=/dev/null",
            shell_quote(path)
        )
    }
}

impl Default for Ovirt {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn an option value into a SQL LIKE operand, `%` when unset
fn like_filter(value: &str) -> String {
    if value.is_empty() {
        "%".to_string()
    } else {
        value.replace('\'', "''")
    }
}

impl ClusterProfile for Ovirt {
    fn name(&self) -> &str {
        TAG
    }

    fn options(&self) -> &ClusterOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ClusterOptions {
        &mut self.options
    }

    fn check_applicable(&self, probe: &dyn NodeClient) -> bool {
        probe
            .run_command("rpm -q ovirt-engine")
            .map(|o| o.status == 0)
            .unwrap_or(false)
    }

    fn enumerate_nodes(&self, primary: &dyn NodeClient) -> Result<Vec<String>, EnumerationError> {
        let output = query(primary, &self.host_query())?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn adjust_remote_command(&self, command: &mut RemoteCommand) {
        command.push_arg("-k ovirt.sensitive_keys=true");
    }

    fn supports_extra_collection(&self) -> bool {
        !self.options.get_bool("no-database")
    }

    fn run_extra_command(&self, primary: &dyn NodeClient) -> Result<Option<Vec<String>>, NodeError> {
        if !self.supports_extra_collection() {
            return Ok(None);
        }

        let path = format!(
            "{}/engine-db-backup-{}.tar.gz",
            REMOTE_SCRATCH_DIR,
            Local::now().format("%Y%m%d%H%M%S")
        );
        debug!("Backing up engine database on {} to {}", primary.address(), path);
        query(primary, &Self::backup_command(&path))?;
        Ok(Some(vec![path]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionValue;
    use crate::test_utils::FakeNode;

    #[test]
    fn test_like_filter() {
        assert_eq!(like_filter(""), "%");
        assert_eq!(like_filter("prod"), "prod");
        assert_eq!(like_filter("o'brien"), "o''brien");
    }

    #[test]
    fn test_host_query_filters() {
        let mut profile = Ovirt::new();
        assert!(profile.host_query().contains("cluster_name LIKE '\\''%'\\''"));

        profile.options_mut().get_mut("cluster").unwrap().value = OptionValue::Str("prod".to_string());
        let q = profile.host_query();
        assert!(q.starts_with(ENGINE_PSQL));
        assert!(q.contains("cluster_name LIKE '\\''prod'\\''"));
        assert!(q.contains("storage_pool_name LIKE '\\''%'\\''"));
    }

    #[test]
    fn test_enumerate_reads_host_lines() {
        let engine = FakeNode::remote("engine").with_output("engine-psql.sh", "hv1.example.com\nhv2.example.com\n\n");
        let nodes = Ovirt::new().enumerate_nodes(&engine).unwrap();
        assert_eq!(nodes, vec!["hv1.example.com", "hv2.example.com"]);
    }

    #[test]
    fn test_no_database_disables_extra_collection() {
        let mut profile = Ovirt::new();
        assert!(profile.supports_extra_collection());

        profile.options_mut().get_mut("no-database").unwrap().value = OptionValue::Bool(true);
        assert!(!profile.supports_extra_collection());

        let engine = FakeNode::remote("engine");
        assert_eq!(profile.run_extra_command(&engine).unwrap(), None);
    }

    #[test]
    fn test_extra_collection_returns_backup_path() {
        let engine = FakeNode::remote("engine");
        let files = Ovirt::new().run_extra_command(&engine).unwrap().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("/var/tmp/engine-db-backup-"));
        assert!(engine.commands().iter().any(|c| c.starts_with("engine-backup")));
    }
}
