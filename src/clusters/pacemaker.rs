use crate::clusters::{has_binary, query, ClusterProfile};
use crate::config::{ClusterOption, ClusterOptions};
use crate::error::EnumerationError;
use crate::nodes::NodeClient;

const TAG: &str = "pacemaker";

/// Pacemaker clusters, enumerated from `crm_mon` status output
#[derive(Debug, Clone)]
pub struct Pacemaker {
    options: ClusterOptions,
}

impl Pacemaker {
    pub fn new() -> Self {
        Self {
            options: ClusterOptions::new(vec![
                ClusterOption::boolean(TAG, "online", true, "Collect from online nodes"),
                ClusterOption::boolean(TAG, "offline", true, "Collect from offline nodes"),
            ]),
        }
    }

    pub fn boxed() -> Box<dyn ClusterProfile> {
        Box::new(Self::new())
    }
}

impl Default for Pacemaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Node names from a `Online: [ a b ]` style status line
fn bracketed_nodes(line: &str) -> Vec<String> {
    match (line.find('['), line.rfind(']')) {
        (Some(start), Some(end)) if start < end => line[start + 1..end]
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_status(output: &str, online: bool, offline: bool) -> Vec<String> {
    let mut nodes = Vec::new();
    for line in output.lines().map(str::trim) {
        if online && line.starts_with("Online:") {
            nodes.extend(bracketed_nodes(line));
        } else if offline && line.starts_with("OFFLINE:") {
            nodes.extend(bracketed_nodes(line));
        }
    }
    nodes
}

impl ClusterProfile for Pacemaker {
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
        has_binary(probe, "crm_mon")
    }

    fn enumerate_nodes(&self, primary: &dyn NodeClient) -> Result<Vec<String>, EnumerationError> {
        let output = query(primary, "crm_mon --one-shot --inactive")?;
        Ok(parse_status(
            &output,
            self.options.get_bool("online"),
            self.options.get_bool("offline"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionValue;
    use crate::test_utils::FakeNode;

    const STATUS: &str = "\
Cluster Summary:
  * Stack: corosync
  * 3 nodes configured

Node List:
  Online: [ node1 node2 ]
  OFFLINE: [ node3 ]
";

    #[test]
    fn test_parse_online_and_offline() {
        assert_eq!(parse_status(STATUS, true, true), vec!["node1", "node2", "node3"]);
        assert_eq!(parse_status(STATUS, true, false), vec!["node1", "node2"]);
        assert_eq!(parse_status(STATUS, false, true), vec!["node3"]);
    }

    #[test]
    fn test_bracketed_nodes_malformed() {
        assert!(bracketed_nodes("Online: node1").is_empty());
        assert!(bracketed_nodes("Online: [ ]").is_empty());
    }

    #[test]
    fn test_enumerate_honours_options() {
        let node = FakeNode::local("node1").with_output("crm_mon", STATUS);
        let mut profile = Pacemaker::new();
        profile.options_mut().get_mut("offline").unwrap().value = OptionValue::Bool(false);

        assert_eq!(profile.enumerate_nodes(&node).unwrap(), vec!["node1", "node2"]);
    }

    #[test]
    fn test_not_applicable_without_crm_mon() {
        let node = FakeNode::local("node1").with_status("command -v crm_mon", 1);
        assert!(!Pacemaker::new().check_applicable(&node));
    }
}
