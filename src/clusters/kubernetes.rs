use crate::clusters::{has_binary, query, ClusterProfile};
use crate::collectors::command::{shell_quote, RemoteCommand};
use crate::config::{ClusterOption, ClusterOptions};
use crate::error::EnumerationError;
use crate::nodes::NodeClient;

const TAG: &str = "kubernetes";

/// Kubernetes clusters, enumerated with `kubectl get nodes`
#[derive(Debug, Clone)]
pub struct Kubernetes {
    options: ClusterOptions,
}

impl Kubernetes {
    pub fn new() -> Self {
        Self {
            options: ClusterOptions::new(vec![
                ClusterOption::string(TAG, "label", "", "Restrict nodes to those matching this label selector"),
                ClusterOption::string(TAG, "role", "", "Restrict nodes to those with this role"),
            ]),
        }
    }

    pub fn boxed() -> Box<dyn ClusterProfile> {
        Box::new(Self::new())
    }

    fn node_query(&self) -> String {
        let label = self.options.get_str("label");
        if label.is_empty() {
            "kubectl get nodes".to_string()
        } else {
            format!("kubectl get nodes -l {}", shell_quote(label))
        }
    }
}

impl Default for Kubernetes {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `kubectl get nodes` output, keeping nodes whose ROLES column
/// contains `role` (all nodes when `role` is empty)
fn parse_nodes(output: &str, role: &str) -> Result<Vec<String>, EnumerationError> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());

    let header = match lines.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };
    let columns: Vec<&str> = header.split_whitespace().collect();
    if columns.first() != Some(&"NAME") {
        return Err(EnumerationError::Parse(format!("unexpected kubectl header: {}", header)));
    }
    let roles_col = columns.iter().position(|c| *c == "ROLES");

    let mut nodes = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let name = match fields.first() {
            Some(name) => *name,
            None => continue,
        };
        if !role.is_empty() {
            let roles = roles_col.and_then(|i| fields.get(i)).copied().unwrap_or("");
            if !roles.split(',').any(|r| r == role) {
                continue;
            }
        }
        nodes.push(name.to_string());
    }
    Ok(nodes)
}

impl ClusterProfile for Kubernetes {
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
        has_binary(probe, "kubectl")
    }

    fn enumerate_nodes(&self, primary: &dyn NodeClient) -> Result<Vec<String>, EnumerationError> {
        let output = query(primary, &self.node_query())?;
        parse_nodes(&output, self.options.get_str("role"))
    }

    fn adjust_remote_command(&self, command: &mut RemoteCommand) {
        command.push_arg("-e kubernetes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionValue;

    const OUTPUT: &str = "\
NAME      STATUS   ROLES                  AGE   VERSION
master1   Ready    control-plane,master   10d   v1.27.3
worker1   Ready    worker                 10d   v1.27.3
worker2   Ready    <none>                 9d    v1.27.3
";

    #[test]
    fn test_parse_all_nodes() {
        assert_eq!(parse_nodes(OUTPUT, "").unwrap(), vec!["master1", "worker1", "worker2"]);
    }

    #[test]
    fn test_parse_role_filter() {
        assert_eq!(parse_nodes(OUTPUT, "master").unwrap(), vec!["master1"]);
        assert_eq!(parse_nodes(OUTPUT, "worker").unwrap(), vec!["worker1"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_nodes("error: You must be logged in", ""),
            Err(EnumerationError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_nodes("", "").unwrap().is_empty());
    }

    #[test]
    fn test_label_selector_in_query() {
        let mut profile = Kubernetes::new();
        assert_eq!(profile.node_query(), "kubectl get nodes");

        profile.options_mut().get_mut("label").unwrap().value = OptionValue::Str("env=prod".to_string());
        assert_eq!(profile.node_query(), "kubectl get nodes -l 'env=prod'");
    }

    #[test]
    fn test_adjusts_command() {
        let mut command = RemoteCommand::new();
        Kubernetes::new().adjust_remote_command(&mut command);
        assert!(command.as_str().ends_with("-e kubernetes"));
    }
}
