//! Node list construction.
//!
//! The list starts from the operator's explicit nodes or the cluster's own
//! enumeration, then the local host is normalised to its full hostname and
//! everything already covered by the local or master connection is removed.

use std::collections::BTreeSet;

use crate::clusters::ClusterProfile;
use crate::error::{CollectorError, EnumerationError, Result};
use crate::nodes::{short_hostname, LocalIdentity, NodeClient};

/// Everything node list reduction needs to know about the run
#[derive(Debug, Clone, Copy)]
pub struct NodeListInputs<'a> {
    pub identity: &'a LocalIdentity,
    /// Local collection was explicitly disabled
    pub exclude_local: bool,
    /// Address and self-reported hostname of a designated master
    pub master: Option<(&'a str, &'a str)>,
}

/// Base node list: the explicit list when given, the cluster's enumeration
/// otherwise. An enumeration that fails or comes back empty is fatal.
pub fn build_node_list(
    explicit: &[String],
    profile: Option<&dyn ClusterProfile>,
    primary: &dyn NodeClient,
) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }

    let profile = match profile {
        Some(profile) => profile,
        None => return Ok(Vec::new()),
    };

    let nodes = profile
        .enumerate_nodes(primary)
        .map_err(|source| CollectorError::Enumeration {
            cluster: profile.name().to_string(),
            source,
        })?;
    if nodes.is_empty() {
        return Err(CollectorError::Enumeration {
            cluster: profile.name().to_string(),
            source: EnumerationError::Empty,
        });
    }
    Ok(nodes)
}

/// Replace every entry naming the local host by short hostname with the
/// full local hostname, listed once. Skipped when a master was designated.
pub fn prefer_local_hostname(nodes: Vec<String>, identity: &LocalIdentity, has_master: bool) -> Vec<String> {
    if has_master {
        return nodes;
    }

    let local_short = identity.short_hostname();
    let mut nodes: Vec<String> = nodes
        .into_iter()
        .filter(|n| short_hostname(n) != local_short)
        .collect();
    nodes.push(identity.hostname.clone());
    nodes
}

/// Drop entries already covered by the local or master connection, and
/// blanks. Applying it to its own output changes nothing.
pub fn reduce_node_list<I>(nodes: I, inputs: &NodeListInputs<'_>) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    nodes
        .into_iter()
        .filter(|n| !n.trim().is_empty())
        .filter(|n| !(inputs.exclude_local && *n == inputs.identity.hostname))
        .filter(|n| !inputs.identity.ip_addrs.contains(n))
        .filter(|n| match inputs.master {
            Some((address, hostname)) => n != address && n != hostname,
            None => true,
        })
        .collect()
}

/// Width of the widest node name, used to align per-node output. Falls
/// back to the master address when there are no nodes.
pub fn host_width<'a, I>(nodes: I, master: Option<&str>) -> usize
where
    I: IntoIterator<Item = &'a String>,
{
    nodes
        .into_iter()
        .map(|n| n.len())
        .max()
        .unwrap_or_else(|| master.map(str::len).unwrap_or(0))
}
