use crate::clusters::ClusterProfile;
use crate::error::{CollectorError, Result};
use crate::nodes::NodeClient;
use crate::reporting::Reporter;

/// Pick the cluster profile for this run.
///
/// A forced tag selects that profile without probing. Otherwise profiles are
/// probed in registry order and the first applicable one wins; later
/// profiles are never probed. Returns `Ok(None)` only when nothing matched
/// and the operator supplied an explicit node list.
pub fn resolve_cluster(
    profiles: Vec<Box<dyn ClusterProfile>>,
    probe: &dyn NodeClient,
    forced: Option<&str>,
    has_explicit_nodes: bool,
    reporter: &dyn Reporter,
) -> Result<Option<Box<dyn ClusterProfile>>> {
    if let Some(tag) = forced {
        let profile = profiles
            .into_iter()
            .find(|p| p.name() == tag)
            .ok_or_else(|| CollectorError::UnknownCluster(tag.to_string()))?;
        reporter.log(&format!("Cluster type forced to {}", tag));
        return Ok(Some(profile));
    }

    let matched = profiles.into_iter().find(|p| {
        reporter.debug(&format!("Checking if {} is a {} cluster", probe.address(), p.name()));
        p.check_applicable(probe)
    });

    match matched {
        Some(profile) => {
            reporter.log(&format!("Cluster type set to {}", profile.name()));
            Ok(Some(profile))
        }
        None if has_explicit_nodes => {
            reporter.log("Cluster type could not be determined, using provided node list");
            Ok(None)
        }
        None => Err(CollectorError::Unresolvable),
    }
}
