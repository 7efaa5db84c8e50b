use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clusters::ClusterProfile;
use crate::error::{CollectorError, Result};

/// Declared type of a cluster option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Boolean,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::String => write!(f, "str"),
            OptionKind::Boolean => write!(f, "bool"),
        }
    }
}

/// Value held by a cluster option or carried by an override
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Str(_) => OptionKind::String,
            OptionValue::Bool(_) => OptionKind::Boolean,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => write!(f, "{}", s),
            OptionValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// An option declared by a cluster profile
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOption {
    pub cluster: String,
    pub name: String,
    pub kind: OptionKind,
    pub default: OptionValue,
    pub value: OptionValue,
    pub description: String,
}

impl ClusterOption {
    /// Declare a string option
    pub fn string(cluster: &str, name: &str, default: &str, description: &str) -> Self {
        Self::declare(cluster, name, OptionValue::Str(default.to_string()), description)
    }

    /// Declare a boolean option
    pub fn boolean(cluster: &str, name: &str, default: bool, description: &str) -> Self {
        Self::declare(cluster, name, OptionValue::Bool(default), description)
    }

    fn declare(cluster: &str, name: &str, default: OptionValue, description: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            name: name.to_string(),
            kind: default.kind(),
            value: default.clone(),
            default,
            description: description.to_string(),
        }
    }
}

/// Ordered option set owned by one cluster profile
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions(Vec<ClusterOption>);

impl ClusterOptions {
    pub fn new(options: Vec<ClusterOption>) -> Self {
        Self(options)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterOption> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ClusterOption> {
        self.0.iter().find(|o| o.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClusterOption> {
        self.0.iter_mut().find(|o| o.name == name)
    }

    /// Current value of a boolean option, `false` when undeclared
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.get(name).map(|o| &o.value), Some(OptionValue::Bool(true)))
    }

    /// Current value of a string option, empty when undeclared
    pub fn get_str(&self, name: &str) -> &str {
        match self.get(name).map(|o| &o.value) {
            Some(OptionValue::Str(s)) => s,
            _ => "",
        }
    }
}

/// A user-supplied `cluster.option=value` override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOverride {
    pub cluster: String,
    pub name: String,
    pub value: OptionValue,
}

impl OptionOverride {
    /// Build an override from a YAML `cluster_options` entry.
    ///
    /// YAML booleans become boolean overrides; every other scalar is kept as
    /// its string form.
    pub fn from_yaml(key: &str, value: &serde_yaml::Value) -> Result<Self> {
        let (cluster, name) = split_key(key)?;
        let value = match value {
            serde_yaml::Value::Bool(b) => OptionValue::Bool(*b),
            serde_yaml::Value::String(s) => OptionValue::Str(s.clone()),
            serde_yaml::Value::Number(n) => OptionValue::Str(n.to_string()),
            other => {
                return Err(CollectorError::Config(format!(
                    "Unsupported value for cluster option {}: {:?}",
                    key, other
                )))
            }
        };
        Ok(Self { cluster, name, value })
    }
}

impl FromStr for OptionOverride {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s.split_once('=').ok_or_else(|| {
            CollectorError::Config(format!(
                "Cluster option '{}' must take the form cluster.name=value",
                s
            ))
        })?;
        let (cluster, name) = split_key(key)?;
        Ok(Self {
            cluster,
            name,
            value: OptionValue::Str(value.to_string()),
        })
    }
}

fn split_key(key: &str) -> Result<(String, String)> {
    match key.split_once('.') {
        Some((cluster, name)) if !cluster.is_empty() && !name.is_empty() => {
            Ok((cluster.to_string(), name.to_string()))
        }
        _ => Err(CollectorError::Config(format!(
            "Cluster option '{}' must be named cluster.name",
            key
        ))),
    }
}

/// Map a boolean token to its value. Only `true`/`on` and `false`/`off` are
/// accepted, in any case.
pub fn parse_bool_token(token: &str) -> Option<bool> {
    match token.to_lowercase().as_str() {
        "true" | "on" => Some(true),
        "false" | "off" => Some(false),
        _ => None,
    }
}

/// Check that an override is convertible to the declared option type and
/// return the converted value.
pub fn validate_option(option: &ClusterOption, ov: &OptionOverride) -> Result<OptionValue> {
    match (option.kind, &ov.value) {
        (OptionKind::Boolean, OptionValue::Bool(b)) => Ok(OptionValue::Bool(*b)),
        (OptionKind::Boolean, OptionValue::Str(s)) => parse_bool_token(s)
            .map(OptionValue::Bool)
            .ok_or_else(|| CollectorError::OptionValue {
                name: ov.name.clone(),
                value: s.clone(),
            }),
        (expected, value) if value.kind() != expected => Err(CollectorError::OptionType {
            name: ov.name.clone(),
            expected,
            actual: value.kind(),
        }),
        (_, value) => Ok(value.clone()),
    }
}

/// Apply every override to the matching profile option.
///
/// Any override naming an unknown cluster or option, or carrying a value of
/// the wrong type, aborts before any option of the failing override changes.
pub fn apply_overrides(
    profiles: &mut [Box<dyn ClusterProfile>],
    overrides: &[OptionOverride],
) -> Result<()> {
    for ov in overrides {
        let unknown = || CollectorError::UnknownOption {
            cluster: ov.cluster.clone(),
            name: ov.name.clone(),
        };
        let profile = profiles
            .iter_mut()
            .find(|p| p.name() == ov.cluster)
            .ok_or_else(unknown)?;
        let option = profile.options_mut().get_mut(&ov.name).ok_or_else(unknown)?;
        option.value = validate_option(option, ov)?;
        debug!("Cluster option {}.{} set to {}", ov.cluster, ov.name, option.value);
    }
    Ok(())
}
