mod options;
mod run_config;

// Re-export option schema and validation
pub use options::{
    apply_overrides,
    parse_bool_token,
    validate_option,
    ClusterOption,
    ClusterOptions,
    OptionKind,
    OptionOverride,
    OptionValue,
};

// Re-export run configuration
pub use run_config::{
    parse_node_list,
    AuthConfig,
    RunConfig,
};
