// Sub-modules
mod parallel;
mod scoring;

// Core configuration types
mod core;
mod loader;

pub use parallel::ParallelConfig;

pub use scoring::{
    default_complexity_weight, default_dependency_weight, default_documentation_weight,
    default_redundancy_weight, HealthWeights,
};

pub use core::{
    ComplexityConfig, DocumentationConfig, ImportsConfig, LimitsConfig, RedundancyConfig,
    VitalsConfig, WalkerConfig,
};

pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    CONFIG_FILE_NAME,
};
