pub mod loader;

pub use loader::{
    DeploymentConfig, ObservabilityConfig, PageConfig, ScopeConfig, StorageConfig, TailConfig,
};

use std::path::Path;

/// Load configuration from a TOML file with environment-variable overrides.
///
/// Resolution order:
/// 1. `config/default.toml` — base configuration
/// 2. `config/{env}.toml` — environment overlay (development, testing, production)
/// 3. Environment variables with prefix `SCOPE_` (double underscore for nesting)
///
/// # Example
///
/// `SCOPE_DEPLOYMENT__URL=https://...` overrides `deployment.url`.
pub fn load_config(config_dir: &Path, env: &str) -> anyhow::Result<ScopeConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("default.toml")).required(false))
        .add_source(config::File::from(config_dir.join(format!("{}.toml", env))).required(false))
        .add_source(
            config::Environment::with_prefix("SCOPE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: ScopeConfig = settings.try_deserialize()?;
    Ok(cfg)
}
