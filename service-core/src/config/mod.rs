//! Layered configuration loading.

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;

pub use ::config::ConfigError as LoadError;

/// Load a configuration value of type `T`.
///
/// Sources, lowest precedence first:
/// 1. an optional `<file_stem>.{toml,yaml,json}` file in the working directory
/// 2. environment variables named `<env_prefix>__<KEY>`, with nested keys
///    separated by `__` (e.g. `WORKSHOP__DATABASE__URL`)
///
/// A `.env` file is read into the process environment first when present.
pub fn load<T: DeserializeOwned>(file_stem: &str, env_prefix: &str) -> Result<T, ConfigError> {
    dotenvy::dotenv().ok();

    let config = Config::builder()
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
