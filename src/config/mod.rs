mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{
    AgentSettings, LoggingSettings, NotifySettings, ServerSettings, Settings,
};

/// Prefix for environment overrides, e.g. `LEARNHUB_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "LEARNHUB";

/// Loads the configuration from `config/default` (if present) and the environment,
/// then merges the result over the built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_over(Settings::default()))
}

#[cfg(test)]
mod tests;
