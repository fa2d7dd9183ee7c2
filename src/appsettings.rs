use config::{Config, ConfigError, Environment, File};

pub use hakase_models::settings::Settings;

/// `appsettings.toml`, then `appsettings.local.toml`, then `APP__*` variables.
pub fn load() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("appsettings").required(false))
        .add_source(File::with_name("appsettings.local").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("notifications.lead_times_minutes")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
