use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ProviderConfig;

/// Load provider settings from a file using the config crate.
/// Supports YAML, JSON and TOML, picked by extension.
pub async fn load_config(config_path: &str) -> Result<ProviderConfig> {
    load_config_sync(config_path)
}

/// Load provider settings synchronously.
pub fn load_config_sync(config_path: &str) -> Result<ProviderConfig> {
    let config_path = Path::new(config_path);

    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        _ => FileFormat::Toml,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let provider_config: ProviderConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(provider_config)
}
