use include_dir::{include_dir, Dir};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::path::Path;

use super::app_config::AppConfig;
use super::paths;

// Embed the entire configs directory at compile time
static CONFIGS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/configs");

/// Load a YAML document from disk as an untyped value
pub fn load_yaml_value(path: impl AsRef<Path>) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)?;
    Ok(value)
}

/// Parse YAML from string
pub fn parse_yaml<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    let config: T = serde_yaml::from_str(content)?;
    Ok(config)
}

/// Load an embedded YAML document by name from the configs directory.
/// Returns `Value::Null` if the file is absent or invalid.
pub fn load_embedded_value(name: &str) -> Value {
    let file_name = format!("{}.yaml", name);

    match CONFIGS_DIR.get_file(&file_name) {
        Some(file) => match file.contents_utf8() {
            Some(content) => match parse_yaml::<Value>(content) {
                Ok(value) => {
                    tracing::debug!("Loaded embedded config: {}", name);
                    value
                }
                Err(e) => {
                    tracing::error!("Failed to parse embedded config {}: {}", name, e);
                    Value::Null
                }
            },
            None => {
                tracing::error!("Embedded config {} is not valid UTF-8", name);
                Value::Null
            }
        },
        None => {
            tracing::warn!("Embedded config {} not found, using defaults", name);
            Value::Null
        }
    }
}

/// Recursively overlay `overlay` onto `base`. Mappings merge key by key,
/// anything else in the overlay replaces the base value.
pub fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

/// Build the effective configuration: embedded defaults, then the user file,
/// then environment variables.
pub fn load_config() -> AppConfig {
    let mut merged = load_embedded_value("app");

    let user_file = paths::user_config_file();
    if user_file.exists() {
        match load_yaml_value(&user_file) {
            Ok(user) => {
                tracing::info!("Loaded user config from {:?}", user_file);
                merge_yaml(&mut merged, user);
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}, using defaults", user_file, e);
            }
        }
    } else {
        tracing::debug!("No user config at {:?}", user_file);
    }

    let mut config = match serde_yaml::from_value::<AppConfig>(merged) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid merged config: {}, using defaults", e);
            AppConfig::default()
        }
    };

    config.apply_env(|key| std::env::var(key).ok());
    config
}
