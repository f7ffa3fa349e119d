use std::path::PathBuf;

const APP_DIR_NAME: &str = "claw-keepalive";

/// Get platform-specific configuration directory
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Get platform-specific data directory (state file, screenshots, logs)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn user_config_file() -> PathBuf {
    config_dir().join("config.yaml")
}
