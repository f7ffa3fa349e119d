mod app_config;
pub mod loader;
pub mod paths;

pub use app_config::*;

use std::sync::OnceLock;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize configuration system (called once at startup)
pub fn init() -> anyhow::Result<&'static AppConfig> {
    if let Some(config) = APP_CONFIG.get() {
        return Ok(config);
    }

    let config = loader::load_config();
    config.validate()?;

    let config = APP_CONFIG.get_or_init(|| config);
    tracing::info!("Configuration initialized");
    Ok(config)
}
