use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::paths;
use crate::domain::error::DomainError;
use crate::infrastructure::notify::TelegramConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Account list, `user----pass[----totp]` entries joined by `&`
    pub accounts: String,
    pub target: TargetConfig,
    pub breaker: BreakerConfig,
    pub timing: TimingConfig,
    pub browser: BrowserSettings,
    pub paths: PathsConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Apply environment variable overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(accounts) = lookup("CLAW_ACCOUNTS") {
            self.accounts = accounts;
        }
        if let Some(url) = lookup("CLAW_CLOUD_URL") {
            self.target.base_url = url;
        }
        if let Some(token) = lookup("TG_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup("TG_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Some(dir) = lookup("CLAW_DATA_DIR") {
            self.paths.data_dir = dir;
        }
        if let Some(path) = lookup("CHROME_PATH") {
            self.browser.executable = Some(path);
        }
        if let Some(value) = parse_env(&lookup, "CLAW_MAX_TIMEOUT_FAIL") {
            self.breaker.max_timeout_fail = value;
        }
        if let Some(value) = parse_env(&lookup, "CLAW_SKIP_HOURS") {
            self.breaker.skip_hours = value;
        }
        if let Some(value) = parse_env(&lookup, "CLAW_HEADLESS") {
            self.browser.headless = value;
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.breaker.max_timeout_fail == 0 {
            return Err(DomainError::Config(
                "breaker.max_timeout_fail must be at least 1".to_string(),
            ));
        }
        if self.target.base_url.trim().is_empty() {
            return Err(DomainError::Config("target.base_url is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Service root; a non-signin URL after landing means the session is already trusted
    pub base_url: String,

    /// Authenticated sub-page visited after the OAuth dance
    pub apps_path: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eu-central-1.run.claw.cloud".to_string(),
            apps_path: "/apps".to_string(),
        }
    }
}

impl TargetConfig {
    pub fn apps_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.apps_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Counted timeout outcomes before the account is put into cooldown
    pub max_timeout_fail: u32,

    /// Cooldown length in hours
    pub skip_hours: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_timeout_fail: 2,
            skip_hours: 24,
        }
    }
}

impl BreakerConfig {
    pub fn skip_duration(&self) -> Duration {
        Duration::from_secs(self.skip_hours.saturating_mul(3600))
    }
}

/// Bounds and settle delays for the login flow (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub landing_timeout_ms: u64,
    pub oauth_button_timeout_ms: u64,
    pub form_field_timeout_ms: u64,
    pub authorize_timeout_ms: u64,
    pub post_auth_timeout_ms: u64,
    pub screenshot_timeout_ms: u64,
    pub landing_settle_ms: u64,
    pub oauth_settle_ms: u64,
    pub credential_settle_ms: u64,
    pub second_factor_settle_ms: u64,
    pub post_auth_settle_ms: u64,
    /// Pause after each processed account
    pub account_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            landing_timeout_ms: 60_000,
            oauth_button_timeout_ms: 30_000,
            form_field_timeout_ms: 30_000,
            authorize_timeout_ms: 15_000,
            post_auth_timeout_ms: 30_000,
            screenshot_timeout_ms: 5_000,
            landing_settle_ms: 5_000,
            oauth_settle_ms: 3_000,
            credential_settle_ms: 5_000,
            second_factor_settle_ms: 5_000,
            post_auth_settle_ms: 5_000,
            account_delay_ms: 10_000,
        }
    }
}

impl TimingConfig {
    /// All bounds and delays set to zero, for driving the flow against fakes
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            landing_timeout_ms: 0,
            oauth_button_timeout_ms: 0,
            form_field_timeout_ms: 0,
            authorize_timeout_ms: 0,
            post_auth_timeout_ms: 0,
            screenshot_timeout_ms: 0,
            landing_settle_ms: 0,
            oauth_settle_ms: 0,
            credential_settle_ms: 0,
            second_factor_settle_ms: 0,
            post_auth_settle_ms: 0,
            account_delay_ms: 0,
        }
    }

    pub fn landing_timeout(&self) -> Duration {
        Duration::from_millis(self.landing_timeout_ms)
    }

    pub fn oauth_button_timeout(&self) -> Duration {
        Duration::from_millis(self.oauth_button_timeout_ms)
    }

    pub fn form_field_timeout(&self) -> Duration {
        Duration::from_millis(self.form_field_timeout_ms)
    }

    pub fn authorize_timeout(&self) -> Duration {
        Duration::from_millis(self.authorize_timeout_ms)
    }

    pub fn post_auth_timeout(&self) -> Duration {
        Duration::from_millis(self.post_auth_timeout_ms)
    }

    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_millis(self.screenshot_timeout_ms)
    }

    pub fn landing_settle(&self) -> Duration {
        Duration::from_millis(self.landing_settle_ms)
    }

    pub fn oauth_settle(&self) -> Duration {
        Duration::from_millis(self.oauth_settle_ms)
    }

    pub fn credential_settle(&self) -> Duration {
        Duration::from_millis(self.credential_settle_ms)
    }

    pub fn second_factor_settle(&self) -> Duration {
        Duration::from_millis(self.second_factor_settle_ms)
    }

    pub fn post_auth_settle(&self) -> Duration {
        Duration::from_millis(self.post_auth_settle_ms)
    }

    pub fn account_delay(&self) -> Duration {
        Duration::from_millis(self.account_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Required in most containers running as root
    pub no_sandbox: bool,
    /// Leave empty to let chromiumoxide locate Chrome/Chromium
    pub executable: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            executable: None,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// Filesystem locations. Empty strings fall back to platform defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
    pub state_file: String,
    pub screenshot_dir: String,
    pub log_dir: String,
}

impl PathsConfig {
    pub fn effective_data_dir(&self) -> PathBuf {
        if self.data_dir.is_empty() {
            paths::default_data_dir()
        } else {
            PathBuf::from(&self.data_dir)
        }
    }

    pub fn effective_state_file(&self) -> PathBuf {
        if self.state_file.is_empty() {
            self.effective_data_dir().join("clawcloud_state.json")
        } else {
            PathBuf::from(&self.state_file)
        }
    }

    pub fn effective_screenshot_dir(&self) -> PathBuf {
        if self.screenshot_dir.is_empty() {
            self.effective_data_dir().join("screenshots")
        } else {
            PathBuf::from(&self.screenshot_dir)
        }
    }

    pub fn effective_log_dir(&self) -> PathBuf {
        if self.log_dir.is_empty() {
            self.effective_data_dir().join("logs")
        } else {
            PathBuf::from(&self.log_dir)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write daily-rotated log files into the log directory
    pub file: bool,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            level: "info".to_string(),
        }
    }
}
