use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Circuit-breaker bookkeeping for one account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// Consecutive timeout outcomes since the last success or trip
    #[serde(default)]
    pub timeout_count: u32,

    /// Unix timestamp (seconds) until which the account is in cooldown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_until: Option<f64>,
}

impl AccountState {
    /// Check whether the cooldown window is still open at `now`
    pub fn is_cooling_down(&self, now: f64) -> bool {
        self.skip_until.is_some_and(|until| until > now)
    }
}

/// Persisted state keyed by username
pub type StateMap = BTreeMap<String, AccountState>;
