use super::model::RunSummary;

/// Notifiable happenings during a keep-alive run
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// The account reached its authenticated page
    AccountSucceeded { index: usize },

    /// A bounded browser operation did not complete in time
    AccountTimedOut { index: usize },

    /// Any other failure during the attempt
    AccountFailed { index: usize, reason: String },

    /// All accounts have been processed
    RunCompleted { summary: RunSummary },
}

impl RunEvent {
    /// Get the account index associated with this event
    pub fn account_index(&self) -> Option<usize> {
        match self {
            Self::AccountSucceeded { index } => Some(*index),
            Self::AccountTimedOut { index } => Some(*index),
            Self::AccountFailed { index, .. } => Some(*index),
            Self::RunCompleted { .. } => None,
        }
    }

    /// Get the event type name for logging
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::AccountSucceeded { .. } => "account_succeeded",
            Self::AccountTimedOut { .. } => "account_timed_out",
            Self::AccountFailed { .. } => "account_failed",
            Self::RunCompleted { .. } => "run_completed",
        }
    }

    /// Render the chat message for this event
    pub fn message(&self) -> String {
        match self {
            Self::AccountSucceeded { index } => {
                format!("✅ ClawCloud keep-alive succeeded\naccount {}", index)
            }
            Self::AccountTimedOut { index } => {
                format!("⏰ ClawCloud page timed out\naccount {}", index)
            }
            Self::AccountFailed { index, reason } => {
                format!("❌ ClawCloud error\naccount {}\n{}", index, reason)
            }
            Self::RunCompleted { summary } => format!(
                "📊 ClawCloud keep-alive finished\n\n\
                 ✅ Succeeded: {}\n\
                 ⏰ Skipped (timeout): {}\n\
                 ❌ Failed: {}\n\n\
                 ⏱ Total time: {} s",
                summary.success,
                summary.skipped,
                summary.failed,
                summary.elapsed.as_secs()
            ),
        }
    }
}
