use std::time::Duration;

/// Final classification of one account in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Circuit open, either before the attempt or tripped by it
    Skipped,
    Failed,
}

/// Aggregate counts for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success: u32,
    pub skipped: u32,
    pub failed: u32,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Success => self.success += 1,
            RunOutcome::Skipped => self.skipped += 1,
            RunOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.success + self.skipped + self.failed
    }
}
