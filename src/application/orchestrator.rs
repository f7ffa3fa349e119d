use std::time::{Duration, Instant};

use tokio::time::sleep;

use crate::application::service::{unix_now, CircuitBreaker, LoginFlow, StateStore};
use crate::domain::event::RunEvent;
use crate::domain::model::{Account, RunOutcome, RunSummary};
use crate::domain::repository::StateRepository;
use crate::infrastructure::notify::NotifierHandle;

/// Runs the login flow over every account in order, one at a time
pub struct RunOrchestrator<R: StateRepository> {
    flow: LoginFlow,
    breaker: CircuitBreaker,
    store: StateStore<R>,
    notifier: NotifierHandle,
    account_delay: Duration,
}

impl<R: StateRepository> RunOrchestrator<R> {
    pub fn new(
        flow: LoginFlow,
        breaker: CircuitBreaker,
        store: StateStore<R>,
        notifier: NotifierHandle,
        account_delay: Duration,
    ) -> Self {
        Self {
            flow,
            breaker,
            store,
            notifier,
            account_delay,
        }
    }

    /// Process all accounts and send the summary notification
    pub async fn run(&mut self, accounts: &[Account]) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        tracing::info!("Processing {} account(s)", accounts.len());

        for (position, account) in accounts.iter().enumerate() {
            let index = position + 1;
            let outcome = self.process(account, index).await;
            summary.record(outcome);
        }

        summary.elapsed = start.elapsed();
        tracing::info!(
            success = summary.success,
            skipped = summary.skipped,
            failed = summary.failed,
            "All accounts processed in {}",
            humantime::format_duration(Duration::from_secs(summary.elapsed.as_secs()))
        );

        self.notifier
            .notify(
                &RunEvent::RunCompleted {
                    summary: summary.clone(),
                },
                None,
            )
            .await;

        summary
    }

    async fn process(&mut self, account: &Account, index: usize) -> RunOutcome {
        if self.breaker.should_skip(&self.store, &account.username) {
            let remaining = self
                .breaker
                .cooldown_remaining_at(&self.store, &account.username, unix_now())
                .map(|d| humantime::format_duration(Duration::from_secs(d.as_secs())).to_string())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::info!(account = index, "⏭️ Circuit open, skipping ({} left)", remaining);
            return RunOutcome::Skipped;
        }

        let outcome = self.flow.run(account, index, &mut self.store).await;
        tracing::info!(account = index, ?outcome, "Account finished");

        // Pace requests against the target service
        sleep(self.account_delay).await;
        outcome
    }
}
