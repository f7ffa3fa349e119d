pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use application::orchestrator::RunOrchestrator;
use application::service::{CircuitBreaker, LoginFlow, StateStore};
use domain::model::{Account, RunSummary};
use infrastructure::browser::ChromiumDriver;
use infrastructure::config;
use infrastructure::logging;
use infrastructure::notify::build_notifier;
use infrastructure::otp::TotpProvider;
use infrastructure::persistence::json::JsonStateRepository;

/// Run one keep-alive pass over every configured account
pub async fn run() -> anyhow::Result<RunSummary> {
    let app_config = config::init()?;
    let paths = &app_config.paths;
    let data_dir = paths.effective_data_dir();

    logging::setup(&app_config.logging, &paths.effective_log_dir());

    tracing::info!("{}", "=".repeat(50));
    tracing::info!(
        "ClawCloud keep-alive v{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH
    );
    tracing::info!("{}", "=".repeat(50));

    let accounts = Account::parse_list(&app_config.accounts);
    if accounts.is_empty() {
        tracing::warn!("No accounts configured, set CLAW_ACCOUNTS");
    } else {
        tracing::info!(
            "Loaded {} account(s), {} with TOTP",
            accounts.len(),
            accounts.iter().filter(|a| a.has_second_factor()).count()
        );
    }

    let repo = JsonStateRepository::new(paths.effective_state_file());
    tracing::info!("Circuit-breaker state: {:?}", repo.path());
    let store = StateStore::load(repo);
    let notifier = build_notifier(&app_config.telegram);
    let breaker = CircuitBreaker::from_config(&app_config.breaker);

    let flow = LoginFlow::new(
        Arc::new(ChromiumDriver::new(
            app_config.browser.clone(),
            data_dir.join("profiles"),
        )),
        notifier.clone(),
        Arc::new(TotpProvider::new()),
        breaker.clone(),
        app_config.target.clone(),
        app_config.timing.clone(),
        paths.effective_screenshot_dir(),
    );

    let mut orchestrator = RunOrchestrator::new(
        flow,
        breaker,
        store,
        notifier,
        app_config.timing.account_delay(),
    );
    Ok(orchestrator.run(&accounts).await)
}
