use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::sleep;

use crate::application::service::{CircuitBreaker, StateStore};
use crate::domain::event::RunEvent;
use crate::domain::model::{Account, CaptureStatus, LoginStage, RunOutcome};
use crate::domain::repository::StateRepository;
use crate::infrastructure::browser::{
    BrowserDriver, BrowserError, BrowserResult, BrowserSession, Locator,
};
use crate::infrastructure::config::{TargetConfig, TimingConfig};
use crate::infrastructure::notify::NotifierHandle;
use crate::infrastructure::otp::OtpProvider;

/// Initial attempt plus one automatic retry after a timeout
const MAX_ATTEMPTS: u32 = 2;

/// Path fragment of ClawCloud's sign-in redirect
const SIGNIN_MARKER: &str = "signin";
const GITHUB_LOGIN_MARKER: &str = "github.com/login";
const OAUTH_AUTHORIZE_MARKER: &str = "oauth/authorize";
const TWO_FACTOR_MARKER: &str = "two-factor";

const GITHUB_BUTTON: &str = "GitHub";
const AUTHORIZE_BUTTON: &str = "Authorize";
const LOGIN_FIELD: &str = "#login_field";
const PASSWORD_FIELD: &str = "#password";
const SUBMIT_BUTTON: &str = "input[type=submit]";
const OTP_FIELD: &str = "#otp";

/// Result of a single attempt, before breaker bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptResult {
    Succeeded,
    TimedOut,
    Failed,
}

/// Drives one account through the ClawCloud → GitHub OAuth login and
/// classifies the outcome.
pub struct LoginFlow {
    browser: Arc<dyn BrowserDriver>,
    notifier: NotifierHandle,
    otp: Arc<dyn OtpProvider>,
    breaker: CircuitBreaker,
    target: TargetConfig,
    timing: TimingConfig,
    screenshot_dir: PathBuf,
}

impl LoginFlow {
    pub fn new(
        browser: Arc<dyn BrowserDriver>,
        notifier: NotifierHandle,
        otp: Arc<dyn OtpProvider>,
        breaker: CircuitBreaker,
        target: TargetConfig,
        timing: TimingConfig,
        screenshot_dir: PathBuf,
    ) -> Self {
        Self {
            browser,
            notifier,
            otp,
            breaker,
            target,
            timing,
            screenshot_dir,
        }
    }

    /// Run the flow for one account (the caller has already checked the breaker).
    ///
    /// A timeout is recorded with the breaker; unless that trips it, the whole
    /// flow is retried once in a fresh session. Other errors end the run for
    /// this account without touching breaker state.
    pub async fn run<R: StateRepository>(
        &self,
        account: &Account,
        index: usize,
        store: &mut StateStore<R>,
    ) -> RunOutcome {
        for attempt in 1..=MAX_ATTEMPTS {
            tracing::info!(
                account = index,
                attempt,
                arch = std::env::consts::ARCH,
                "🚀 Processing account{}",
                if attempt > 1 { " (retry)" } else { "" }
            );

            match self.attempt(account, index).await {
                AttemptResult::Succeeded => {
                    self.breaker.record_success(store, &account.username);
                    return RunOutcome::Success;
                }
                AttemptResult::Failed => return RunOutcome::Failed,
                AttemptResult::TimedOut => {
                    if self.breaker.record_timeout(store, &account.username) {
                        return RunOutcome::Skipped;
                    }
                }
            }
        }

        RunOutcome::Failed
    }

    /// One full pass in a fresh session. The session is closed on every path.
    async fn attempt(&self, account: &Account, index: usize) -> AttemptResult {
        let mut session = match self.browser.open_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(account = index, "Failed to open browser session: {}", e);
                self.notifier
                    .notify(
                        &RunEvent::AccountFailed {
                            index,
                            reason: e.to_string(),
                        },
                        None,
                    )
                    .await;
                return AttemptResult::Failed;
            }
        };

        let mut stage = LoginStage::Open;
        let result = self
            .drive(session.as_mut(), account, index, &mut stage)
            .await;

        let outcome = match result {
            Ok(()) => {
                tracing::info!(account = index, "✅ Keep-alive succeeded");
                let shot = self.capture(session.as_mut(), index, CaptureStatus::Success).await;
                self.notifier
                    .notify(&RunEvent::AccountSucceeded { index }, shot.as_deref())
                    .await;
                AttemptResult::Succeeded
            }
            Err(BrowserError::Timeout { operation }) => {
                tracing::warn!(account = index, %stage, "⏰ Timed out: {}", operation);
                let shot = self.capture(session.as_mut(), index, CaptureStatus::Timeout).await;
                self.notifier
                    .notify(&RunEvent::AccountTimedOut { index }, shot.as_deref())
                    .await;
                AttemptResult::TimedOut
            }
            Err(BrowserError::Other(detail)) => {
                tracing::error!(account = index, %stage, "❌ Login failed: {}", detail);
                let shot = self.capture(session.as_mut(), index, CaptureStatus::Error).await;
                self.notifier
                    .notify(
                        &RunEvent::AccountFailed {
                            index,
                            reason: detail,
                        },
                        shot.as_deref(),
                    )
                    .await;
                AttemptResult::Failed
            }
        };

        session.close().await;
        outcome
    }

    /// Walk the login stages until the authenticated page is reached
    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        account: &Account,
        index: usize,
        stage: &mut LoginStage,
    ) -> BrowserResult<()> {
        let timing = &self.timing;

        transition(stage, LoginStage::Landing, index);
        session
            .goto(&self.target.base_url, timing.landing_timeout())
            .await?;
        sleep(timing.landing_settle()).await;

        if !session.current_url().await?.contains(SIGNIN_MARKER) {
            // Existing session is still trusted
            transition(stage, LoginStage::Authenticated, index);
            return Ok(());
        }

        transition(stage, LoginStage::OAuthTrigger, index);
        session
            .click(&Locator::button(GITHUB_BUTTON), timing.oauth_button_timeout())
            .await?;
        sleep(timing.oauth_settle()).await;

        if session.current_url().await?.contains(GITHUB_LOGIN_MARKER) {
            transition(stage, LoginStage::CredentialEntry, index);
            self.enter_credentials(session, account).await?;

            let content = session.content().await?.to_lowercase();
            if content.contains(TWO_FACTOR_MARKER) {
                match &account.totp_secret {
                    Some(secret) => {
                        transition(stage, LoginStage::SecondFactor, index);
                        self.enter_one_time_code(session, secret).await?;
                    }
                    None => {
                        tracing::warn!(
                            account = index,
                            "Second factor requested but no TOTP secret configured"
                        );
                    }
                }
            }
        }

        if session.current_url().await?.contains(OAUTH_AUTHORIZE_MARKER) {
            transition(stage, LoginStage::AuthorizePrompt, index);
            // Already-authorized apps skip the consent screen
            if let Err(e) = session
                .click(
                    &Locator::button_ignore_case(AUTHORIZE_BUTTON),
                    timing.authorize_timeout(),
                )
                .await
            {
                tracing::debug!(account = index, "Authorize prompt not handled: {}", e);
            }
        }

        transition(stage, LoginStage::PostAuthNavigation, index);
        session
            .goto(&self.target.apps_url(), timing.post_auth_timeout())
            .await?;
        sleep(timing.post_auth_settle()).await;

        transition(stage, LoginStage::Authenticated, index);
        Ok(())
    }

    async fn enter_credentials(
        &self,
        session: &mut dyn BrowserSession,
        account: &Account,
    ) -> BrowserResult<()> {
        let timeout = self.timing.form_field_timeout();
        session
            .fill(&Locator::css(LOGIN_FIELD), &account.username, timeout)
            .await?;
        session
            .fill(&Locator::css(PASSWORD_FIELD), &account.password, timeout)
            .await?;
        session.click(&Locator::css(SUBMIT_BUTTON), timeout).await?;
        sleep(self.timing.credential_settle()).await;
        Ok(())
    }

    async fn enter_one_time_code(
        &self,
        session: &mut dyn BrowserSession,
        secret: &str,
    ) -> BrowserResult<()> {
        let code = self
            .otp
            .current_code(secret)
            .map_err(|e| BrowserError::Other(format!("One-time code generation failed: {}", e)))?;

        let timeout = self.timing.form_field_timeout();
        let otp_field = Locator::css(OTP_FIELD);
        session.fill(&otp_field, &code, timeout).await?;
        session.press_key(&otp_field, "Enter", timeout).await?;
        sleep(self.timing.second_factor_settle()).await;
        Ok(())
    }

    /// Best-effort full-page screenshot; `None` if it could not be taken
    async fn capture(
        &self,
        session: &mut dyn BrowserSession,
        index: usize,
        status: CaptureStatus,
    ) -> Option<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.screenshot_dir.join(format!(
            "clawcloud_{}_acc{}_{}.png",
            status.as_str(),
            index,
            timestamp
        ));

        match session.screenshot(&path, self.timing.screenshot_timeout()).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(account = index, "⚠️ Screenshot failed (ignored): {}", e);
                None
            }
        }
    }
}

fn transition(stage: &mut LoginStage, next: LoginStage, index: usize) {
    tracing::debug!(account = index, "Login stage: {} -> {}", stage, next);
    *stage = next;
}
