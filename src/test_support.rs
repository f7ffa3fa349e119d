//! Test-only fakes for the browser, notifier, one-time codes and state storage.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::model::StateMap;
use crate::domain::repository::{Result, StateRepository};
use crate::infrastructure::browser::{
    BrowserDriver, BrowserError, BrowserResult, BrowserSession, Locator,
};
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::otp::OtpProvider;

#[derive(Default)]
struct MemoryInner {
    stored: StateMap,
    loads: usize,
    saves: usize,
    fail_saves: bool,
}

/// In-memory repository that records how often it is read and written
#[derive(Clone, Default)]
pub struct MemoryStateRepository {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStateRepository {
    pub fn with_state(state: StateMap) -> Self {
        let repo = Self::default();
        repo.inner.lock().unwrap().stored = state;
        repo
    }

    pub fn stored(&self) -> StateMap {
        self.inner.lock().unwrap().stored.clone()
    }

    pub fn load_count(&self) -> usize {
        self.inner.lock().unwrap().loads
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap().saves
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().unwrap().fail_saves = fail;
    }
}

impl StateRepository for MemoryStateRepository {
    fn load(&self) -> StateMap {
        let mut inner = self.inner.lock().unwrap();
        inner.loads += 1;
        inner.stored.clone()
    }

    fn save(&self, state: &StateMap) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_saves {
            return Err(DomainError::Storage("disk full".to_string()));
        }
        inner.saves += 1;
        inner.stored = state.clone();
        Ok(())
    }
}

/// Browser operation as seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCall {
    Open,
    Goto(String),
    Click(Locator),
    Fill(Locator, String),
    PressKey(Locator, String),
    Screenshot(PathBuf),
    Close,
}

/// Scripted behaviour for one session
#[derive(Debug, Clone, Default)]
pub struct SessionScript {
    /// URL reported after each navigation or click, consumed in order.
    /// The last entry sticks once the queue runs dry.
    pub urls: Vec<String>,
    /// Page HTML returned by `content`
    pub content: String,
    /// Fail the first operation whose description contains the key
    pub fail_on: Option<(String, BrowserError)>,
    /// Make screenshots fail
    pub screenshot_fails: bool,
}

impl SessionScript {
    pub fn with_urls(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing(mut self, key: &str, error: BrowserError) -> Self {
        self.fail_on = Some((key.to_string(), error));
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }
}

#[derive(Default)]
struct FakeInner {
    scripts: VecDeque<SessionScript>,
    calls: Vec<BrowserCall>,
    open_sessions: usize,
    open_error: Option<BrowserError>,
}

/// Browser driver that replays one `SessionScript` per opened session
#[derive(Clone, Default)]
pub struct FakeBrowser {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeBrowser {
    pub fn new(scripts: Vec<SessionScript>) -> Self {
        let browser = Self::default();
        browser.inner.lock().unwrap().scripts = scripts.into();
        browser
    }

    pub fn failing_open(error: BrowserError) -> Self {
        let browser = Self::default();
        browser.inner.lock().unwrap().open_error = Some(error);
        browser
    }

    pub fn calls(&self) -> Vec<BrowserCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &BrowserCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn open_count(&self) -> usize {
        self.count(&BrowserCall::Open)
    }

    /// Sessions opened but not yet closed
    pub fn open_sessions(&self) -> usize {
        self.inner.lock().unwrap().open_sessions
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(BrowserCall::Open);
        if let Some(error) = inner.open_error.clone() {
            return Err(error);
        }
        let script = inner.scripts.pop_front().unwrap_or_default();
        inner.open_sessions += 1;
        Ok(Box::new(FakeSession {
            browser: self.clone(),
            urls: script.urls.clone().into(),
            current_url: "about:blank".to_string(),
            script,
        }))
    }
}

struct FakeSession {
    browser: FakeBrowser,
    script: SessionScript,
    urls: VecDeque<String>,
    current_url: String,
}

impl FakeSession {
    fn record(&mut self, call: BrowserCall, description: &str) -> BrowserResult<()> {
        self.browser.inner.lock().unwrap().calls.push(call);
        if let Some((key, error)) = &self.script.fail_on {
            if description.contains(key.as_str()) {
                let error = error.clone();
                self.script.fail_on = None;
                return Err(error);
            }
        }
        Ok(())
    }

    fn advance_url(&mut self) {
        if let Some(next) = self.urls.pop_front() {
            self.current_url = next;
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> BrowserResult<()> {
        self.record(BrowserCall::Goto(url.to_string()), &format!("goto {}", url))?;
        self.advance_url();
        Ok(())
    }

    async fn click(&mut self, locator: &Locator, _timeout: Duration) -> BrowserResult<()> {
        self.record(BrowserCall::Click(locator.clone()), &format!("click {}", locator))?;
        self.advance_url();
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str, _timeout: Duration) -> BrowserResult<()> {
        self.record(
            BrowserCall::Fill(locator.clone(), value.to_string()),
            &format!("fill {}", locator),
        )
    }

    async fn press_key(&mut self, locator: &Locator, key: &str, _timeout: Duration) -> BrowserResult<()> {
        self.record(
            BrowserCall::PressKey(locator.clone(), key.to_string()),
            &format!("press {} {}", key, locator),
        )?;
        self.advance_url();
        Ok(())
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        Ok(self.current_url.clone())
    }

    async fn content(&mut self) -> BrowserResult<String> {
        Ok(self.script.content.clone())
    }

    async fn screenshot(&mut self, path: &Path, _timeout: Duration) -> BrowserResult<PathBuf> {
        self.browser
            .inner
            .lock()
            .unwrap()
            .calls
            .push(BrowserCall::Screenshot(path.to_path_buf()));
        if self.script.screenshot_fails {
            return Err(BrowserError::timeout("capturing screenshot"));
        }
        Ok(path.to_path_buf())
    }

    async fn close(self: Box<Self>) {
        let mut inner = self.browser.inner.lock().unwrap();
        inner.calls.push(BrowserCall::Close);
        inner.open_sessions -= 1;
    }
}

/// Notification as captured by `RecordingNotifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub text: String,
    pub photo: Option<PathBuf>,
}

/// Notifier that keeps every message in memory
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_photo(&self, photo: &Path, caption: &str) {
        self.sent.lock().unwrap().push(SentMessage {
            text: caption.to_string(),
            photo: Some(photo.to_path_buf()),
        });
    }

    async fn send_text(&self, text: &str) {
        self.sent.lock().unwrap().push(SentMessage {
            text: text.to_string(),
            photo: None,
        });
    }
}

/// One-time code provider returning a fixed code
pub struct FixedOtp(pub &'static str);

impl OtpProvider for FixedOtp {
    fn current_code(&self, _secret: &str) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

/// One-time code provider that rejects every secret
pub struct RejectingOtp;

impl OtpProvider for RejectingOtp {
    fn current_code(&self, _secret: &str) -> anyhow::Result<String> {
        anyhow::bail!("Invalid base32 TOTP secret")
    }
}
