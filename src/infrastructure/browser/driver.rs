use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Failure of a browser operation, tagged by kind so callers branch on it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// A bounded operation did not finish in time
    #[error("Timed out: {operation}")]
    Timeout { operation: String },

    /// Navigation error, missing element, crashed browser, ...
    #[error("{0}")]
    Other(String),
}

impl BrowserError {
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        match err {
            chromiumoxide::error::CdpError::Timeout => Self::timeout("CDP request"),
            other => Self::Other(other.to_string()),
        }
    }
}

pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// A button by its visible name
    Button { name: String, case_insensitive: bool },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn button(name: impl Into<String>) -> Self {
        Self::Button {
            name: name.into(),
            case_insensitive: false,
        }
    }

    pub fn button_ignore_case(name: impl Into<String>) -> Self {
        Self::Button {
            name: name.into(),
            case_insensitive: true,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "{}", selector),
            Self::Button {
                name,
                case_insensitive,
            } => write!(
                f,
                "button[name={:?}{}]",
                name,
                if *case_insensitive { " i" } else { "" }
            ),
        }
    }
}

/// Launches fresh browser sessions
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Start a new isolated session (own browser process and profile)
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>>;
}

/// One browser-driven interaction, scoped to a single login attempt
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for the load to finish
    async fn goto(&mut self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Wait for the element then click it
    async fn click(&mut self, locator: &Locator, timeout: Duration) -> BrowserResult<()>;

    /// Wait for the field, focus it and type `value`
    async fn fill(&mut self, locator: &Locator, value: &str, timeout: Duration)
        -> BrowserResult<()>;

    /// Press a named key (e.g. "Enter") on the element
    async fn press_key(&mut self, locator: &Locator, key: &str, timeout: Duration)
        -> BrowserResult<()>;

    /// Current page URL
    async fn current_url(&mut self) -> BrowserResult<String>;

    /// Current page HTML
    async fn content(&mut self) -> BrowserResult<String>;

    /// Write a full-page PNG to `path`
    async fn screenshot(&mut self, path: &Path, timeout: Duration) -> BrowserResult<PathBuf>;

    /// Release the browser. Errors are logged, never returned.
    async fn close(self: Box<Self>);
}
