use super::driver::{BrowserDriver, BrowserError, BrowserResult, BrowserSession, Locator};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use crate::infrastructure::config::BrowserSettings;

/// Poll interval while waiting for an element to appear
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Empties an input so typing replaces its value
const CLEAR_VALUE_JS: &str =
    "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }";

/// Chromium browser driver using chromiumoxide
pub struct ChromiumDriver {
    settings: BrowserSettings,
    profile_root: PathBuf,
}

impl ChromiumDriver {
    /// Each session gets a throwaway profile directory under `profile_root`
    pub fn new(settings: BrowserSettings, profile_root: PathBuf) -> Self {
        Self {
            settings,
            profile_root,
        }
    }

    fn build_config(&self, user_data_dir: &Path) -> BrowserResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.settings.viewport_width, self.settings.viewport_height + 120)
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: self.settings.viewport_width,
                height: self.settings.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .user_data_dir(user_data_dir)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-infobars")
            .arg("--mute-audio")
            .arg("--hide-scrollbars");

        if self.settings.headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        if self.settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &self.settings.executable {
            builder = builder.chrome_executable(executable);
        }

        builder
            .build()
            .map_err(|e| BrowserError::Other(format!("Failed to build browser config: {}", e)))
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open_session(&self) -> BrowserResult<Box<dyn BrowserSession>> {
        std::fs::create_dir_all(&self.profile_root).map_err(|e| {
            BrowserError::Other(format!("Failed to create profile root: {}", e))
        })?;
        let profile = tempfile::Builder::new()
            .prefix("session-")
            .tempdir_in(&self.profile_root)
            .map_err(|e| BrowserError::Other(format!("Failed to create profile dir: {}", e)))?;

        let config = self.build_config(profile.path())?;
        tracing::debug!("Launching browser with profile {:?}", profile.path());

        let (browser, mut handler) = Browser::launch(config).await?;

        // Spawn handler task
        let handler_handle = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Events are handled internally by chromiumoxide
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let session = ChromiumSession {
                    browser,
                    page: None,
                    handler_handle,
                    _profile: profile,
                };
                Box::new(session).close().await;
                return Err(e.into());
            }
        };

        tracing::info!("Browser session opened");
        Ok(Box::new(ChromiumSession {
            browser,
            page: Some(page),
            handler_handle,
            _profile: profile,
        }))
    }
}

/// A launched Chromium process with a single page
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_handle: tokio::task::JoinHandle<()>,
    // Deleted on drop, after the browser has exited
    _profile: TempDir,
}

impl ChromiumSession {
    fn page(&self) -> BrowserResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::Other("Browser page not available".to_string()))
    }

    /// Poll until the element exists or `timeout` elapses
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> BrowserResult<Element> {
        let page = self.page()?;
        let start = std::time::Instant::now();

        loop {
            let found = match locator {
                Locator::Css(selector) => page.find_element(selector.as_str()).await,
                Locator::Button { .. } => page
                    .find_xpaths(button_xpath(locator))
                    .await
                    .and_then(|elements| elements.into_iter().next().ok_or(CdpError::NotFound)),
            };

            match found {
                Ok(element) => return Ok(element),
                Err(e) if !is_element_missing(&e) => return Err(e.into()),
                Err(_) if start.elapsed() < timeout => {
                    tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
                }
                Err(_) => {
                    return Err(BrowserError::timeout(format!(
                        "waiting for {} ({}ms)",
                        locator,
                        timeout.as_millis()
                    )))
                }
            }
        }
    }
}

/// Lookup failures that mean "not there yet" rather than a broken browser.
/// A CSS miss surfaces as a protocol error for node id 0.
fn is_element_missing(err: &CdpError) -> bool {
    matches!(err, CdpError::NotFound | CdpError::Chrome(_))
}

/// Run `fut` with an upper bound, mapping elapse to a tagged timeout
async fn bounded<T, F>(operation: String, timeout: Duration, fut: F) -> BrowserResult<T>
where
    F: Future<Output = BrowserResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(BrowserError::timeout(format!(
            "{} ({}ms)",
            operation,
            timeout.as_millis()
        ))),
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> BrowserResult<()> {
        let page = self.page()?;
        bounded(format!("navigating to {}", url), timeout, async {
            page.goto(url).await?;
            Ok::<_, BrowserError>(())
        })
        .await?;
        tracing::debug!("Navigated to {}", url);
        Ok(())
    }

    async fn click(&mut self, locator: &Locator, timeout: Duration) -> BrowserResult<()> {
        bounded(format!("clicking {}", locator), timeout, async {
            let element = self.wait_for(locator, timeout).await?;
            element.click().await?;
            Ok::<_, BrowserError>(())
        })
        .await?;
        tracing::debug!("Clicked element {}", locator);
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str, timeout: Duration) -> BrowserResult<()> {
        bounded(format!("filling {}", locator), timeout, async {
            let element = self.wait_for(locator, timeout).await?;
            element.call_js_fn(CLEAR_VALUE_JS, false).await?;
            element.click().await?;
            element.type_str(value).await?;
            Ok::<_, BrowserError>(())
        })
        .await?;
        tracing::debug!("Input text into {}", locator);
        Ok(())
    }

    async fn press_key(&mut self, locator: &Locator, key: &str, timeout: Duration) -> BrowserResult<()> {
        bounded(format!("pressing {} on {}", key, locator), timeout, async {
            let element = self.wait_for(locator, timeout).await?;
            element.press_key(key).await?;
            Ok::<_, BrowserError>(())
        })
        .await
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        Ok(self.page()?.url().await?.unwrap_or_default())
    }

    async fn content(&mut self) -> BrowserResult<String> {
        Ok(self.page()?.content().await?)
    }

    async fn screenshot(&mut self, path: &Path, timeout: Duration) -> BrowserResult<PathBuf> {
        let page = self.page()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BrowserError::Other(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        bounded("capturing screenshot".to_string(), timeout, async {
            page.save_screenshot(params, path).await?;
            Ok::<_, BrowserError>(())
        })
        .await?;
        Ok(path.to_path_buf())
    }

    async fn close(mut self: Box<Self>) {
        self.page = None;

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler_handle.abort();

        tracing::info!("Browser session closed");
    }
}

/// XPath matching a button-like element whose text (or value) contains the name
fn button_xpath(locator: &Locator) -> String {
    let Locator::Button {
        name,
        case_insensitive,
    } = locator
    else {
        return String::new();
    };

    const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

    let (text, value, needle) = if *case_insensitive {
        (
            format!("translate(normalize-space(.), '{}', '{}')", UPPER, LOWER),
            format!("translate(@value, '{}', '{}')", UPPER, LOWER),
            xpath_literal(&name.to_lowercase()),
        )
    } else {
        (
            "normalize-space(.)".to_string(),
            "@value".to_string(),
            xpath_literal(name),
        )
    };

    format!(
        "//*[self::button or @role='button'][contains({text}, {needle})] \
         | //input[@type='submit' or @type='button'][contains({value}, {needle})]"
    )
}

/// Quote a string for XPath 1.0, which has no escape sequences
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value.split('\'').map(|part| format!("'{}'", part)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_xpath_case_sensitive() {
        let xpath = button_xpath(&Locator::button("GitHub"));
        assert!(xpath.contains("contains(normalize-space(.), 'GitHub')"));
        assert!(xpath.contains("contains(@value, 'GitHub')"));
    }

    #[test]
    fn test_button_xpath_ignores_case() {
        let xpath = button_xpath(&Locator::button_ignore_case("Authorize"));
        assert!(xpath.contains("translate(normalize-space(.)"));
        assert!(xpath.contains("'authorize'"));
        assert!(!xpath.contains("'Authorize'"));
    }

    #[test]
    fn test_only_missing_elements_are_polled() {
        assert!(is_element_missing(&CdpError::NotFound));
        assert!(!is_element_missing(&CdpError::NoResponse));
        assert!(!is_element_missing(&CdpError::Timeout));
    }

    #[test]
    fn test_lookup_errors_keep_their_class() {
        assert!(matches!(
            BrowserError::from(CdpError::NoResponse),
            BrowserError::Other(_)
        ));
        assert!(matches!(
            BrowserError::from(CdpError::Timeout),
            BrowserError::Timeout { .. }
        ));
    }

    #[test]
    fn test_clear_script_empties_value() {
        assert!(CLEAR_VALUE_JS.starts_with("function()"));
        assert!(CLEAR_VALUE_JS.contains("this.value = ''"));
    }

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')"
        );
    }
}
