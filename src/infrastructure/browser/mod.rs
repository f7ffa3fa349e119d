mod chromium;
mod driver;

pub use chromium::ChromiumDriver;
pub use driver::{BrowserDriver, BrowserError, BrowserResult, BrowserSession, Locator};
