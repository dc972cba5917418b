//! Browser automation seam.
//!
//! Everything that touches a live page goes through [`UiDriver`]. The
//! production implementation speaks the W3C WebDriver protocol
//! ([`webdriver::WebDriverSession`]); tests use
//! `testing::ScriptedDriver` behind the `testing` feature.

pub mod session;
pub mod webdriver;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::DriverError;

pub use session::SessionGuard;
pub use webdriver::WebDriverSession;

/// Interval between element lookups while waiting for one to appear.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How to find elements on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn xpath(expression: &str) -> Self {
        Locator::XPath(expression.to_string())
    }

    /// Strategy name as used on the WebDriver wire.
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css selector",
            Locator::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::Css(v) | Locator::XPath(v) => v,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(v) => write!(f, "css:{}", v),
            Locator::XPath(v) => write!(f, "xpath:{}", v),
        }
    }
}

/// Opaque handle to an element found on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// One exclusive browser session.
///
/// All methods block. Waiting is expressed through [`UiDriver::pause`] so a
/// simulated driver can advance a virtual clock instead of sleeping.
pub trait UiDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Scrollable height of the current page.
    fn current_extent(&mut self) -> Result<u64, DriverError>;

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError>;

    fn scroll_to_top(&mut self) -> Result<(), DriverError>;

    /// Scrolls to `fraction` (0.0..=1.0) of the page height.
    fn scroll_to_fraction(&mut self, fraction: f64) -> Result<(), DriverError>;

    fn find(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError>;

    fn find_within(
        &mut self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError>;

    /// Brings the element into view and activates it.
    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError>;

    fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError>;

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError>;

    fn attribute(&mut self, element: &ElementRef, name: &str)
        -> Result<Option<String>, DriverError>;

    fn pause(&mut self, duration: Duration);

    fn quit(&mut self) -> Result<(), DriverError>;

    fn find_one(&mut self, locator: &Locator) -> Result<Option<ElementRef>, DriverError> {
        Ok(self.find(locator)?.into_iter().next())
    }

    /// Polls for the first element matching `locator`.
    ///
    /// Returns `Ok(None)` when nothing appears within `timeout`; a timeout is
    /// an answer, not an error.
    fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, DriverError> {
        let attempts = poll_attempts(timeout);
        for attempt in 0..=attempts {
            match self.find_one(locator) {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) | Err(DriverError::StaleElement(_)) => {}
                Err(e) => return Err(e),
            }
            if attempt < attempts {
                self.pause(POLL_INTERVAL);
            }
        }
        Ok(None)
    }

    fn classes(&mut self, element: &ElementRef) -> Result<Vec<String>, DriverError> {
        Ok(self
            .attribute(element, "class")?
            .map(|raw| raw.split_whitespace().map(String::from).collect())
            .unwrap_or_default())
    }
}

fn poll_attempts(timeout: Duration) -> u32 {
    (timeout.as_millis() / POLL_INTERVAL.as_millis()) as u32
}
