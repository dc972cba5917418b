use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use super::UiDriver;

/// Owns a driver for the length of a run and closes the browser on drop,
/// including when the run ends early through an error or an interruption.
pub struct SessionGuard<D: UiDriver> {
    driver: D,
    closed: bool,
}

impl<D: UiDriver> SessionGuard<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            closed: false,
        }
    }

    /// Closes the session now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.driver.quit() {
            Ok(()) => debug!("Browser session closed"),
            Err(e) => warn!(error = %e, "Failed to close browser session cleanly"),
        }
    }
}

impl<D: UiDriver> Deref for SessionGuard<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.driver
    }
}

impl<D: UiDriver> DerefMut for SessionGuard<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: UiDriver> Drop for SessionGuard<D> {
    fn drop(&mut self) {
        self.release();
    }
}
