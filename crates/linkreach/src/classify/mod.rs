//! Decides what can be done on one profile page and, when a connection
//! request is possible, sends it.
//!
//! Detection runs an ordered list of checks (see [`checks`]); the first check
//! that recognises the page wins. Only a [`Detection::Connect`] leads to an
//! action, and at most one action is taken per page.

mod checks;
pub mod markers;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ProfileConfig, ProfileLocators, ProfileTimeouts};
use crate::driver::{ElementRef, UiDriver};
use crate::error::DriverError;
use markers::MarkerRule;

/// Terminal result of visiting one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    AlreadyConnected,
    Pending,
    ConnectionSent,
    EmailRequired,
    NotAvailable,
    ActionFailed,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::AlreadyConnected,
        Outcome::Pending,
        Outcome::ConnectionSent,
        Outcome::EmailRequired,
        Outcome::NotAvailable,
        Outcome::ActionFailed,
    ];

    /// Whether the visit produced a new connection request.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::ConnectionSent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::AlreadyConnected => "already_connected",
            Outcome::Pending => "pending",
            Outcome::ConnectionSent => "connection_sent",
            Outcome::EmailRequired => "email_required",
            Outcome::NotAvailable => "not_available",
            Outcome::ActionFailed => "action_failed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an actionable connect control was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectVia {
    /// Item inside the open overflow menu.
    Menu,
    /// Button directly on the profile header.
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    AlreadyConnected,
    Pending,
    Connect { element: ElementRef, via: ConnectVia },
}

pub struct Classifier {
    locators: ProfileLocators,
    connect_markers: MarkerRule,
    pending_markers: MarkerRule,
    timeouts: ProfileTimeouts,
}

impl Classifier {
    pub fn from_config(config: &ProfileConfig) -> Self {
        Self {
            locators: config.locators.clone(),
            connect_markers: config.connect_markers.clone(),
            pending_markers: config.pending_markers.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    /// Classifies the page currently loaded in `driver`, sending a connection
    /// request if one is possible. Never fails: driver problems while
    /// detecting fall through to the next check, driver problems while acting
    /// become [`Outcome::ActionFailed`].
    pub fn classify(&self, driver: &mut dyn UiDriver) -> Outcome {
        match self.detect(driver) {
            None => {
                info!("No connect option on this profile");
                Outcome::NotAvailable
            }
            Some(Detection::AlreadyConnected) => {
                info!("Already connected");
                Outcome::AlreadyConnected
            }
            Some(Detection::Pending) => {
                info!("Connection request already pending");
                Outcome::Pending
            }
            Some(Detection::Connect { element, via }) => {
                debug!(?via, "Connect control found");
                match self.send(driver, &element) {
                    Ok(outcome) => {
                        info!(outcome = %outcome, "Connect action finished");
                        outcome
                    }
                    Err(e) => {
                        warn!(error = %e, "Connect action failed");
                        Outcome::ActionFailed
                    }
                }
            }
        }
    }

    /// Runs the checks in order and returns the first detection.
    pub fn detect(&self, driver: &mut dyn UiDriver) -> Option<Detection> {
        for (name, check) in checks::CHECKS {
            match check(self, driver) {
                Ok(Some(detection)) => {
                    debug!(check = name, "Check matched");
                    return Some(detection);
                }
                Ok(None) => debug!(check = name, "Check did not match"),
                Err(e) => debug!(check = name, error = %e, "Check failed, treating as no match"),
            }
        }
        None
    }

    fn send(&self, driver: &mut dyn UiDriver, control: &ElementRef) -> Result<Outcome, DriverError> {
        driver.click(control)?;
        driver.pause(self.timeouts.after_click());

        if driver
            .wait_for(&self.locators.email_dialog, self.timeouts.email_dialog())?
            .is_some()
        {
            self.dismiss_dialog(driver);
            return Ok(Outcome::EmailRequired);
        }

        match driver.wait_for(&self.locators.send_without_note, self.timeouts.confirm())? {
            Some(confirm) => {
                driver.click(&confirm)?;
                driver.pause(self.timeouts.after_click());
            }
            None => debug!("No confirmation prompt appeared, request counts as sent"),
        }

        Ok(Outcome::ConnectionSent)
    }

    fn dismiss_dialog(&self, driver: &mut dyn UiDriver) {
        let dismissed = driver
            .find_one(&self.locators.dialog_dismiss)
            .and_then(|button| match button {
                Some(button) => driver.click(&button).map(|_| true),
                None => Ok(false),
            });
        match dismissed {
            Ok(true) => debug!("Email verification dialog dismissed"),
            Ok(false) => debug!("Email verification dialog has no dismiss button"),
            Err(e) => debug!(error = %e, "Could not dismiss email verification dialog"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serde_names() {
        for outcome in Outcome::ALL {
            let json = serde_json::to_string(&outcome).unwrap();
            assert_eq!(json, format!("\"{}\"", outcome.as_str()));
        }
    }

    #[test]
    fn test_only_sent_counts_as_success() {
        let successes: Vec<Outcome> = Outcome::ALL.into_iter().filter(Outcome::is_success).collect();
        assert_eq!(successes, vec![Outcome::ConnectionSent]);
    }
}
