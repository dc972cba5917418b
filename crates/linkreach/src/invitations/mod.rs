//! Answering received connection invitations.
//!
//! The invitation manager page is another lazily loaded listing, so loading
//! reuses the harvest scroll loop. Each card is then read into an
//! [`Invitation`] and answered by clicking its accept or ignore button.

pub mod extract;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::batch::CancelFlag;
use crate::config::InvitationsConfig;
use crate::driver::{ElementRef, UiDriver};
use crate::error::DriverError;
use crate::harvest::{scroll_until_exhausted, ScrollBudget, StopReason};
use crate::sanitize;

pub use extract::read_card;

/// One pending invitation as shown on its card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub name: String,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
    pub mutual_connections: Option<String>,
    pub time_sent: Option<String>,
    pub image_url: Option<String>,
    pub is_verified: bool,
    pub follows_you: bool,
}

impl Invitation {
    /// Short label for logs and prompts.
    pub fn slug(&self) -> String {
        match &self.profile_url {
            Some(url) => sanitize::profile_slug(url),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationDecision {
    Accept,
    Ignore,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationOutcome {
    Accepted,
    Ignored,
    Skipped,
    /// The card or its button could not be found or clicked.
    Failed,
}

impl InvitationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationOutcome::Accepted => "accepted",
            InvitationOutcome::Ignored => "ignored",
            InvitationOutcome::Skipped => "skipped",
            InvitationOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for InvitationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredInvitation {
    pub name: String,
    pub profile_url: Option<String>,
    pub outcome: InvitationOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InvitationReport {
    pub answered: Vec<AnsweredInvitation>,
    pub accepted: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Invitations never reached because the review stopped early.
    pub remaining: usize,
    pub interrupted: bool,
}

impl InvitationReport {
    fn record(&mut self, invitation: &Invitation, outcome: InvitationOutcome) {
        match outcome {
            InvitationOutcome::Accepted => self.accepted += 1,
            InvitationOutcome::Ignored => self.ignored += 1,
            InvitationOutcome::Skipped => self.skipped += 1,
            InvitationOutcome::Failed => self.failed += 1,
        }
        self.answered.push(AnsweredInvitation {
            name: invitation.name.clone(),
            profile_url: invitation.profile_url.clone(),
            outcome,
        });
    }
}

pub struct InvitationManager {
    config: InvitationsConfig,
    budget: ScrollBudget,
}

impl InvitationManager {
    pub fn from_config(config: &InvitationsConfig) -> Self {
        Self {
            config: config.clone(),
            budget: ScrollBudget {
                max_scrolls: config.max_scrolls,
                pause: config.pause(),
                max_stalls: config.max_stalls,
                settle_pause: config.pause(),
                recovery_pause: config.pause(),
            },
        }
    }

    /// Opens the received-invitations page and reads every card on it.
    ///
    /// A page that shows no card within the load timeout has no pending
    /// invitations. Cards without a readable name are left out.
    pub fn load(&self, driver: &mut dyn UiDriver) -> Result<Vec<Invitation>, DriverError> {
        let _span = info_span!("invitations").entered();
        let locators = &self.config.locators;

        driver.navigate(&self.config.url)?;
        if driver
            .wait_for(&locators.card, self.config.load_timeout())?
            .is_none()
        {
            info!("No pending invitations");
            return Ok(Vec::new());
        }

        let summary = scroll_until_exhausted(driver, &locators.card, &self.budget);
        if summary.stop_reason == StopReason::BudgetReached {
            warn!(
                count = summary.entity_count,
                "Stopped scrolling invitations early; some may be missing"
            );
        }

        let cards = driver.find(&locators.card)?;
        let mut invitations = Vec::with_capacity(cards.len());
        for (index, card) in cards.iter().enumerate() {
            match read_card(driver, card, locators) {
                Some(invitation) => invitations.push(invitation),
                None => warn!(index, "Skipping invitation card without a name"),
            }
        }

        info!(
            cards = cards.len(),
            invitations = invitations.len(),
            "Loaded received invitations"
        );
        Ok(invitations)
    }

    /// Answers one invitation. `Skip` touches nothing.
    pub fn respond(
        &self,
        driver: &mut dyn UiDriver,
        invitation: &Invitation,
        decision: InvitationDecision,
    ) -> InvitationOutcome {
        let (button, done) = match decision {
            InvitationDecision::Skip => return InvitationOutcome::Skipped,
            InvitationDecision::Accept => {
                (&self.config.locators.accept_button, InvitationOutcome::Accepted)
            }
            InvitationDecision::Ignore => {
                (&self.config.locators.ignore_button, InvitationOutcome::Ignored)
            }
        };

        let Some(card) = self.locate(driver, invitation) else {
            warn!("Invitation card is no longer on the page");
            return InvitationOutcome::Failed;
        };

        let target = match driver.find_within(&card, button) {
            Ok(found) => found.into_iter().next(),
            Err(e) => {
                debug!(error = %e, "Button lookup failed");
                None
            }
        };
        let Some(target) = target else {
            warn!(button = %button, "Answer button not found on card");
            return InvitationOutcome::Failed;
        };

        if let Err(e) = driver.click(&target) {
            warn!(error = %e, "Could not click answer button");
            return InvitationOutcome::Failed;
        }
        driver.pause(self.config.after_action());
        info!(outcome = %done, "Answered invitation");
        done
    }

    /// Walks `invitations` in order, asking `decide` what to do with each.
    ///
    /// `decide` gets the invitation with its 1-based position and the total;
    /// returning `None` stops the review and leaves the rest unanswered.
    pub fn review<F>(
        &self,
        driver: &mut dyn UiDriver,
        invitations: &[Invitation],
        cancel: &CancelFlag,
        mut decide: F,
    ) -> InvitationReport
    where
        F: FnMut(&Invitation, usize, usize) -> Option<InvitationDecision>,
    {
        let total = invitations.len();
        let mut report = InvitationReport::default();

        for (index, invitation) in invitations.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Review interrupted");
                report.interrupted = true;
                report.remaining = total - index;
                break;
            }

            let _span = info_span!("invitation", who = %invitation.slug()).entered();
            let Some(decision) = decide(invitation, index + 1, total) else {
                info!("Review stopped");
                report.remaining = total - index;
                break;
            };

            let outcome = self.respond(driver, invitation, decision);
            report.record(invitation, outcome);

            let acted = matches!(decision, InvitationDecision::Accept | InvitationDecision::Ignore);
            if acted && index + 1 < total {
                driver.pause(self.config.between_actions());
            }
        }

        info!(
            accepted = report.accepted,
            ignored = report.ignored,
            skipped = report.skipped,
            failed = report.failed,
            remaining = report.remaining,
            "Finished reviewing invitations"
        );
        report
    }

    /// Finds the card for `invitation` again, by profile link or else by name.
    fn locate(&self, driver: &mut dyn UiDriver, invitation: &Invitation) -> Option<ElementRef> {
        let locators = &self.config.locators;
        let cards = match driver.find(&locators.card) {
            Ok(cards) => cards,
            Err(e) => {
                debug!(error = %e, "Card lookup failed");
                return None;
            }
        };

        cards.into_iter().find(|card| match &invitation.profile_url {
            Some(url) => extract::card_profile_url(driver, card, locators).as_ref() == Some(url),
            None => {
                extract::card_name(driver, card, None, locators).as_deref()
                    == Some(invitation.name.as_str())
            }
        })
    }
}
