//! Reading one invitation card.
//!
//! Cards carry no labelled fields, only a few lines of text, so each line is
//! sorted by what it looks like: the mutual-connections line, the "sent 3 days
//! ago" line, and the headline, which is whatever is left.

use tracing::debug;

use super::Invitation;
use crate::config::InvitationLocators;
use crate::driver::{ElementRef, Locator, UiDriver};

const TIME_WORDS: &[&str] = &[
    "today",
    "yesterday",
    "hour",
    "hours",
    "day",
    "days",
    "week",
    "weeks",
    "month",
    "months",
];

pub(crate) fn is_time_line(line: &str) -> bool {
    line.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| TIME_WORDS.contains(&word))
}

pub(crate) fn is_mutual_line(line: &str) -> bool {
    line.to_lowercase().contains("mutual connection")
}

fn mentions_follow(line: &str) -> bool {
    line.to_lowercase().contains("follows you")
}

/// `"Jane Doe's profile picture"` gives `"Jane Doe"`.
pub(crate) fn name_from_label(label: &str) -> Option<String> {
    let rest = label.trim().strip_suffix("profile picture")?.trim_end();
    let name = rest
        .strip_suffix("'s")
        .or_else(|| rest.strip_suffix("\u{2019}s"))
        .unwrap_or(rest)
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Reads the details shown on one card.
///
/// Returns `None` when no name can be found; such a card can be neither shown
/// nor matched again later. Lookup failures for the other fields leave them
/// empty.
pub fn read_card(
    driver: &mut dyn UiDriver,
    card: &ElementRef,
    locators: &InvitationLocators,
) -> Option<Invitation> {
    let link = first_within(driver, card, &locators.profile_link);
    let profile_url = link.as_ref().and_then(|l| attribute(driver, l, "href"));
    let name = card_name(driver, card, link.as_ref(), locators)?;

    let line_elements = all_within(driver, card, &locators.text_lines);
    let lines: Vec<String> = line_elements
        .iter()
        .filter_map(|element| text(driver, element))
        .filter(|line| !line.is_empty())
        .collect();

    let mutual_connections = lines.iter().find(|l| is_mutual_line(l)).cloned();
    let time_sent = lines
        .iter()
        .find(|l| !is_mutual_line(l) && is_time_line(l))
        .cloned();
    let headline = lines
        .iter()
        .find(|l| {
            **l != name && !is_mutual_line(l) && !is_time_line(l) && !mentions_follow(l)
        })
        .cloned();

    let image_url = first_within(driver, card, &locators.image)
        .and_then(|image| attribute(driver, &image, "src"));
    let is_verified = first_within(driver, card, &locators.verified_badge).is_some();
    let follows_you = lines.iter().any(|l| mentions_follow(l))
        || text(driver, card).is_some_and(|t| mentions_follow(&t));

    Some(Invitation {
        name,
        headline,
        profile_url,
        mutual_connections,
        time_sent,
        image_url,
        is_verified,
        follows_you,
    })
}

/// Profile link of a card, used to find the card again before answering.
pub(crate) fn card_profile_url(
    driver: &mut dyn UiDriver,
    card: &ElementRef,
    locators: &InvitationLocators,
) -> Option<String> {
    first_within(driver, card, &locators.profile_link).and_then(|l| attribute(driver, &l, "href"))
}

/// Name from the bold name element, falling back to the picture label.
pub(crate) fn card_name(
    driver: &mut dyn UiDriver,
    card: &ElementRef,
    link: Option<&ElementRef>,
    locators: &InvitationLocators,
) -> Option<String> {
    let shown = first_within(driver, card, &locators.name)
        .and_then(|element| text(driver, &element))
        .filter(|name| !name.is_empty());
    if shown.is_some() {
        return shown;
    }

    let link = match link {
        Some(link) => Some(link.clone()),
        None => first_within(driver, card, &locators.profile_link),
    }?;
    attribute(driver, &link, "aria-label").and_then(|label| name_from_label(&label))
}

fn all_within(driver: &mut dyn UiDriver, card: &ElementRef, locator: &Locator) -> Vec<ElementRef> {
    driver.find_within(card, locator).unwrap_or_else(|e| {
        debug!(locator = %locator, error = %e, "Lookup inside card failed");
        Vec::new()
    })
}

fn first_within(driver: &mut dyn UiDriver, card: &ElementRef, locator: &Locator) -> Option<ElementRef> {
    all_within(driver, card, locator).into_iter().next()
}

fn text(driver: &mut dyn UiDriver, element: &ElementRef) -> Option<String> {
    match driver.text(element) {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            debug!(error = %e, "Could not read element text");
            None
        }
    }
}

fn attribute(driver: &mut dyn UiDriver, element: &ElementRef, name: &str) -> Option<String> {
    match driver.attribute(element, name) {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            debug!(attribute = name, error = %e, "Could not read attribute");
            None
        }
    }
}
