//! Page-state checks, in priority order.
//!
//! Each check looks at the current page and answers `Some(detection)` or
//! `None`. Checks that open the overflow menu close it again unless they hand
//! back a menu item to click.

use tracing::debug;

use super::{Classifier, ConnectVia, Detection};
use crate::driver::{ElementRef, UiDriver};
use crate::error::DriverError;

pub(super) type Check =
    fn(&Classifier, &mut dyn UiDriver) -> Result<Option<Detection>, DriverError>;

pub(super) const CHECKS: [(&str, Check); 4] = [
    ("already_connected", already_connected),
    ("pending", pending),
    ("connect_in_menu", connect_in_menu),
    ("connect_direct", connect_direct),
];

fn already_connected(
    classifier: &Classifier,
    driver: &mut dyn UiDriver,
) -> Result<Option<Detection>, DriverError> {
    let Some(trigger) = open_menu(classifier, driver)? else {
        return Ok(None);
    };

    let found = driver.wait_for(
        &classifier.locators.menu_remove_connection,
        classifier.timeouts.menu_item(),
    );
    close_menu(driver, &trigger);

    Ok(found?.map(|_| Detection::AlreadyConnected))
}

fn pending(
    classifier: &Classifier,
    driver: &mut dyn UiDriver,
) -> Result<Option<Detection>, DriverError> {
    for button in driver.find(&classifier.locators.pending_button)? {
        let classes = driver.classes(&button)?;
        let verdict = classifier.pending_markers.evaluate(&classes);
        if verdict.is_accepted() {
            return Ok(Some(Detection::Pending));
        }
        debug!(?verdict, "Pending-labelled control lacks pending markers");
    }
    Ok(None)
}

fn connect_in_menu(
    classifier: &Classifier,
    driver: &mut dyn UiDriver,
) -> Result<Option<Detection>, DriverError> {
    let Some(trigger) = open_menu(classifier, driver)? else {
        return Ok(None);
    };

    match driver.wait_for(&classifier.locators.menu_connect, classifier.timeouts.menu_item()) {
        // Menu stays open so the item can be clicked.
        Ok(Some(element)) => Ok(Some(Detection::Connect {
            element,
            via: ConnectVia::Menu,
        })),
        Ok(None) => {
            close_menu(driver, &trigger);
            Ok(None)
        }
        Err(e) => {
            close_menu(driver, &trigger);
            Err(e)
        }
    }
}

fn connect_direct(
    classifier: &Classifier,
    driver: &mut dyn UiDriver,
) -> Result<Option<Detection>, DriverError> {
    let locators = &classifier.locators;
    if driver
        .wait_for(&locators.connect_label, classifier.timeouts.direct_button())?
        .is_none()
    {
        return Ok(None);
    }

    // Several labels can match (sidebar suggestions); take the first one
    // whose button carries the full marker set.
    for label in driver.find(&locators.connect_label)? {
        let Some(button) = driver
            .find_within(&label, &locators.label_parent)?
            .into_iter()
            .next()
        else {
            continue;
        };

        let classes = driver.classes(&button)?;
        let verdict = classifier.connect_markers.evaluate(&classes);
        if verdict.is_accepted() {
            return Ok(Some(Detection::Connect {
                element: button,
                via: ConnectVia::Direct,
            }));
        }
        debug!(?verdict, "Connect control lacks expected markers, treating as absent");
    }

    Ok(None)
}

fn open_menu(
    classifier: &Classifier,
    driver: &mut dyn UiDriver,
) -> Result<Option<ElementRef>, DriverError> {
    let Some(trigger) = driver.wait_for(&classifier.locators.more_button, classifier.timeouts.menu())?
    else {
        return Ok(None);
    };

    driver.click(&trigger)?;
    driver.pause(classifier.timeouts.after_click());
    Ok(Some(trigger))
}

/// The trigger toggles the menu.
fn close_menu(driver: &mut dyn UiDriver, trigger: &ElementRef) {
    if let Err(e) = driver.click(trigger) {
        debug!(error = %e, "Failed to close overflow menu");
    }
}
