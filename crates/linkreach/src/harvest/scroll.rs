//! Deciding when an infinite-scroll listing has finished loading.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::HarvestConfig;
use crate::driver::{Locator, UiDriver};

#[derive(Debug, Clone)]
pub struct ScrollBudget {
    pub max_scrolls: u32,
    pub pause: Duration,
    pub max_stalls: u32,
    pub settle_pause: Duration,
    pub recovery_pause: Duration,
}

impl From<&HarvestConfig> for ScrollBudget {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            max_scrolls: config.max_scrolls,
            pause: config.pause(),
            max_stalls: config.max_stalls,
            settle_pause: config.settle_pause(),
            recovery_pause: config.recovery_pause(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Neither page height nor entity count moved after the extra wait.
    Settled,
    /// The top-and-back recovery scroll also produced nothing new.
    Exhausted,
    /// Scroll budget used up while content may still be loading.
    BudgetReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSummary {
    pub scrolls: u32,
    pub entity_count: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observation {
    count: usize,
    extent: u64,
}

/// Scrolls until the listing stops growing or the budget runs out.
///
/// Observation failures are treated as "nothing changed", so this never
/// fails. Every pass through the loop spends at least one scroll attempt,
/// which bounds the run to `max_scrolls` passes.
pub fn scroll_until_exhausted(
    driver: &mut dyn UiDriver,
    entities: &Locator,
    budget: &ScrollBudget,
) -> ScrollSummary {
    let mut last = observe(driver, entities, None);
    let mut stalls = 0u32;
    let mut scrolls = 0u32;

    debug!(count = last.count, extent = last.extent, "Baseline observation");

    let stop_reason = loop {
        if scrolls >= budget.max_scrolls {
            warn!(
                scrolls,
                count = last.count,
                "Scroll budget reached; listing may be incomplete"
            );
            break StopReason::BudgetReached;
        }

        scroll(driver, ScrollMove::Bottom);
        driver.pause(budget.pause);
        scrolls += 1;

        let current = observe(driver, entities, Some(last));
        if current.count > last.count {
            debug!(scrolls, count = current.count, "Listing grew");
            stalls = 0;
            last = current;
            continue;
        }

        stalls += 1;
        debug!(scrolls, stalls, count = current.count, "No new entities");

        if current.extent == last.extent {
            driver.pause(budget.settle_pause);
            let settled = observe(driver, entities, Some(last));
            if settled.count > last.count {
                stalls = 0;
                last = settled;
                continue;
            }
            if settled.extent == last.extent {
                break StopReason::Settled;
            }
            last.extent = settled.extent;
        } else {
            last.extent = current.extent;
        }

        if stalls >= budget.max_stalls {
            if scrolls >= budget.max_scrolls {
                continue;
            }
            debug!(stalls, "Trying recovery scroll");
            scroll(driver, ScrollMove::Top);
            driver.pause(budget.pause);
            scroll(driver, ScrollMove::Bottom);
            driver.pause(budget.recovery_pause);
            scrolls += 1;

            let recovered = observe(driver, entities, Some(last));
            if recovered.count > last.count {
                info!(count = recovered.count, "Recovery scroll loaded more entities");
                stalls = 0;
                last = recovered;
                continue;
            }
            break StopReason::Exhausted;
        }
    };

    info!(
        scrolls,
        count = last.count,
        reason = ?stop_reason,
        "Finished scrolling listing"
    );

    ScrollSummary {
        scrolls,
        entity_count: last.count,
        stop_reason,
    }
}

enum ScrollMove {
    Top,
    Bottom,
}

fn scroll(driver: &mut dyn UiDriver, movement: ScrollMove) {
    let result = match movement {
        ScrollMove::Top => driver.scroll_to_top(),
        ScrollMove::Bottom => driver.scroll_to_bottom(),
    };
    if let Err(e) = result {
        debug!(error = %e, "Scroll command failed");
    }
}

/// Falls back to the previous observation (or zero) for any value the driver
/// cannot report.
fn observe(
    driver: &mut dyn UiDriver,
    entities: &Locator,
    previous: Option<Observation>,
) -> Observation {
    let count = match driver.find(entities) {
        Ok(found) => found.len(),
        Err(e) => {
            debug!(error = %e, "Could not count entities");
            previous.map(|p| p.count).unwrap_or(0)
        }
    };
    let extent = match driver.current_extent() {
        Ok(extent) => extent,
        Err(e) => {
            debug!(error = %e, "Could not read page extent");
            previous.map(|p| p.extent).unwrap_or(0)
        }
    };
    Observation { count, extent }
}
