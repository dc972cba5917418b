pub mod filter;
pub mod scroll;

use tracing::{debug, info, info_span};

use crate::config::{DirectoryConfig, HarvestConfig};
use crate::driver::{Locator, UiDriver};
use crate::error::{ConfigError, DriverError};
use crate::sanitize;

pub use filter::{EntityReference, ReferenceFilter};
pub use scroll::{scroll_until_exhausted, ScrollBudget, ScrollSummary, StopReason};

#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub references: Vec<EntityReference>,
    pub scroll: ScrollSummary,
    /// Links seen on the final page before filtering.
    pub raw_link_count: usize,
}

impl HarvestReport {
    pub fn is_possibly_incomplete(&self) -> bool {
        self.scroll.stop_reason == StopReason::BudgetReached
    }
}

/// Collects entity links from an infinite-scroll listing.
pub struct Harvester {
    entity_links: Locator,
    filter: ReferenceFilter,
    budget: ScrollBudget,
    initial_load: std::time::Duration,
}

impl Harvester {
    pub fn from_config(
        directory: &DirectoryConfig,
        harvest: &HarvestConfig,
    ) -> Result<Self, ConfigError> {
        let filter = ReferenceFilter::from_config(directory).map_err(|e| ConfigError::Validation {
            message: format!("directory.base_url: {}", e),
        })?;

        Ok(Self {
            entity_links: directory.entity_links.clone(),
            filter,
            budget: ScrollBudget::from(harvest),
            initial_load: harvest.initial_load(),
        })
    }

    #[cfg(test)]
    pub fn new(entity_links: Locator, filter: ReferenceFilter, budget: ScrollBudget) -> Self {
        Self {
            entity_links,
            filter,
            budget,
            initial_load: std::time::Duration::ZERO,
        }
    }

    /// Opens `listing_url`, scrolls it to exhaustion and returns the filtered,
    /// deduplicated references in first-seen order.
    ///
    /// Only a failed navigation is an error; once the page is open the result
    /// may be partial but is always returned.
    pub fn harvest(
        &self,
        driver: &mut dyn UiDriver,
        listing_url: &str,
    ) -> Result<HarvestReport, DriverError> {
        let _span = info_span!("harvest", listing = %sanitize::strip_query(listing_url)).entered();

        driver.navigate(listing_url)?;
        driver.pause(self.initial_load);

        let scroll = scroll_until_exhausted(driver, &self.entity_links, &self.budget);

        let raw_links = self.extract_links(driver);
        let references = self.filter.collect(&raw_links);

        info!(
            raw = raw_links.len(),
            kept = references.len(),
            scrolls = scroll.scrolls,
            "Harvest complete"
        );

        Ok(HarvestReport {
            references,
            scroll,
            raw_link_count: raw_links.len(),
        })
    }

    fn extract_links(&self, driver: &mut dyn UiDriver) -> Vec<String> {
        let elements = match driver.find(&self.entity_links) {
            Ok(elements) => elements,
            Err(e) => {
                debug!(error = %e, "Could not list entity links");
                return Vec::new();
            }
        };

        elements
            .iter()
            .filter_map(|element| match driver.attribute(element, "href") {
                Ok(href) => href,
                Err(e) => {
                    debug!(error = %e, "Skipping link without readable href");
                    None
                }
            })
            .collect()
    }
}
