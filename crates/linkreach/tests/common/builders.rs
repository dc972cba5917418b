//! Builder patterns for creating test data programmatically.
//!
//! These builders allow creating record stores and configurations without
//! repetitive boilerplate code.

#![allow(dead_code)]

use linkreach::config::Config;
use linkreach::store::{number_entries, ConnectionStatus, FounderEntry, OutreachRecord};

/// Profile URL used for the founder at `index` (0-based).
pub fn profile_url(index: usize) -> String {
    format!("https://www.linkedin.com/in/founder-{}", index)
}

/// Builder for a list of store records.
pub struct RecordsBuilder {
    entries: Vec<FounderEntry>,
    processed: Vec<(usize, ConnectionStatus)>,
}

impl RecordsBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            processed: Vec::new(),
        }
    }

    /// `count` founders, each with a profile link, two per company.
    pub fn founders(mut self, count: usize) -> Self {
        for _ in 0..count {
            let index = self.entries.len();
            self.entries.push(entry(index, Some(profile_url(index))));
        }
        self
    }

    /// One founder without a usable profile link.
    pub fn founder_without_profile(mut self) -> Self {
        let index = self.entries.len();
        self.entries.push(entry(index, None));
        self
    }

    /// Marks the first `count` records processed with `status`.
    pub fn processed_prefix(mut self, count: usize, status: ConnectionStatus) -> Self {
        for index in 0..count {
            self.processed.push((index, status));
        }
        self
    }

    /// Marks the record at `index` (0-based) processed with `status`.
    pub fn processed_at(mut self, index: usize, status: ConnectionStatus) -> Self {
        self.processed.push((index, status));
        self
    }

    pub fn build(self) -> Vec<OutreachRecord> {
        let mut records = number_entries(self.entries);
        for (index, status) in self.processed {
            records[index].processed_data = true;
            records[index].connection_status = status;
        }
        records
    }
}

fn entry(index: usize, linkedin_url: Option<String>) -> FounderEntry {
    FounderEntry {
        company_name: format!("Company {}", index / 2),
        founder_name: format!("Founder {}", index),
        linkedin_url,
        company_linkedin: None,
        company_yc_url: format!("https://www.ycombinator.com/companies/company-{}", index / 2),
        ..FounderEntry::default()
    }
}

/// Builder for creating `Config` instances with every wait shortened.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.batch.pacing_min_ms = 0;
        config.batch.pacing_max_ms = 0;
        config.batch.page_settle_ms = 0;
        config.harvest.pause_ms = 10;
        config.harvest.settle_pause_ms = 10;
        config.harvest.recovery_pause_ms = 10;
        config.harvest.initial_load_ms = 0;
        Self { config }
    }

    pub fn data_directory(mut self, path: &str) -> Self {
        self.config.data_directory = path.to_string();
        self
    }

    pub fn pacing_ms(mut self, min: u64, max: u64) -> Self {
        self.config.batch.pacing_min_ms = min;
        self.config.batch.pacing_max_ms = max;
        self
    }

    pub fn default_count(mut self, count: usize) -> Self {
        self.config.batch.default_count = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
