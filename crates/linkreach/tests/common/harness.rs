//! Test harness for isolated test execution.
//!
//! The `TestHarness` struct owns a temporary data directory with one record
//! store in it, plus helpers to run batches against that store with a
//! scripted browser.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use tempfile::TempDir;

use linkreach::batch::{
    BatchProcessor, BatchSummary, CancelFlag, NoopProgress, ProgressEvent, ProgressReporter,
};
use linkreach::config::Config;
use linkreach::error::StoreError;
use linkreach::store::{create_store, JsonFileStore, OutreachRecord, RecordSet};
use linkreach::testing::ScriptedDriver;

use super::builders::ConfigBuilder;

pub const STORE_FILE: &str = "YC_W25_scraped.json";

/// Test harness providing an isolated record store for integration tests.
pub struct TestHarness {
    temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub config: Config,
}

impl TestHarness {
    /// Create a harness whose store holds `records`.
    pub fn with_records(records: Vec<OutreachRecord>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("Scraper_Data");
        let config = ConfigBuilder::new()
            .data_directory(&data_dir.to_string_lossy())
            .build();

        let harness = Self {
            temp_dir,
            data_dir,
            config,
        };
        create_store(&harness.store(), &records, false).expect("Failed to create store");
        harness
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.store_path())
    }

    /// Reads the store back from disk.
    pub fn load(&self) -> RecordSet {
        RecordSet::load(&self.store()).expect("Failed to load store")
    }

    pub fn processed_serials(&self) -> Vec<u32> {
        self.load()
            .records()
            .iter()
            .filter(|r| r.processed_data)
            .map(|r| r.serial_number)
            .collect()
    }

    /// Runs one batch from the store on disk, as a fresh process would.
    pub fn run_batch(
        &self,
        driver: &mut ScriptedDriver,
        requested: usize,
    ) -> Result<BatchSummary, StoreError> {
        self.run_batch_with(driver, requested, CancelFlag::new(), &NoopProgress)
    }

    pub fn run_batch_with(
        &self,
        driver: &mut ScriptedDriver,
        requested: usize,
        cancel: CancelFlag,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchSummary, StoreError> {
        let store = self.store();
        let mut records = RecordSet::load(&store)?;
        let processor = BatchProcessor::from_config(&self.config, cancel);
        processor.run(driver, &mut records, &store, requested, progress)
    }
}

/// Reporter that requests cancellation once `after` records are committed,
/// and keeps every event it sees.
pub struct CancelAfter {
    flag: CancelFlag,
    after: usize,
    committed: Cell<usize>,
    pub events: RefCell<Vec<ProgressEvent>>,
}

impl CancelAfter {
    pub fn new(flag: CancelFlag, after: usize) -> Self {
        Self {
            flag,
            after,
            committed: Cell::new(0),
            events: RefCell::new(Vec::new()),
        }
    }
}

impl ProgressReporter for CancelAfter {
    fn report(&self, event: ProgressEvent) {
        if matches!(event, ProgressEvent::RecordCommitted { .. }) {
            self.committed.set(self.committed.get() + 1);
            if self.committed.get() == self.after {
                self.flag.cancel();
            }
        }
        self.events.borrow_mut().push(event);
    }
}
