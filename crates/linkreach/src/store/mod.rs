pub mod json_store;
pub mod naming;
pub mod numbering;
pub mod record;

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use log::debug;
use serde::Serialize;

use crate::classify::Outcome;
use crate::error::StoreError;

pub use json_store::{create_store, JsonFileStore, RecordStore};
pub use naming::{
    list_store_files, listing_url, parse_store_filename, periods_for_year, store_filename,
    store_filename_from_listing_url, BatchPeriod,
};
pub use numbering::{canonical_parent_id, number_entries};
pub use record::{ConnectionStatus, FounderEntry, OutreachRecord};

/// In-memory record collection, ordered by serial number.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<OutreachRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub companies: usize,
    pub processed: usize,
    pub unset_status: usize,
    /// Unprocessed records that have a profile to visit.
    pub actionable_remaining: usize,
    pub by_outcome: BTreeMap<Outcome, usize>,
}

impl RecordSet {
    /// Records must already be in ascending serial order.
    pub fn new(records: Vec<OutreachRecord>) -> Self {
        Self { records }
    }

    pub fn load(store: &dyn RecordStore) -> Result<Self, StoreError> {
        Ok(Self::new(store.load()?))
    }

    pub fn save(&self, store: &dyn RecordStore) -> Result<(), StoreError> {
        store.save(&self.records)
    }

    pub fn records(&self) -> &[OutreachRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, serial_number: u32) -> Option<&OutreachRecord> {
        self.position(serial_number).map(|index| &self.records[index])
    }

    /// Index of the first unprocessed record.
    pub fn cursor(&self) -> Option<usize> {
        self.records.iter().position(|r| !r.processed_data)
    }

    /// Unprocessed records from the cursor on, in store order.
    pub fn pending_from_cursor(&self) -> impl Iterator<Item = &OutreachRecord> {
        let start = self.cursor().unwrap_or(self.records.len());
        self.records[start..].iter().filter(|r| !r.processed_data)
    }

    pub fn actionable_remaining(&self) -> usize {
        self.pending_from_cursor().filter(|r| r.is_actionable()).count()
    }

    /// Marks a record processed, recording `outcome` when one was produced.
    ///
    /// A record that is already processed is left untouched.
    pub fn mark_processed(
        &mut self,
        serial_number: u32,
        outcome: Option<Outcome>,
    ) -> Result<&OutreachRecord, StoreError> {
        let index = self
            .position(serial_number)
            .ok_or(StoreError::UnknownSerial(serial_number))?;
        let record = &mut self.records[index];

        if record.processed_data {
            debug!("Record {} already processed; keeping its status", serial_number);
            return Ok(&*record);
        }

        record.processed_data = true;
        if let Some(outcome) = outcome {
            record.connection_status = ConnectionStatus::from(outcome);
        }
        record.processed_at = Some(Utc::now());
        Ok(&*record)
    }

    pub fn stats(&self) -> StoreStats {
        let mut by_outcome = BTreeMap::new();
        for outcome in self.records.iter().filter_map(OutreachRecord::outcome) {
            *by_outcome.entry(outcome).or_insert(0) += 1;
        }

        StoreStats {
            total: self.records.len(),
            companies: self
                .records
                .iter()
                .map(|r| r.company_number)
                .collect::<HashSet<_>>()
                .len(),
            processed: self.records.iter().filter(|r| r.processed_data).count(),
            unset_status: self
                .records
                .iter()
                .filter(|r| r.connection_status == ConnectionStatus::Unset)
                .count(),
            actionable_remaining: self.actionable_remaining(),
            by_outcome,
        }
    }

    fn position(&self, serial_number: u32) -> Option<usize> {
        self.records
            .binary_search_by_key(&serial_number, |r| r.serial_number)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(processed: &[bool], targets: &[bool]) -> RecordSet {
        let entries = processed
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(i, (_, has_target))| FounderEntry {
                founder_name: format!("f{}", i + 1),
                linkedin_url: has_target
                    .then(|| format!("https://www.linkedin.com/in/f{}", i + 1)),
                company_yc_url: format!("https://www.ycombinator.com/companies/c{}", i),
                ..FounderEntry::default()
            })
            .collect();

        let mut records = number_entries(entries);
        for (record, done) in records.iter_mut().zip(processed) {
            record.processed_data = *done;
        }
        RecordSet::new(records)
    }

    #[test]
    fn test_cursor_is_first_unprocessed() {
        let set = set_with(&[true, true, false, true, false], &[true; 5]);
        assert_eq!(set.cursor(), Some(2));

        let serials: Vec<u32> = set.pending_from_cursor().map(|r| r.serial_number).collect();
        assert_eq!(serials, vec![3, 5]);
    }

    #[test]
    fn test_cursor_none_when_all_processed() {
        let set = set_with(&[true, true], &[true, true]);
        assert_eq!(set.cursor(), None);
        assert_eq!(set.pending_from_cursor().count(), 0);
    }

    #[test]
    fn test_actionable_remaining_ignores_targetless() {
        let set = set_with(&[false, false, false], &[true, false, true]);
        assert_eq!(set.actionable_remaining(), 2);
    }

    #[test]
    fn test_mark_processed_sets_status_and_timestamp() {
        let mut set = set_with(&[false, false], &[true, true]);
        let record = set.mark_processed(2, Some(Outcome::Pending)).unwrap();
        assert!(record.processed_data);
        assert_eq!(record.connection_status, ConnectionStatus::Pending);
        assert!(record.processed_at.is_some());
        assert_eq!(set.cursor(), Some(0));
    }

    #[test]
    fn test_mark_processed_without_outcome_keeps_unset() {
        let mut set = set_with(&[false], &[false]);
        let record = set.mark_processed(1, None).unwrap();
        assert!(record.processed_data);
        assert_eq!(record.connection_status, ConnectionStatus::Unset);
    }

    #[test]
    fn test_processed_is_never_reset() {
        let mut set = set_with(&[false], &[true]);
        set.mark_processed(1, Some(Outcome::ConnectionSent)).unwrap();
        let record = set.mark_processed(1, Some(Outcome::ActionFailed)).unwrap();
        assert!(record.processed_data);
        assert_eq!(record.connection_status, ConnectionStatus::ConnectionSent);
    }

    #[test]
    fn test_mark_unknown_serial() {
        let mut set = set_with(&[false], &[true]);
        assert!(matches!(
            set.mark_processed(42, None),
            Err(StoreError::UnknownSerial(42))
        ));
    }

    #[test]
    fn test_stats() {
        let mut set = set_with(&[false, false, false, false], &[true, true, false, true]);
        set.mark_processed(1, Some(Outcome::ConnectionSent)).unwrap();
        set.mark_processed(2, Some(Outcome::NotAvailable)).unwrap();

        let stats = set.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.companies, 4);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.unset_status, 2);
        assert_eq!(stats.actionable_remaining, 1);
        assert_eq!(stats.by_outcome.get(&Outcome::ConnectionSent), Some(&1));
        assert_eq!(stats.by_outcome.get(&Outcome::NotAvailable), Some(&1));
    }
}
