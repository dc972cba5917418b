//! Operations behind the CLI subcommands.
//!
//! Each function takes an already-loaded [`Config`]; the browser session, if
//! one is needed, is opened by the caller and passed in.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{ensure_signed_in, LoginState};
use crate::batch::{BatchProcessor, BatchSummary, CancelFlag, ProgressReporter};
use crate::config::Config;
use crate::driver::UiDriver;
use crate::error::{LinkreachError, Result, StoreError};
use crate::harvest::{EntityReference, Harvester};
use crate::invitations::{Invitation, InvitationDecision, InvitationManager, InvitationReport};
use crate::secrets::Credentials;
use crate::store::naming::{is_valid_batch, references_filename};
use crate::store::{
    create_store, list_store_files, listing_url, number_entries, parse_store_filename,
    store_filename, store_filename_from_listing_url, BatchPeriod, FounderEntry, JsonFileStore,
    RecordSet, RecordStore, StoreStats,
};

/// One directory cohort, e.g. Winter 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSelector {
    pub period: BatchPeriod,
    pub year: u16,
}

impl BatchSelector {
    /// Rejects periods that did not run in `year`.
    pub fn new(period: BatchPeriod, year: u16) -> Result<Self> {
        if !is_valid_batch(period, year) {
            return Err(LinkreachError::InvalidRequest(format!(
                "there was no {} {} batch",
                period, year
            )));
        }
        Ok(Self { period, year })
    }

    pub fn store_path(&self, config: &Config) -> PathBuf {
        config
            .data_dir()
            .join(store_filename(self.period.name(), self.year))
    }

    pub fn references_path(&self, config: &Config) -> PathBuf {
        config
            .data_dir()
            .join(references_filename(self.period.name(), self.year))
    }

    pub fn listing_url(&self, config: &Config) -> Result<String> {
        listing_url(
            &config.directory.base_url,
            &config.directory.listing_path,
            self.period,
            self.year,
        )
        .map_err(|e| LinkreachError::InvalidRequest(format!("cannot build listing URL: {}", e)))
    }
}

impl std::fmt::Display for BatchSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.period, self.year)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestOutput {
    pub path: PathBuf,
    /// Record store name matching the harvested listing.
    pub store_file: String,
    pub count: usize,
    pub possibly_incomplete: bool,
}

/// Harvests the batch listing and writes the company links next to the store.
pub fn harvest(
    driver: &mut dyn UiDriver,
    config: &Config,
    batch: BatchSelector,
    force: bool,
) -> Result<HarvestOutput> {
    let path = batch.references_path(config);
    if path.exists() && !force {
        return Err(StoreError::FileExists(path).into());
    }

    let harvester = Harvester::from_config(&config.directory, &config.harvest)?;
    let listing = batch.listing_url(config)?;
    let report = harvester.harvest(driver, &listing)?;
    if report.is_possibly_incomplete() {
        warn!("Scroll budget ran out; the company list may be incomplete");
    }

    write_references(&path, &report.references)?;
    info!(count = report.references.len(), batch = %batch, "Company links saved");

    Ok(HarvestOutput {
        path,
        store_file: store_filename_from_listing_url(&listing),
        count: report.references.len(),
        possibly_incomplete: report.is_possibly_incomplete(),
    })
}

/// Builds the record store for `batch` from a founder extraction file.
pub fn import(
    config: &Config,
    batch: BatchSelector,
    input: &Path,
    force: bool,
) -> Result<StoreStats> {
    let content = fs::read_to_string(input).map_err(|source| StoreError::ReadFile {
        path: input.to_path_buf(),
        source,
    })?;
    let entries: Vec<FounderEntry> =
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: input.to_path_buf(),
            source,
        })?;

    ensure_data_dir(config)?;
    let records = number_entries(entries);
    let store = JsonFileStore::new(batch.store_path(config));
    create_store(&store, &records, force)?;

    Ok(RecordSet::new(records).stats())
}

/// Loads the store for `batch`. Done before any browser work so a missing
/// or damaged store fails fast.
pub fn open_store(config: &Config, batch: BatchSelector) -> Result<(JsonFileStore, RecordSet)> {
    let store = JsonFileStore::new(batch.store_path(config));
    match RecordSet::load(&store) {
        Ok(records) => Ok((store, records)),
        Err(StoreError::NotFound(path)) => {
            let available = list_store_files(&config.data_dir()).unwrap_or_default();
            if available.is_empty() {
                warn!("No store files in {}", config.data_dir().display());
            } else {
                warn!("Available store files: {}", available.join(", "));
            }
            Err(StoreError::NotFound(path).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Signs in and processes the next `count` records of an opened store.
#[allow(clippy::too_many_arguments)]
pub fn connect<F>(
    driver: &mut dyn UiDriver,
    config: &Config,
    store: &dyn RecordStore,
    records: &mut RecordSet,
    count: usize,
    cancel: CancelFlag,
    progress: &dyn ProgressReporter,
    credentials: F,
) -> Result<BatchSummary>
where
    F: FnOnce() -> std::result::Result<Credentials, crate::error::AuthError>,
{
    if count == 0 {
        return Err(LinkreachError::InvalidRequest(
            "batch size must be at least 1".to_string(),
        ));
    }

    sign_in(driver, config, credentials)?;

    let processor = BatchProcessor::from_config(config, cancel);
    Ok(processor.run(driver, records, store, count, progress)?)
}

/// Signs in and reads every pending received invitation.
pub fn list_invitations<F>(
    driver: &mut dyn UiDriver,
    config: &Config,
    credentials: F,
) -> Result<Vec<Invitation>>
where
    F: FnOnce() -> std::result::Result<Credentials, crate::error::AuthError>,
{
    sign_in(driver, config, credentials)?;
    let manager = InvitationManager::from_config(&config.invitations);
    Ok(manager.load(driver)?)
}

/// Signs in, loads pending invitations and answers each one as `decide`
/// says. See [`InvitationManager::review`].
pub fn answer_invitations<F, D>(
    driver: &mut dyn UiDriver,
    config: &Config,
    cancel: &CancelFlag,
    credentials: F,
    decide: D,
) -> Result<InvitationReport>
where
    F: FnOnce() -> std::result::Result<Credentials, crate::error::AuthError>,
    D: FnMut(&Invitation, usize, usize) -> Option<InvitationDecision>,
{
    sign_in(driver, config, credentials)?;
    let manager = InvitationManager::from_config(&config.invitations);
    let invitations = manager.load(driver)?;
    Ok(manager.review(driver, &invitations, cancel, decide))
}

fn sign_in<F>(driver: &mut dyn UiDriver, config: &Config, credentials: F) -> Result<()>
where
    F: FnOnce() -> std::result::Result<Credentials, crate::error::AuthError>,
{
    match ensure_signed_in(driver, &config.login, credentials)? {
        LoginState::AlreadySignedIn => info!("Reusing signed-in session"),
        LoginState::SignedIn => info!("Signed in with configured credentials"),
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub file: String,
    /// Serial number of the next record a batch would start from.
    pub next_serial: Option<u32>,
    #[serde(flatten)]
    pub stats: StoreStats,
}

pub fn status(config: &Config, batch: BatchSelector) -> Result<StatusReport> {
    let (store, records) = open_store(config, batch)?;
    let next_serial = records
        .cursor()
        .map(|index| records.records()[index].serial_number);

    Ok(StatusReport {
        file: store
            .location()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        next_serial,
        stats: records.stats(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreFile {
    pub name: String,
    /// `None` for names that do not follow the period/year pattern.
    pub batch: Option<String>,
}

pub fn files(config: &Config) -> Result<Vec<StoreFile>> {
    let dir = config.data_dir();
    let names = list_store_files(&dir).map_err(|source| StoreError::ReadFile {
        path: dir.clone(),
        source,
    })?;

    Ok(names
        .into_iter()
        .map(|name| StoreFile {
            batch: parse_store_filename(&name).map(|(period, year)| format!("{} {}", period, year)),
            name,
        })
        .collect())
}

fn ensure_data_dir(config: &Config) -> std::result::Result<(), StoreError> {
    let dir = config.data_dir();
    fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDirectory { path: dir, source })
}

fn write_references(
    path: &Path,
    references: &[EntityReference],
) -> std::result::Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(references).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| StoreError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
