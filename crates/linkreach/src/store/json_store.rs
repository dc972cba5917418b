use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::record::OutreachRecord;
use crate::error::StoreError;

/// Whole-collection persistence for outreach records.
pub trait RecordStore {
    fn location(&self) -> &Path;

    fn load(&self) -> Result<Vec<OutreachRecord>, StoreError>;

    /// Replaces the stored collection with `records`.
    fn save(&self, records: &[OutreachRecord]) -> Result<(), StoreError>;
}

/// Records kept as a pretty-printed JSON array in one file.
///
/// Saves go to a sibling temp file that is then renamed over the target, so a
/// crash mid-write leaves the previous version intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }
}

impl RecordStore for JsonFileStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<OutreachRecord>, StoreError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(self.path.clone())
            } else {
                StoreError::ReadFile {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;

        let records: Vec<OutreachRecord> =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse {
                path: self.path.clone(),
                source: e,
            })?;

        check_serial_order(&self.path, &records)?;
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn save(&self, records: &[OutreachRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|e| StoreError::Serialize {
            path: self.path.clone(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp = self.temp_path();
        let write_result = (|| {
            let mut file = std::fs::File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        })();
        if let Err(e) = write_result {
            let _ = std::fs::remove_file(&temp);
            return Err(StoreError::WriteFile {
                path: temp,
                source: e,
            });
        }

        replace_file(&temp, &self.path)?;
        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Writes a fresh store, refusing to replace an existing one unless `force`.
pub fn create_store(
    store: &JsonFileStore,
    records: &[OutreachRecord],
    force: bool,
) -> Result<(), StoreError> {
    if store.exists() && !force {
        return Err(StoreError::FileExists(store.location().to_path_buf()));
    }
    check_serial_order(store.location(), records)?;
    store.save(records)?;
    info!(
        "Created record store {} with {} records",
        store.location().display(),
        records.len()
    );
    Ok(())
}

/// Renames `src` over `dst`; falls back to copy + delete when rename is not
/// possible (cross-device moves).
fn replace_file(src: &Path, dst: &Path) -> Result<(), StoreError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let replace_err = |e| StoreError::Replace {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    };
    std::fs::copy(src, dst).map_err(replace_err)?;
    std::fs::remove_file(src).map_err(replace_err)?;
    Ok(())
}

fn check_serial_order(path: &Path, records: &[OutreachRecord]) -> Result<(), StoreError> {
    for pair in records.windows(2) {
        if pair[1].serial_number <= pair[0].serial_number {
            return Err(StoreError::Inconsistent {
                path: path.to_path_buf(),
                reason: format!(
                    "serial number {} follows {}",
                    pair[1].serial_number, pair[0].serial_number
                ),
            });
        }
    }
    Ok(())
}
