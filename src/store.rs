/*
 *  Heistbot - Discord bot keeping a heist credit ledger for Discord servers.
 *  Copyright (C) 2025  Manuel de Castro <manuel@infor.uva.es>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use crate::account::Ledger;
use crate::error::{LedgerError, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/**
 * Durable backing store of the ledger.
 */
pub trait LedgerStore {
    /**
     * Reads the persisted ledger. A store that was never written yields an empty ledger.
     */
    fn load(&self) -> Result<Ledger>;

    /**
     * Overwrites the persisted ledger with `ledger`, atomically with respect to crashes.
     */
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/**
 * Ledger store backed by a single pretty-printed JSON file (`credits.json` by default).
 */
#[cfg_attr(debug_assertions, derive(Debug))]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileStore {
        Self { path: path.into() }
    }

    fn persistence_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Persistence {
            path: self.path.clone(),
            source,
        }
    }

    /**
     * Writes the payload to a fresh temporary file next to the ledger file and flushes it to disk.
     */
    fn write_temp(&self, temp_path: &Path, payload: &[u8]) -> io::Result<()> {
        let mut file = File::create(temp_path)?;
        file.write_all(payload)?;
        file.sync_all()
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Ledger> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no ledger file yet, starting empty");
                return Ok(Ledger::new());
            }
            Err(err) => return Err(self.persistence_error(err)),
        };

        serde_json::from_str(&json).map_err(|source| LedgerError::CorruptStore {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.persistence_error(err))?;
        }

        let payload = serde_json::to_vec_pretty(ledger)
            .map_err(|err| self.persistence_error(io::Error::from(err)))?;

        // The temporary file lives in the same directory so the rename stays on one filesystem.
        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(err) = self.write_temp(&temp_path, &payload) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persistence_error(err));
        }
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persistence_error(err));
        }

        tracing::debug!(path = %self.path.display(), accounts = ledger.len(), "ledger saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.account_mut("42").deposit(17);
        ledger
            .account_mut("7")
            .set_last_daily_claim_at(Some(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()));
        ledger
            .account_mut("42")
            .set_last_daily_accrual_at(Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()));
        ledger
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("credits.json"));

        let ledger = store.load().unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("credits.json"));
        let ledger = sample_ledger();

        store.save(&ledger).unwrap();
        assert_eq!(store.load().unwrap(), ledger);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("credits.json"));

        store.save(&sample_ledger()).unwrap();
        store.save(&Ledger::new()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["credits.json".to_string()]);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("credits.json"));

        store.save(&sample_ledger()).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_file_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credits.json");
        fs::write(&path, "{\"42\": {\"balance\": 1").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(LedgerError::CorruptStore { .. })
        ));
    }

    #[test]
    fn test_unwritable_target_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the final rename fail.
        let path = dir.path().join("credits.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.save(&sample_ledger()),
            Err(LedgerError::Persistence { .. })
        ));
    }
}
