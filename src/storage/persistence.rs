//! Ledger persistence
//!
//! The committed ledger is stored as a JSON [`LedgerSnapshot`]. A save
//! writes a temp file and renames it over `ledger_file`; the file it
//! replaces becomes `<ledger_file>.backup.0` and older copies shift up,
//! keeping at most `max_backups`.

use crate::token::{Ledger, LedgerSnapshot, SnapshotError};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Corrupt ledger state: {0}")]
    Corrupt(#[from] SnapshotError),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".erc20_data"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Ledger file plus its rotating backups
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    fn keeps_backups(&self) -> bool {
        self.config.backup_enabled && self.config.max_backups > 0
    }

    /// Write the ledger, keeping the previous file as backup 0
    pub fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let path = self.ledger_path();

        if self.keeps_backups() && path.exists() {
            self.shift_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        let temp_path = path.with_extension("tmp");
        write_snapshot(ledger, &temp_path)?;
        fs::rename(&temp_path, &path)?;

        log::info!("Ledger {} saved to {:?}", ledger.address, path);
        Ok(())
    }

    /// Read and validate the stored ledger
    pub fn load(&self) -> Result<Ledger, StorageError> {
        let path = self.ledger_path();
        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "no ledger file at {:?}",
                path
            )));
        }
        read_snapshot(&path)
    }

    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    // Frees slot 0; whatever sits in the last slot is dropped
    fn shift_backups(&self) -> Result<(), StorageError> {
        let last = self.config.max_backups - 1;

        let oldest = self.backup_path(last);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for index in (0..last).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }

        Ok(())
    }

    /// Read and validate backup `index` (0 is the most recent)
    pub fn restore_backup(&self, index: usize) -> Result<Ledger, StorageError> {
        let path = self.backup_path(index);
        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "backup {} not found",
                index
            )));
        }
        read_snapshot(&path)
    }

    /// Indices of the backups present on disk
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|index| self.backup_path(*index).exists())
            .collect()
    }
}

fn write_snapshot(ledger: &Ledger, path: &Path) -> Result<(), StorageError> {
    let writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(writer, &LedgerSnapshot::from(ledger))?;
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Ledger, StorageError> {
    let reader = BufReader::new(fs::File::open(path)?);
    let snapshot: LedgerSnapshot = serde_json::from_reader(reader)?;
    Ok(Ledger::try_from(snapshot)?)
}

/// Export a ledger to an arbitrary path
pub fn save_to_file(ledger: &Ledger, path: &Path) -> Result<(), StorageError> {
    write_snapshot(ledger, path)
}

/// Import a ledger from an arbitrary path, validating it
pub fn load_from_file(path: &Path) -> Result<Ledger, StorageError> {
    read_snapshot(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Allocation, TokenMetadata};
    use alloy_primitives::{Address, U256};

    const A: Address = Address::repeat_byte(0xaa);
    const B: Address = Address::repeat_byte(0xbb);

    fn ledger() -> Ledger {
        let metadata = TokenMetadata::new("Stored".into(), "STO".into(), 18, A).unwrap();
        Ledger::new(
            Address::repeat_byte(0x01),
            metadata,
            &[Allocation::new(A, U256::from(1000u64))],
        )
        .unwrap()
    }

    #[test]
    fn test_save_load_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let mut ledger = ledger();
        ledger.transfer(A, B, U256::from(300u64)).unwrap();
        ledger.approve(B, A, U256::from(20u64));

        storage.save(&ledger).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.address, ledger.address);
        assert_eq!(loaded.metadata, ledger.metadata);
        assert_eq!(loaded.balance_of(A), U256::from(700u64));
        assert_eq!(loaded.balance_of(B), U256::from(300u64));
        assert_eq!(loaded.allowance(B, A), U256::from(20u64));
        assert!(loaded.check_invariants());
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let storage = Storage::new(config).unwrap();

        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_load_rejects_tampered_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");
        save_to_file(&ledger(), &path).unwrap();

        let mut snapshot: LedgerSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        snapshot.total_supply = U256::from(2000u64);
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        assert!(matches!(
            load_from_file(&path),
            Err(StorageError::Corrupt(SnapshotError::SupplyMismatch { .. }))
        ));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups: 3,
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let mut ledger = ledger();

        for _ in 0..5 {
            storage.save(&ledger).unwrap();
            ledger.transfer(A, B, U256::from(1u64)).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);

        // Backup 0 is the state before the last save
        let previous = storage.restore_backup(0).unwrap();
        assert_eq!(previous.balance_of(B), U256::from(3u64));
        assert!(storage.restore_backup(7).is_err());
    }

    #[test]
    fn test_zero_max_backups_writes_no_backup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups: 0,
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let ledger = ledger();
        storage.save(&ledger).unwrap();
        storage.save(&ledger).unwrap();

        assert!(storage.list_backups().is_empty());
        assert!(!temp_dir.path().join("ledger.json.backup.0").exists());
        assert!(storage.load().is_ok());
    }
}
