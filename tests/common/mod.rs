// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use medipay::LedgerStore;
use medipay::domain::Doctor;
use tempfile::TempDir;

/// Helper to create a test store with a temporary database
pub async fn test_store() -> Result<(LedgerStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = LedgerStore::init(db_path(&temp_dir).to_str().unwrap()).await?;
    Ok((store, temp_dir))
}

/// Open a second store over the same database, as a process restart would.
pub async fn reopen(temp_dir: &TempDir) -> Result<LedgerStore> {
    Ok(LedgerStore::init(db_path(temp_dir).to_str().unwrap()).await?)
}

pub fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.db")
}

/// Register a doctor that is known to be valid.
pub async fn doctor(store: &LedgerStore, name: &str, percentage: f64) -> Result<Doctor> {
    Ok(store
        .register_doctor(name, percentage)
        .await?
        .expect("valid doctor should be registered"))
}
