//! Where the analysis database lives on disk.

use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Overrides the base directory when set.
pub const DATA_DIR_ENV: &str = "FDE_DATA_DIR";

pub const DB_FILE_NAME: &str = "analyses.db";

/// `$FDE_DATA_DIR`, else `~/.field-distortion`.
pub fn default_base_dir() -> PathBuf {
    env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| dirs_home().join(".field-distortion"))
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Open `analyses.db` under `base_dir` (or the default), creating the directory.
pub fn open_default(base_dir: Option<&Path>) -> Result<Store> {
    let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
    fs::create_dir_all(&base).map_err(|e| {
        StoreError::InvalidData(format!("failed to create {}: {e}", base.display()))
    })?;
    let path = base.join(DB_FILE_NAME);
    tracing::debug!(path = %path.display(), "opening analysis store");
    Store::open(&path)
}
