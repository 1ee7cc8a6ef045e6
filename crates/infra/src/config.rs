//! Runtime configuration: where the data directory and database live.

use std::path::PathBuf;

use thiserror::Error;

pub const DATA_DIR_ENV: &str = "BOQKIT_DATA_DIR";
pub const DB_PATH_ENV: &str = "BOQKIT_DB";
pub const DB_FILE_NAME: &str = "boqkit.db";
const APP_DIR_NAME: &str = "boqkit";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve a data directory; pass --data-dir or set BOQKIT_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppConfig {
    /// Resolve from the process environment.
    ///
    /// Data directory: `data_dir_flag`, then `BOQKIT_DATA_DIR`, then the OS
    /// data directory plus `boqkit/`. Database: `BOQKIT_DB`, else
    /// `boqkit.db` inside the data directory.
    pub fn resolve(data_dir_flag: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve_with(data_dir_flag, |name| std::env::var(name).ok())
    }

    /// Same as [`AppConfig::resolve`] with an explicit environment lookup.
    pub fn resolve_with(
        data_dir_flag: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let data_dir = match data_dir_flag {
            Some(dir) => dir,
            None => match non_empty(DATA_DIR_ENV) {
                Some(dir) => PathBuf::from(dir),
                None => default_data_dir()?,
            },
        };

        let db_path = non_empty(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DB_FILE_NAME));

        Ok(Self { data_dir, db_path })
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or(ConfigError::NoDataDir)?;
    Ok(base.join(APP_DIR_NAME))
}
