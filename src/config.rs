//! Runtime configuration.
//!
//! Precedence is command-line flag, then environment, then default. The
//! default database lives in the XDG data directory:
//! `$XDG_DATA_HOME/homeboard/homeboard.db`, falling back to
//! `~/.local/share/homeboard/homeboard.db`.

use std::env;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::db::seed::ADMIN_USERNAME;
use crate::db::sqlite::MigrationSource;

pub const DB_ENV: &str = "HOMEBOARD_DB";
pub const MIGRATIONS_DIR_ENV: &str = "HOMEBOARD_MIGRATIONS_DIR";
pub const USER_ENV: &str = "HOMEBOARD_USER";
pub const LOG_ENV: &str = "HOMEBOARD_LOG";

const APP_DIR: &str = "homeboard";
const DB_FILE: &str = "homeboard.db";

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Cannot locate a data directory")]
    #[diagnostic(
        code(homeboard::config::no_data_dir),
        help("Set HOME or XDG_DATA_HOME, or pass --db <path>.")
    )]
    NoDataDir,
}

/// A set, non-empty environment variable.
fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// XDG data directory for homeboard.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let data_home = match env_value("XDG_DATA_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env_value("HOME").ok_or(ConfigError::NoDataDir)?)
            .join(".local/share"),
    };
    Ok(data_home.join(APP_DIR))
}

/// Default database file inside the data directory.
pub fn get_db_path() -> Result<PathBuf, ConfigError> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// A SQLite database file.
    File(PathBuf),
    /// The volatile in-process store.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageTarget,
    pub migrations: MigrationSource,
    /// The acting user for commands that record who did something.
    pub username: String,
}

impl Config {
    /// Configuration from the environment, with defaults for anything unset.
    pub fn new() -> Result<Self, ConfigError> {
        let storage = match env_value(DB_ENV) {
            Some(path) => StorageTarget::File(PathBuf::from(path)),
            None => StorageTarget::File(get_db_path()?),
        };
        let migrations = env_value(MIGRATIONS_DIR_ENV)
            .map(|dir| MigrationSource::Directory(PathBuf::from(dir)))
            .unwrap_or_default();
        let username = env_value(USER_ENV).unwrap_or_else(|| ADMIN_USERNAME.to_string());

        Ok(Self {
            storage,
            migrations,
            username,
        })
    }

    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        self.storage = StorageTarget::File(path);
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.storage = StorageTarget::Memory;
        self
    }

    pub fn with_migrations_dir(mut self, dir: PathBuf) -> Self {
        self.migrations = MigrationSource::Directory(dir);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}
