use std::env;
use std::path::PathBuf;

use serial_test::serial;

use crate::config::*;
use crate::db::sqlite::MigrationSource;

/// Run `f` with the given variables set, restoring them afterwards.
fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), env::var(name).ok()))
        .collect();
    for (name, value) in vars {
        unsafe {
            match value {
                Some(v) => env::set_var(name, v),
                None => env::remove_var(name),
            }
        }
    }
    let result = f();
    for (name, value) in saved {
        unsafe {
            match value {
                Some(v) => env::set_var(&name, v),
                None => env::remove_var(&name),
            }
        }
    }
    result
}

const CLEAR: [(&str, Option<&str>); 3] = [
    (DB_ENV, None),
    (MIGRATIONS_DIR_ENV, None),
    (USER_ENV, None),
];

#[test]
#[serial]
fn data_dir_prefers_xdg_data_home() {
    let dir = with_env(&[("XDG_DATA_HOME", Some("/tmp/xdg-data"))], get_data_dir).unwrap();
    assert_eq!(dir, PathBuf::from("/tmp/xdg-data/homeboard"));
}

#[test]
#[serial]
fn data_dir_falls_back_to_home() {
    let dir = with_env(
        &[("XDG_DATA_HOME", None), ("HOME", Some("/home/bea"))],
        get_data_dir,
    )
    .unwrap();
    assert_eq!(dir, PathBuf::from("/home/bea/.local/share/homeboard"));
}

#[test]
#[serial]
fn data_dir_without_home_is_an_error() {
    let result = with_env(&[("XDG_DATA_HOME", None), ("HOME", None)], get_data_dir);
    assert!(matches!(result, Err(ConfigError::NoDataDir)));
}

#[test]
#[serial]
fn defaults_when_environment_is_empty() {
    let mut vars = CLEAR.to_vec();
    vars.push(("XDG_DATA_HOME", Some("/tmp/xdg-defaults")));
    let config = with_env(&vars, Config::new).unwrap();

    assert_eq!(
        config.storage,
        StorageTarget::File(PathBuf::from("/tmp/xdg-defaults/homeboard/homeboard.db"))
    );
    assert_eq!(config.migrations, MigrationSource::Embedded);
    assert_eq!(config.username, "admin");
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    let config = with_env(
        &[
            (DB_ENV, Some("/tmp/env.db")),
            (MIGRATIONS_DIR_ENV, Some("/tmp/env-migrations")),
            (USER_ENV, Some("bea")),
        ],
        Config::new,
    )
    .unwrap();

    assert_eq!(config.storage, StorageTarget::File(PathBuf::from("/tmp/env.db")));
    assert_eq!(
        config.migrations,
        MigrationSource::Directory(PathBuf::from("/tmp/env-migrations"))
    );
    assert_eq!(config.username, "bea");
}

#[test]
#[serial]
fn empty_variables_count_as_unset() {
    let config = with_env(
        &[(DB_ENV, Some("/tmp/env.db")), (USER_ENV, Some(""))],
        Config::new,
    )
    .unwrap();
    assert_eq!(config.username, "admin");
}

#[test]
#[serial]
fn flags_override_environment() {
    let config = with_env(
        &[(DB_ENV, Some("/tmp/env.db")), (USER_ENV, Some("bea"))],
        Config::new,
    )
    .unwrap()
    .with_db_path(PathBuf::from("/tmp/flag.db"))
    .with_username("al");

    assert_eq!(config.storage, StorageTarget::File(PathBuf::from("/tmp/flag.db")));
    assert_eq!(config.username, "al");
    assert_eq!(config.clone().in_memory().storage, StorageTarget::Memory);
}
