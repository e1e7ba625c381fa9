//! Versioned schema migrations.
//!
//! Units are applied in ascending version order, each inside its own
//! transaction together with its `_migrations` bookkeeping row. There are no
//! down-migrations.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

use crate::db::utils::current_timestamp;
use crate::db::{DbError, DbResult};

const EMBEDDED: &[(i64, &str, &str)] = &[
    (
        1,
        "initial_schema",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/migrations/001_initial_schema.sql"
        )),
    ),
    (
        2,
        "gamification",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/migrations/002_gamification.sql"
        )),
    ),
    (
        3,
        "issue_sprints",
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/migrations/003_issue_sprints.sql"
        )),
    ),
];

/// Where migration units come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MigrationSource {
    /// The SQL files compiled into the binary.
    #[default]
    Embedded,
    /// `NNN_name.sql` files in a directory, read at migration time.
    Directory(PathBuf),
}

/// One versioned schema change.
#[derive(Debug, Clone)]
pub struct MigrationUnit {
    pub version: i64,
    pub name: String,
    pub sql: Cow<'static, str>,
}

/// Split `003_issue_sprints.sql` into `(3, "issue_sprints")`.
fn parse_file_name(file_name: &str) -> Option<(i64, String)> {
    let stem = file_name.strip_suffix(".sql")?;
    let (version, name) = stem.split_once('_')?;
    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit()) || name.is_empty() {
        return None;
    }
    Some((version.parse().ok()?, name.to_string()))
}

async fn read_directory(dir: &Path) -> DbResult<Option<Vec<MigrationUnit>>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(DbError::StorageUnavailable {
                message: format!("cannot read migrations from {}: {}", dir.display(), e),
            });
        }
    };

    let mut units = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(DbError::database)? {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((version, name)) = parse_file_name(file_name) else {
            warn!(file = %path.display(), "Skipping file that is not a migration");
            continue;
        };
        let sql = tokio::fs::read_to_string(&path).await.map_err(|e| DbError::Migration {
            version,
            name: name.clone(),
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        units.push(MigrationUnit {
            version,
            name,
            sql: Cow::Owned(sql),
        });
    }
    Ok(Some(units))
}

impl MigrationSource {
    /// Load every unit, or `None` when a directory source does not exist.
    pub async fn load(&self) -> DbResult<Option<Vec<MigrationUnit>>> {
        match self {
            MigrationSource::Embedded => Ok(Some(
                EMBEDDED
                    .iter()
                    .map(|(version, name, sql)| MigrationUnit {
                        version: *version,
                        name: (*name).to_string(),
                        sql: Cow::Borrowed(*sql),
                    })
                    .collect(),
            )),
            MigrationSource::Directory(dir) => read_directory(dir).await,
        }
    }
}

impl std::fmt::Display for MigrationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationSource::Embedded => write!(f, "embedded"),
            MigrationSource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// How a migration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// At least one unit was applied.
    Applied,
    /// Every available unit was already recorded.
    UpToDate,
    /// The migration directory does not exist; nothing was attempted.
    SourceMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
}

/// Result of [`Migrator::migrate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub previous_version: i64,
    pub current_version: i64,
    pub applied: Vec<AppliedMigration>,
    pub outcome: MigrationOutcome,
}

/// Applies migration units to a SQLite pool.
pub struct Migrator<'a> {
    pool: &'a SqlitePool,
    source: &'a MigrationSource,
}

impl<'a> Migrator<'a> {
    pub fn new(pool: &'a SqlitePool, source: &'a MigrationSource) -> Self {
        Self { pool, source }
    }

    async fn ensure_bookkeeping(&self) -> DbResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(self.pool)
        .await
        .map_err(DbError::database)?;
        Ok(())
    }

    /// Highest applied version, or 0 for a fresh database.
    pub async fn current_version(&self) -> DbResult<i64> {
        self.ensure_bookkeeping().await?;
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(self.pool)
            .await
            .map_err(DbError::database)
    }

    /// Apply every unit newer than the current version.
    #[instrument(skip(self), fields(source = %self.source))]
    pub async fn migrate(&self) -> DbResult<MigrationReport> {
        let previous_version = self.current_version().await?;

        let Some(mut units) = self.source.load().await? else {
            warn!(source = %self.source, "Migration source is missing, nothing applied");
            return Ok(MigrationReport {
                previous_version,
                current_version: previous_version,
                applied: Vec::new(),
                outcome: MigrationOutcome::SourceMissing,
            });
        };

        units.sort_by_key(|unit| unit.version);
        if let Some(pair) = units.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(DbError::Migration {
                version: pair[1].version,
                name: pair[1].name.clone(),
                message: format!("version also used by '{}'", pair[0].name),
            });
        }

        let mut applied = Vec::new();
        for unit in units.into_iter().filter(|u| u.version > previous_version) {
            self.apply(&unit).await?;
            applied.push(AppliedMigration {
                version: unit.version,
                name: unit.name,
            });
        }

        let current_version = applied
            .last()
            .map(|m| m.version)
            .unwrap_or(previous_version);
        let outcome = if applied.is_empty() {
            debug!(version = current_version, "Schema up to date");
            MigrationOutcome::UpToDate
        } else {
            info!(
                from = previous_version,
                to = current_version,
                count = applied.len(),
                "Applied migrations"
            );
            MigrationOutcome::Applied
        };

        Ok(MigrationReport {
            previous_version,
            current_version,
            applied,
            outcome,
        })
    }

    async fn apply(&self, unit: &MigrationUnit) -> DbResult<()> {
        let failed = |e: sqlx::Error| DbError::Migration {
            version: unit.version,
            name: unit.name.clone(),
            message: e.to_string(),
        };

        debug!(version = unit.version, name = %unit.name, "Applying migration");
        let mut tx = self.pool.begin().await.map_err(failed)?;
        sqlx::raw_sql(&unit.sql)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
            .bind(unit.version)
            .bind(&unit.name)
            .bind(current_timestamp())
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)
    }
}
