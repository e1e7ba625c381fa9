//! SQLite-backed entity store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteExecutor, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Row, Sqlite, SqlitePool};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::migrator::{MigrationOutcome, MigrationReport, MigrationSource, Migrator};
use crate::db::schema::Collection;
use crate::db::seed::{self, SeedTarget};
use crate::db::store::{EntityStore, Record, display_value, record_id, resolve_index};
use crate::db::utils::current_timestamp;
use crate::db::{DbError, DbResult, Id};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Boolean,
    Real,
    Text,
}

impl ColumnKind {
    fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("BOOL") {
            ColumnKind::Boolean
        } else if declared.contains("INT") {
            ColumnKind::Integer
        } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB")
        {
            ColumnKind::Real
        } else {
            ColumnKind::Text
        }
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    kind: ColumnKind,
}

type TableColumns = HashMap<Collection, Vec<Column>>;

struct InitState {
    report: MigrationReport,
    columns: TableColumns,
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn columns_of(columns: &TableColumns, collection: Collection) -> DbResult<&[Column]> {
    match columns.get(&collection) {
        Some(cols) if !cols.is_empty() => Ok(cols),
        _ => Err(DbError::StorageUnavailable {
            message: format!("table '{}' does not exist; run migrations first", collection),
        }),
    }
}

fn select_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| quote(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_row(collection: Collection, columns: &[Column], row: &SqliteRow) -> DbResult<Record> {
    let decode_failed = |e: sqlx::Error| DbError::InvalidData {
        message: format!("cannot decode {} row: {}", collection.entity_name(), e),
        help: "The column holds a value of an unexpected type".to_string(),
    };

    let mut record = Record::new();
    for column in columns {
        let name = column.name.as_str();
        let value = match column.kind {
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(name)
                .map_err(decode_failed)?
                .map(Value::from),
            ColumnKind::Boolean => row
                .try_get::<Option<bool>, _>(name)
                .map_err(decode_failed)?
                .map(Value::from),
            ColumnKind::Real => row
                .try_get::<Option<f64>, _>(name)
                .map_err(decode_failed)?
                .map(Value::from),
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(name)
                .map_err(decode_failed)?
                .map(Value::from),
        };
        record.insert(column.name.clone(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}

/// Reject fields that have no column, so typos do not vanish silently.
fn check_fields(collection: Collection, columns: &[Column], record: &Record) -> DbResult<()> {
    for key in record.keys() {
        if !columns.iter().any(|c| &c.name == key) {
            return Err(DbError::InvalidData {
                message: format!("{} has no field '{}'", collection.entity_name(), key),
                help: "Add a migration for new fields before writing them".to_string(),
            });
        }
    }
    Ok(())
}

/// Translate a failed write into the store's error vocabulary.
fn write_error(collection: Collection, record: &Record, e: sqlx::Error) -> DbError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            // "UNIQUE constraint failed: users.username"
            let field = db_err
                .message()
                .rsplit(": ")
                .next()
                .and_then(|cols| cols.split(", ").next())
                .and_then(|col| col.rsplit('.').next())
                .unwrap_or("unknown")
                .to_string();
            let value = record
                .get(&field)
                .and_then(display_value)
                .unwrap_or_default();
            return DbError::UniqueViolation {
                entity_type: collection.entity_name().to_string(),
                field,
                value,
            };
        }
        if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
            return DbError::Constraint {
                message: format!("{}: {}", collection.entity_name(), db_err.message()),
            };
        }
    }
    DbError::database(e)
}

async fn insert_row<'e, E>(
    executor: E,
    collection: Collection,
    columns: &[Column],
    mut record: Record,
    keep_id: bool,
) -> DbResult<Id>
where
    E: SqliteExecutor<'e>,
{
    if !keep_id {
        record.remove("id");
    }
    check_fields(collection, columns, &record)?;

    let sql = if record.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote(collection.table_name()))
    } else {
        let names: Vec<String> = record.keys().map(|k| quote(k)).collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(collection.table_name()),
            names.join(", "),
            placeholders
        )
    };

    let mut query = sqlx::query(&sql);
    for value in record.values() {
        query = bind_value(query, value);
    }
    let result = query
        .execute(executor)
        .await
        .map_err(|e| write_error(collection, &record, e))?;
    Ok(result.last_insert_rowid())
}

/// Seeds through the initialization transaction.
struct SqliteSeeder<'c> {
    conn: &'c mut SqliteConnection,
    columns: &'c TableColumns,
}

impl SeedTarget for SqliteSeeder<'_> {
    async fn insert(&mut self, collection: Collection, record: Record) -> DbResult<Id> {
        let columns = columns_of(self.columns, collection)?;
        insert_row(&mut *self.conn, collection, columns, record, false).await
    }
}

/// Entity store over an embedded SQLite database.
///
/// Construction does not touch the database. The first operation creates the
/// parent directory, runs migrations, reads the table layout and seeds a fresh
/// database; concurrent first callers share that one initialization.
pub struct SqliteStore {
    pool: SqlitePool,
    path: Option<PathBuf>,
    source: MigrationSource,
    seed: bool,
    state: OnceCell<InitState>,
}

impl SqliteStore {
    fn with_options(options: SqliteConnectOptions, path: Option<PathBuf>) -> Self {
        // One connection: serialized writes, and `:memory:` survives between calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_lazy_with(options.foreign_keys(true));
        Self {
            pool,
            path,
            source: MigrationSource::Embedded,
            seed: true,
            state: OnceCell::new(),
        }
    }

    /// A store backed by the database file at `path`, created on first use.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        Ok(Self::with_options(options, Some(path)))
    }

    /// A private in-memory database (useful for testing).
    pub fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            DbError::StorageUnavailable {
                message: e.to_string(),
            }
        })?;
        Ok(Self::with_options(options, None))
    }

    /// Read migrations from `source` instead of the embedded set.
    pub fn with_migrations(mut self, source: MigrationSource) -> Self {
        self.source = source;
        self
    }

    /// Skip first-run seed data.
    pub fn without_seed_data(mut self) -> Self {
        self.seed = false;
        self
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn migrations(&self) -> &MigrationSource {
        &self.source
    }

    /// The migration run performed by initialization.
    pub async fn migration_report(&self) -> DbResult<&MigrationReport> {
        Ok(&self.ready().await?.report)
    }

    async fn ready(&self) -> DbResult<&InitState> {
        self.state.get_or_try_init(|| self.initialize()).await
    }

    async fn initialize(&self) -> DbResult<InitState> {
        let parent = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DbError::StorageUnavailable {
                    message: format!("cannot create {}: {}", parent.display(), e),
                })?;
        }

        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DbError::StorageUnavailable {
                message: e.to_string(),
            })?;
        drop(conn);

        let report = Migrator::new(&self.pool, &self.source).migrate().await?;
        let columns = self.read_columns().await?;

        if self.seed && report.previous_version == 0 && report.outcome == MigrationOutcome::Applied
        {
            let mut tx = self.pool.begin().await.map_err(DbError::database)?;
            let mut seeder = SqliteSeeder {
                conn: &mut *tx,
                columns: &columns,
            };
            seed::apply(&mut seeder, &current_timestamp()).await?;
            tx.commit().await.map_err(DbError::database)?;
        }

        info!(
            path = %self.path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| ":memory:".to_string()),
            version = report.current_version,
            "SQLite store ready"
        );
        Ok(InitState { report, columns })
    }

    async fn read_columns(&self) -> DbResult<TableColumns> {
        let mut columns = TableColumns::new();
        for collection in Collection::ALL {
            let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
                .bind(collection.table_name())
                .fetch_all(&self.pool)
                .await
                .map_err(DbError::database)?;
            let table = rows
                .iter()
                .map(|row| Column {
                    name: row.get("name"),
                    kind: ColumnKind::from_declared(row.get::<&str, _>("type")),
                })
                .collect::<Vec<_>>();
            debug!(table = %collection, columns = table.len(), "Read table layout");
            columns.insert(collection, table);
        }
        Ok(columns)
    }

    async fn select(
        &self,
        collection: Collection,
        filter: Option<(&str, &Value)>,
        limit_one: bool,
    ) -> DbResult<Vec<Record>> {
        let columns = columns_of(&self.ready().await?.columns, collection)?;
        let mut sql = format!(
            "SELECT {} FROM {}",
            select_list(columns),
            quote(collection.table_name())
        );
        if let Some((field, _)) = filter {
            sql.push_str(&format!(" WHERE {} IS ?", quote(field)));
        }
        sql.push_str(" ORDER BY \"id\"");
        if limit_one {
            sql.push_str(" LIMIT 1");
        }

        let mut query = sqlx::query(&sql);
        if let Some((_, value)) = filter {
            query = bind_value(query, value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::database)?;
        rows.iter()
            .map(|row| decode_row(collection, columns, row))
            .collect()
    }
}

impl EntityStore for SqliteStore {
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        self.select(collection, None, false).await
    }

    async fn get_by_id(&self, collection: Collection, id: Id) -> DbResult<Option<Record>> {
        let id = Value::from(id);
        let mut rows = self.select(collection, Some(("id", &id)), true).await?;
        Ok(rows.pop())
    }

    async fn get_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> DbResult<Option<Record>> {
        let index = resolve_index(collection, index)?;
        let mut rows = self
            .select(collection, Some((index.field, value)), true)
            .await?;
        Ok(rows.pop())
    }

    async fn get_all_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> DbResult<Vec<Record>> {
        let index = resolve_index(collection, index)?;
        self.select(collection, Some((index.field, value)), false)
            .await
    }

    async fn add(&self, collection: Collection, record: Record) -> DbResult<Id> {
        let columns = columns_of(&self.ready().await?.columns, collection)?;
        insert_row(&self.pool, collection, columns, record, false).await
    }

    async fn update(&self, collection: Collection, record: Record) -> DbResult<()> {
        let columns = columns_of(&self.ready().await?.columns, collection)?;
        let id = record_id(&record).ok_or_else(|| DbError::InvalidData {
            message: format!("{} record has no id", collection.entity_name()),
            help: "Updates replace a record by its id".to_string(),
        })?;
        check_fields(collection, columns, &record)?;

        let fields: Vec<(&String, &Value)> = record.iter().filter(|(k, _)| *k != "id").collect();
        if fields.is_empty() {
            return match self.get_by_id(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(DbError::not_found(collection.entity_name(), id)),
            };
        }

        let assignments = fields
            .iter()
            .map(|(k, _)| format!("{} = ?", quote(k)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE \"id\" = ?",
            quote(collection.table_name()),
            assignments
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in &fields {
            query = bind_value(query, value);
        }
        let result = query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(collection, &record, e))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(collection.entity_name(), id));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Id) -> DbResult<()> {
        self.ready().await?;
        let sql = format!(
            "DELETE FROM {} WHERE \"id\" = ?",
            quote(collection.table_name())
        );
        sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(collection, &Record::new(), e))?;
        Ok(())
    }

    async fn count(
        &self,
        collection: Collection,
        filter: Option<(&str, &Value)>,
    ) -> DbResult<usize> {
        let filter = filter
            .map(|(name, value)| resolve_index(collection, name).map(|idx| (idx.field, value)))
            .transpose()?;
        columns_of(&self.ready().await?.columns, collection)?;

        let mut sql = format!("SELECT COUNT(*) FROM {}", quote(collection.table_name()));
        if let Some((field, _)) = filter {
            sql.push_str(&format!(" WHERE {} IS ?", quote(field)));
        }
        let mut query = sqlx::query(&sql);
        if let Some((_, value)) = filter {
            query = bind_value(query, value);
        }
        let count: i64 = query
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::database)?
            .get(0);
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn next_sequence(&self, name: &str, floor: i64) -> DbResult<i64> {
        self.ready().await?;
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO _sequences (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = MAX(value + 1, excluded.value)
             RETURNING value",
        )
        .bind(name)
        .bind(floor.max(1))
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::database)
    }

    async fn restore(&self, collection: Collection, record: Record) -> DbResult<()> {
        let columns = columns_of(&self.ready().await?.columns, collection)?;
        if record_id(&record).is_none() {
            return Err(DbError::InvalidData {
                message: format!("{} record has no id", collection.entity_name()),
                help: "Restored records keep their original id".to_string(),
            });
        }
        insert_row(&self.pool, collection, columns, record, true).await?;
        Ok(())
    }
}
