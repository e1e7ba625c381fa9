use miette::Diagnostic;
use thiserror::Error;

use crate::backup::BackupError;
use crate::config::ConfigError;
use crate::db::DbError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("No {kind} matches '{reference}'")]
    #[diagnostic(
        code(homeboard::cli::not_found),
        help("Issues take a key such as HOME-1 or a numeric id; projects take their key.")
    )]
    NotFound { kind: &'static str, reference: String },

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(homeboard::cli::output))]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn not_found(kind: &'static str, reference: impl Into<String>) -> Self {
        CliError::NotFound {
            kind,
            reference: reference.into(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
