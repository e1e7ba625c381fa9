//! The `hb` command line.
//!
//! Commands run directly against the local store: a SQLite file by default,
//! or the volatile memory store with `--memory`.

mod commands;
pub mod error;
mod utils;


use std::path::PathBuf;

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV, StorageTarget};
use crate::db::store::EntityStore;
use crate::db::{
    BoardType, Id, MemoryStore, NewSprint, NewUser, Role, SqliteStore, Tracker, User,
};
use commands::issue::{IssueFields, IssueFilter};
use error::CliResult;

#[derive(Parser)]
#[command(name = "hb")]
#[command(author, version, about = "Enterprise-grade issue tracking for household chores", long_about = None)]
pub struct Cli {
    /// Database file (default: HOMEBOARD_DB or ~/.local/share/homeboard/homeboard.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    /// Read migrations from a directory instead of the built-in set
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Act as this user (default: HOMEBOARD_USER or admin)
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    pub user: Option<String>,

    /// Output format (table or json)
    #[arg(long, global = true, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Show the acting user, creating the first admin in an empty store
    Login,
    /// Household members
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Issues (chores)
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },
    /// Comments on issues
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },
    /// Boards
    Board {
        #[command(subcommand)]
        command: BoardCommands,
    },
    /// Sprints
    Sprint {
        #[command(subcommand)]
        command: SprintCommands,
    },
    /// Points, level and streak of a user (default: acting user)
    Stats { username: Option<String> },
    /// Everyone ranked by points
    Leaderboard,
    /// Achievement catalog and progress of a user (default: acting user)
    Achievements { username: Option<String> },
    /// Get a random excuse
    Excuse {
        /// Only excuses from this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Write every collection to JSONL files in a directory
    Export { dir: PathBuf },
    /// Load JSONL files written by export
    Import { dir: PathBuf },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List,
    /// Add a household member
    Create {
        username: String,
        /// Display name (default: the username)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// admin, member or guest
        #[arg(long, default_value = "member")]
        role: Role,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List projects
    List,
    /// Show a project by key
    Show { key: String },
    /// Create a project
    Create {
        /// Short uppercase key such as HOME
        key: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum IssueCommands {
    /// List issues, newest first
    List {
        /// Project key
        #[arg(long)]
        project: Option<String>,
        /// Username of the assignee
        #[arg(long)]
        assignee: Option<String>,
        /// Sprint id
        #[arg(long)]
        sprint: Option<Id>,
    },
    /// Show one issue
    Show { issue: String },
    /// Create an issue
    Create {
        /// Project key
        project: String,
        summary: String,
        /// Initial status (default: todo)
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        fields: IssueFields,
    },
    /// Move an issue to a status; `done` credits the acting user
    Status { issue: String, status: String },
    /// Change issue fields
    Update {
        issue: String,
        #[arg(long)]
        summary: Option<String>,
        #[command(flatten)]
        fields: IssueFields,
    },
    /// Delete an issue (its comments and history stay)
    Delete { issue: String },
    /// Change history of an issue
    History { issue: String },
    /// Open issues past their due date
    Overdue,
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Comments on an issue, oldest first
    List { issue: String },
    /// Comment on an issue
    Add {
        issue: String,
        content: String,
        /// Flag the comment as passive-aggressive
        #[arg(long)]
        passive_aggressive: bool,
    },
    /// Replace the text of a comment
    Edit { id: Id, content: String },
}

#[derive(Subcommand)]
enum BoardCommands {
    /// List boards
    List {
        /// Project key
        #[arg(long)]
        project: Option<String>,
    },
    /// Create a board
    Create {
        /// Project key
        project: String,
        name: String,
        /// scrum or kanban
        #[arg(long = "type", default_value = "kanban")]
        board_type: BoardType,
    },
}

#[derive(Subcommand)]
enum SprintCommands {
    /// List sprints
    List {
        #[arg(long)]
        board: Option<Id>,
    },
    /// Plan a sprint on a board
    Create {
        board: Id,
        name: String,
        #[arg(long)]
        goal: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Start a sprint
    Start { id: Id },
    /// Close a sprint
    Close { id: Id },
}

impl Cli {
    /// Environment configuration with this invocation's flags applied.
    fn config(&self) -> CliResult<Config> {
        let mut config = Config::new()?;
        if let Some(db) = &self.db {
            config = config.with_db_path(db.clone());
        }
        if self.memory {
            config = config.in_memory();
        }
        if let Some(dir) = &self.migrations_dir {
            config = config.with_migrations_dir(dir.clone());
        }
        if let Some(user) = &self.user {
            config = config.with_username(user.clone());
        }
        Ok(config)
    }
}

/// Log to stderr, filtered by HOMEBOARD_LOG, then RUST_LOG.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("homeboard=warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub async fn run() -> miette::Result<()> {
    let mut cli = Cli::parse();
    init_tracing();

    let Some(command) = cli.command.take() else {
        Cli::command().print_help().into_diagnostic()?;
        return Ok(());
    };
    let config = cli.config()?;
    debug!(storage = ?config.storage, migrations = %config.migrations, "Resolved configuration");

    let output = match &config.storage {
        StorageTarget::Memory => {
            let tracker = Tracker::new(MemoryStore::new());
            execute(&tracker, &config, command, &cli.format).await?
        }
        StorageTarget::File(path) => {
            let store = SqliteStore::open(path)?.with_migrations(config.migrations.clone());
            let tracker = Tracker::new(store);
            match command {
                Commands::Migrate => {
                    commands::migrate::migrate(tracker.store(), &cli.format).await?
                }
                command => execute(&tracker, &config, command, &cli.format).await?,
            }
        }
    };

    println!("{}", output);
    Ok(())
}

async fn execute<S: EntityStore>(
    tracker: &Tracker<S>,
    config: &Config,
    command: Commands,
    format: &str,
) -> CliResult<String> {
    use commands::*;

    match command {
        Commands::Migrate => Ok("The memory store has no schema to migrate.".to_string()),
        Commands::Login => user::login(tracker, &config.username, format).await,
        Commands::User { command } => match command {
            UserCommands::List => user::list_users(tracker, format).await,
            UserCommands::Create {
                username,
                name,
                email,
                role,
            } => {
                let display_name = name.unwrap_or_else(|| username.clone());
                user::create_user(
                    tracker,
                    NewUser {
                        username,
                        display_name,
                        email,
                        avatar_url: None,
                        role,
                    },
                )
                .await
            }
        },
        Commands::Project { command } => match command {
            ProjectCommands::List => project::list_projects(tracker, format).await,
            ProjectCommands::Show { key } => project::show_project(tracker, &key, format).await,
            ProjectCommands::Create {
                key,
                name,
                description,
            } => {
                let actor = acting_user(tracker, config).await?;
                project::create_project(tracker, &key, &name, description, &actor).await
            }
        },
        Commands::Issue { command } => match command {
            IssueCommands::List {
                project,
                assignee,
                sprint,
            } => {
                let filter = IssueFilter {
                    project: project.as_deref(),
                    assignee: assignee.as_deref(),
                    sprint,
                };
                issue::list_issues(tracker, filter, format).await
            }
            IssueCommands::Show { issue } => issue::show_issue(tracker, &issue, format).await,
            IssueCommands::Create {
                project,
                summary,
                status,
                fields,
            } => {
                let actor = acting_user(tracker, config).await?;
                issue::create_issue(tracker, &project, &summary, status, fields, &actor).await
            }
            IssueCommands::Status { issue, status } => {
                let actor = acting_user(tracker, config).await?;
                issue::set_status(tracker, &issue, &status, &actor).await
            }
            IssueCommands::Update {
                issue,
                summary,
                fields,
            } => {
                let actor = acting_user(tracker, config).await?;
                issue::update_issue(tracker, &issue, summary, fields, &actor).await
            }
            IssueCommands::Delete { issue } => {
                let actor = acting_user(tracker, config).await?;
                issue::delete_issue(tracker, &issue, &actor).await
            }
            IssueCommands::History { issue } => {
                issue::issue_history(tracker, &issue, format).await
            }
            IssueCommands::Overdue => {
                issue::overdue_issues(tracker, Utc::now().date_naive(), format).await
            }
        },
        Commands::Comment { command } => match command {
            CommentCommands::List { issue } => comment::list_comments(tracker, &issue, format).await,
            CommentCommands::Add {
                issue,
                content,
                passive_aggressive,
            } => {
                let actor = acting_user(tracker, config).await?;
                comment::add_comment(tracker, &issue, &content, passive_aggressive, &actor).await
            }
            CommentCommands::Edit { id, content } => {
                comment::edit_comment(tracker, id, &content).await
            }
        },
        Commands::Board { command } => match command {
            BoardCommands::List { project } => {
                board::list_boards(tracker, project.as_deref(), format).await
            }
            BoardCommands::Create {
                project,
                name,
                board_type,
            } => board::create_board(tracker, &project, &name, board_type).await,
        },
        Commands::Sprint { command } => match command {
            SprintCommands::List { board } => sprint::list_sprints(tracker, board, format).await,
            SprintCommands::Create {
                board,
                name,
                goal,
                start,
                end,
            } => {
                sprint::create_sprint(
                    tracker,
                    NewSprint {
                        board_id: board,
                        name,
                        goal,
                        start_date: start,
                        end_date: end,
                    },
                )
                .await
            }
            SprintCommands::Start { id } => sprint::start_sprint(tracker, id).await,
            SprintCommands::Close { id } => sprint::close_sprint(tracker, id).await,
        },
        Commands::Stats { username } => {
            let user = user_or_actor(tracker, config, username.as_deref()).await?;
            gamification::show_stats(tracker, &user, format).await
        }
        Commands::Leaderboard => gamification::leaderboard(tracker, format).await,
        Commands::Achievements { username } => {
            let user = user_or_actor(tracker, config, username.as_deref()).await?;
            gamification::achievements(tracker, &user, format).await
        }
        Commands::Excuse { category } => {
            excuse::random_excuse(tracker, category.as_deref(), format).await
        }
        Commands::Export { dir } => backup::export(tracker.store(), &dir).await,
        Commands::Import { dir } => backup::import(tracker.store(), &dir).await,
    }
}

async fn acting_user<S: EntityStore>(
    tracker: &Tracker<S>,
    config: &Config,
) -> CliResult<User> {
    Ok(tracker.users().login(&config.username).await?)
}

async fn user_or_actor<S: EntityStore>(
    tracker: &Tracker<S>,
    config: &Config,
    username: Option<&str>,
) -> CliResult<User> {
    match username {
        Some(username) => commands::resolve_user(tracker, username).await,
        None => acting_user(tracker, config).await,
    }
}
