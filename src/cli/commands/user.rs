use tabled::Tabled;

use crate::cli::error::CliResult;
use crate::cli::utils::{or_dash, render, render_rows};
use crate::db::store::EntityStore;
use crate::db::{NewUser, Tracker, User};

#[derive(Tabled)]
struct UserDisplay {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Email")]
    email: String,
}

impl From<&User> for UserDisplay {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role.to_string(),
            email: or_dash(user.email.as_deref()),
        }
    }
}

pub async fn list_users<S: EntityStore>(tracker: &Tracker<S>, format: &str) -> CliResult<String> {
    let users = tracker.users().get_all().await?;
    render(format, &users, || {
        render_rows(users.iter().map(UserDisplay::from).collect(), "No users found.")
    })
}

pub async fn create_user<S: EntityStore>(
    tracker: &Tracker<S>,
    user: NewUser,
) -> CliResult<String> {
    let user = tracker.users().create(&user).await?;
    Ok(format!("✓ Created user: {} ({})", user.username, user.id))
}

/// Resolve the acting user, creating the first admin in an empty store.
pub async fn login<S: EntityStore>(
    tracker: &Tracker<S>,
    username: &str,
    format: &str,
) -> CliResult<String> {
    let user = tracker.users().login(username).await?;
    render(format, &user, || {
        format!("✓ Logged in as {} ({}, {})", user.display_name, user.username, user.role)
    })
}
