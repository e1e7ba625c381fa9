//! User repository.

use serde_json::json;
use tracing::{info, instrument};

use crate::db::seed::ADMIN_USERNAME;
use crate::db::store::{EntityStore, TypedStore};
use crate::db::utils::{Clock, format_timestamp};
use crate::db::validation::{validate_new_user, validate_user_update};
use crate::db::{Collection, DbError, DbResult, Id, NewUser, Role, User, UserUpdate};

pub struct UserRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> UserRepository<'a, S> {
    /// All users ordered by display name.
    pub async fn get_all(&self) -> DbResult<Vec<User>> {
        let mut users: Vec<User> = self.store.fetch_all().await?;
        users.sort_by_key(|u| u.display_name.to_lowercase());
        Ok(users)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<User>> {
        self.store.fetch(id).await
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        self.store.fetch_by_index("username", &json!(username)).await
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        validate_new_user(user)?;

        // Checked up front so both stores report the same error.
        if self.get_by_username(&user.username).await?.is_some() {
            return Err(DbError::UniqueViolation {
                entity_type: "User".to_string(),
                field: "username".to_string(),
                value: user.username.clone(),
            });
        }

        let now = format_timestamp(self.clock.now());
        let created = self
            .store
            .insert(&User {
                id: 0,
                username: user.username.clone(),
                display_name: user.display_name.clone(),
                email: user.email.clone(),
                avatar_url: user.avatar_url.clone(),
                role: user.role,
                created_at: now.clone(),
                updated_at: now,
            })
            .await?;
        info!(id = created.id, "Created user");
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Id, update: &UserUpdate) -> DbResult<User> {
        validate_user_update(update)?;
        let mut user: User = self.store.fetch_required(id).await?;

        if let Some(display_name) = &update.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(avatar_url) = &update.avatar_url {
            user.avatar_url = avatar_url.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = format_timestamp(self.clock.now());

        self.store.save(&user).await?;
        Ok(user)
    }

    /// Unauthenticated sign-in by username.
    ///
    /// An empty store bootstraps the requested user as an admin; otherwise
    /// unknown usernames are `NotFound`.
    #[instrument(skip(self))]
    pub async fn login(&self, username: &str) -> DbResult<User> {
        if let Some(user) = self.get_by_username(username).await? {
            return Ok(user);
        }

        if self.store.count(Collection::Users, None).await? > 0 {
            return Err(DbError::not_found("User", username));
        }

        let display_name = if username == ADMIN_USERNAME {
            "Head of Household".to_string()
        } else {
            username.to_string()
        };
        info!(username, "Bootstrapping first user as admin");
        self.create(&NewUser {
            username: username.to_string(),
            display_name,
            role: Role::Admin,
            ..Default::default()
        })
        .await
    }
}
