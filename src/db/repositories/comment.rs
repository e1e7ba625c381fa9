//! Comment repository.

use std::collections::HashMap;

use serde_json::json;
use tracing::instrument;

use crate::db::store::{Entity, EntityStore, TypedStore};
use crate::db::utils::{Clock, format_timestamp};
use crate::db::validation::{validate_comment_content, validate_new_comment};
use crate::db::{Comment, CommentWithAuthor, DbResult, Id, Issue, NewComment, User};

/// Shown when a comment's author no longer resolves.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

pub struct CommentRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> CommentRepository<'a, S> {
    /// Comments of an issue with author display data, oldest first.
    pub async fn get_by_issue_id(&self, issue_id: Id) -> DbResult<Vec<CommentWithAuthor>> {
        let mut comments: Vec<Comment> = self
            .store
            .fetch_all_by_index("issue_id", &json!(issue_id))
            .await?;
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut authors: HashMap<Id, Option<User>> = HashMap::new();
        let mut joined = Vec::with_capacity(comments.len());
        for comment in comments {
            if !authors.contains_key(&comment.author_id) {
                let author = self.store.fetch::<User>(comment.author_id).await?;
                authors.insert(comment.author_id, author);
            }
            let author = authors.get(&comment.author_id).and_then(Option::as_ref);
            joined.push(CommentWithAuthor {
                author_name: author
                    .map(|u| u.display_name.clone())
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                author_avatar: author.and_then(|u| u.avatar_url.clone()),
                comment,
            });
        }
        Ok(joined)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<Comment>> {
        self.store.fetch(id).await
    }

    #[instrument(skip(self, comment), fields(issue_id = comment.issue_id))]
    pub async fn create(&self, comment: &NewComment) -> DbResult<Comment> {
        validate_new_comment(comment)?;
        self.store.fetch_required::<Issue>(comment.issue_id).await?;

        let now = format_timestamp(self.clock.now());
        self.store
            .insert(&Comment {
                id: 0,
                issue_id: comment.issue_id,
                author_id: comment.author_id,
                content: comment.content.clone(),
                created_at: now.clone(),
                updated_at: now,
                is_edited: false,
                is_passive_aggressive: comment.is_passive_aggressive,
            })
            .await
    }

    /// Replace the text of a comment and mark it edited.
    #[instrument(skip(self, content))]
    pub async fn update(&self, id: Id, content: &str) -> DbResult<Comment> {
        validate_comment_content(content)?;
        let mut comment: Comment = self.store.fetch_required(id).await?;
        comment.content = content.to_string();
        comment.is_edited = true;
        comment.updated_at = format_timestamp(self.clock.now());
        self.store.save(&comment).await?;
        Ok(comment)
    }

    pub async fn delete(&self, id: Id) -> DbResult<()> {
        self.store.delete(Comment::COLLECTION, id).await
    }
}
