use tabled::Tabled;

use super::resolve_issue;
use crate::cli::error::CliResult;
use crate::cli::utils::{render, render_rows, truncate_with_ellipsis};
use crate::db::store::EntityStore;
use crate::db::{CommentWithAuthor, Id, NewComment, Tracker, User};

#[derive(Tabled)]
struct CommentDisplay {
    #[tabled(rename = "ID")]
    id: Id,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Comment")]
    content: String,
}

impl From<&CommentWithAuthor> for CommentDisplay {
    fn from(entry: &CommentWithAuthor) -> Self {
        let comment = &entry.comment;
        let mut content = truncate_with_ellipsis(&comment.content, 60);
        if comment.is_edited {
            content.push_str(" (edited)");
        }
        if comment.is_passive_aggressive {
            content.push_str(" 🙂");
        }
        Self {
            id: comment.id,
            author: entry.author_name.clone(),
            when: comment.created_at.clone(),
            content,
        }
    }
}

pub async fn list_comments<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    format: &str,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;
    let comments = tracker.comments().get_by_issue_id(issue.id).await?;
    render(format, &comments, || {
        render_rows(
            comments.iter().map(CommentDisplay::from).collect(),
            "No comments yet.",
        )
    })
}

pub async fn add_comment<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    content: &str,
    passive_aggressive: bool,
    actor: &User,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;
    let comment = tracker
        .comments()
        .create(&NewComment {
            issue_id: issue.id,
            author_id: actor.id,
            content: content.to_string(),
            is_passive_aggressive: passive_aggressive,
        })
        .await?;
    Ok(format!(
        "✓ Commented on {} (comment {})",
        issue.issue_key, comment.id
    ))
}

pub async fn edit_comment<S: EntityStore>(
    tracker: &Tracker<S>,
    id: Id,
    content: &str,
) -> CliResult<String> {
    let comment = tracker.comments().update(id, content).await?;
    Ok(format!("✓ Edited comment {}", comment.id))
}
