use crate::cli::error::CliResult;
use crate::cli::utils::render;
use crate::db::store::EntityStore;
use crate::db::Tracker;

/// A random excuse, optionally from one category.
pub async fn random_excuse<S: EntityStore>(
    tracker: &Tracker<S>,
    category: Option<&str>,
    format: &str,
) -> CliResult<String> {
    let Some(excuse) = tracker.excuses().random(category).await? else {
        return Ok(match category {
            Some(category) => format!(
                "No excuses for '{}'. You'll just have to do it.",
                category
            ),
            None => "No excuses available. You'll just have to do it.".to_string(),
        });
    };
    render(format, &excuse, || {
        format!(
            "\"{}\"\n  [{}] believability {}/10",
            excuse.text, excuse.category, excuse.believability
        )
    })
}
