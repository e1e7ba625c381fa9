//! First-run reference data.
//!
//! Applied once per store, on the initialization that creates it. Backends
//! provide a [`SeedTarget`] that writes without going through their lazy
//! initialization.

use serde_json::{Value, json};
use tracing::info;

use crate::db::schema::Collection;
use crate::db::store::Record;
use crate::db::{DbError, DbResult, Id};

pub const ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_PROJECT_KEY: &str = "CHORE";
pub const DEFAULT_ISSUE_TYPE: &str = "Chore";

/// Raw insert access used while a store is still initializing.
pub(crate) trait SeedTarget {
    async fn insert(&mut self, collection: Collection, record: Record) -> DbResult<Id>;
}

/// What a seeding run wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub issue_types: usize,
    pub users: usize,
    pub projects: usize,
    pub achievements: usize,
    pub excuses: usize,
}

const ISSUE_TYPES: &[(&str, &str, &str, &str)] = &[
    ("Chore", "🧹", "#4caf50", "Recurring household work nobody volunteers for"),
    ("Bug", "🐛", "#f44336", "Something in the house is broken"),
    ("Errand", "🛒", "#2196f3", "Requires leaving the house"),
    ("Epic", "🏗️", "#9c27b0", "A renovation-sized undertaking"),
    ("Emergency", "🚨", "#ff9800", "Water is coming from somewhere it should not"),
];

const ACHIEVEMENTS: &[(&str, &str, &str, &str, i64, &str, i64)] = &[
    ("first_task", "First Steps", "Complete your first chore", "🎉", 10, "tasks_completed", 1),
    ("task_10", "Getting Domestic", "Complete 10 chores", "🧽", 50, "tasks_completed", 10),
    ("task_50", "Household Hero", "Complete 50 chores", "🦸", 200, "tasks_completed", 50),
    ("task_100", "Chore Machine", "Complete 100 chores", "🤖", 500, "tasks_completed", 100),
    ("streak_3", "On a Roll", "Complete chores 3 days in a row", "🔥", 25, "streak", 3),
    ("streak_7", "Week Warrior", "Complete chores 7 days in a row", "📅", 75, "streak", 7),
    ("streak_30", "Habit Formed", "Complete chores 30 days in a row", "🏆", 300, "streak", 30),
    ("level_5", "Middle Management", "Reach level 5", "👔", 100, "level", 5),
    ("level_10", "Chief Chore Officer", "Reach level 10", "👑", 1000, "level", 10),
];

const EXCUSES: &[(&str, &str, i64)] = &[
    ("general", "I was going to, but then I got distracted by something shinier.", 3),
    ("general", "It's on my list. The list is just very long.", 5),
    ("dishes", "They need to soak. For another day or two.", 4),
    ("dishes", "The dishwasher is technically still running.", 6),
    ("laundry", "I'm waiting until I have a full load. Of everything we own.", 5),
    ("laundry", "Those clothes are in the 'wearable again' pile.", 2),
    ("yard", "It looked like rain. Somewhere. Eventually.", 4),
    ("yard", "Long grass is good for the bees.", 7),
    ("cleaning", "If I clean now, it'll just get dirty again.", 3),
    ("cleaning", "I'm letting the dust build character.", 1),
    ("trash", "It's not full if you push it down hard enough.", 6),
    ("repairs", "I ordered a part. It ships from very far away.", 8),
];

fn object(value: Value) -> DbResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DbError::database(format!(
            "seed record is not an object: {}",
            other
        ))),
    }
}

/// Write the first-run data set.
pub(crate) async fn apply<T: SeedTarget>(target: &mut T, now: &str) -> DbResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for (name, icon, color, description) in ISSUE_TYPES {
        let record = object(json!({
            "name": name,
            "icon": icon,
            "color": color,
            "description": description,
        }))?;
        target.insert(Collection::IssueTypes, record).await?;
        summary.issue_types += 1;
    }

    let admin_id = target
        .insert(
            Collection::Users,
            object(json!({
                "username": ADMIN_USERNAME,
                "display_name": "Head of Household",
                "email": null,
                "avatar_url": null,
                "role": "admin",
                "created_at": now,
                "updated_at": now,
            }))?,
        )
        .await?;
    summary.users += 1;

    target
        .insert(
            Collection::Projects,
            object(json!({
                "name": "Household Chores",
                "key": DEFAULT_PROJECT_KEY,
                "description": "Everything that needs doing around the house",
                "created_by": admin_id,
                "created_at": now,
                "updated_at": now,
            }))?,
        )
        .await?;
    summary.projects += 1;

    for (code, name, description, icon, points, requirement, threshold) in ACHIEVEMENTS {
        let record = object(json!({
            "code": code,
            "name": name,
            "description": description,
            "icon": icon,
            "points": points,
            "requirement": requirement,
            "threshold": threshold,
        }))?;
        target.insert(Collection::Achievements, record).await?;
        summary.achievements += 1;
    }

    for (category, text, believability) in EXCUSES {
        let record = object(json!({
            "category": category,
            "text": text,
            "believability": believability,
        }))?;
        target.insert(Collection::Excuses, record).await?;
        summary.excuses += 1;
    }

    info!(
        issue_types = summary.issue_types,
        achievements = summary.achievements,
        excuses = summary.excuses,
        "Seeded reference data"
    );
    Ok(summary)
}
