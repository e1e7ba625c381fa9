//! Collection catalogue shared by every store backend.
//!
//! Collections and their indexes are declared here, in code. The SQLite
//! backend creates the matching tables through migrations; the memory
//! backend declares them directly from this table.

use std::fmt;

/// A secondary index over one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub field: &'static str,
    pub unique: bool,
}

const fn index(field: &'static str) -> IndexDef {
    IndexDef {
        name: field,
        field,
        unique: false,
    }
}

const fn unique(field: &'static str) -> IndexDef {
    IndexDef {
        name: field,
        field,
        unique: true,
    }
}

/// Every named collection known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Projects,
    IssueTypes,
    Issues,
    Boards,
    Sprints,
    Comments,
    IssueHistory,
    UserStats,
    Achievements,
    UserAchievements,
    Excuses,
}

impl Collection {
    /// All collections, parents before children.
    pub const ALL: [Collection; 12] = [
        Collection::Users,
        Collection::Projects,
        Collection::IssueTypes,
        Collection::Boards,
        Collection::Sprints,
        Collection::Issues,
        Collection::Comments,
        Collection::IssueHistory,
        Collection::UserStats,
        Collection::Achievements,
        Collection::UserAchievements,
        Collection::Excuses,
    ];

    /// Backing table (SQLite) or object store (memory) name.
    pub fn table_name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Projects => "projects",
            Collection::IssueTypes => "issue_types",
            Collection::Issues => "issues",
            Collection::Boards => "boards",
            Collection::Sprints => "sprints",
            Collection::Comments => "comments",
            Collection::IssueHistory => "issue_history",
            Collection::UserStats => "user_stats",
            Collection::Achievements => "achievements",
            Collection::UserAchievements => "user_achievements",
            Collection::Excuses => "excuses",
        }
    }

    /// Entity name used in error messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            Collection::Users => "User",
            Collection::Projects => "Project",
            Collection::IssueTypes => "IssueType",
            Collection::Issues => "Issue",
            Collection::Boards => "Board",
            Collection::Sprints => "Sprint",
            Collection::Comments => "Comment",
            Collection::IssueHistory => "IssueHistory",
            Collection::UserStats => "UserStats",
            Collection::Achievements => "Achievement",
            Collection::UserAchievements => "UserAchievement",
            Collection::Excuses => "Excuse",
        }
    }

    pub fn indexes(self) -> &'static [IndexDef] {
        match self {
            Collection::Users => const { &[unique("username"), index("role")] },
            Collection::Projects => const { &[unique("key"), index("created_by")] },
            Collection::IssueTypes => const { &[unique("name")] },
            Collection::Issues => const { &[
                unique("issue_key"),
                index("project_id"),
                index("assignee_id"),
                index("reporter_id"),
                index("status"),
                index("sprint_id"),
            ] },
            Collection::Boards => const { &[index("project_id")] },
            Collection::Sprints => const { &[index("board_id"), index("status")] },
            Collection::Comments => const { &[index("issue_id"), index("author_id")] },
            Collection::IssueHistory => const { &[index("issue_id"), index("user_id")] },
            Collection::UserStats => const { &[unique("user_id")] },
            Collection::Achievements => const { &[unique("code")] },
            Collection::UserAchievements => const { &[index("user_id"), index("achievement_id")] },
            Collection::Excuses => const { &[index("category")] },
        }
    }

    /// Look up a declared index by name.
    pub fn index(self, name: &str) -> Option<&'static IndexDef> {
        self.indexes().iter().find(|idx| idx.name == name)
    }

    pub fn from_table_name(name: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.table_name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
