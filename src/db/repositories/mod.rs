//! Typed repositories over an [`EntityStore`].
//!
//! Each repository borrows the store and the clock from a [`Tracker`]. They
//! validate input, compute derived fields, write through the store and read
//! back what was persisted.

mod board;
mod comment;
mod excuse;
mod gamification;
mod history;
mod issue;
mod issue_type;
mod project;
mod sprint;
mod user;

#[cfg(test)]
mod comment_test;
#[cfg(test)]
mod excuse_test;
#[cfg(test)]
mod gamification_test;
#[cfg(test)]
mod sprint_test;
#[cfg(test)]
mod tracker_test;

use std::sync::Arc;

pub use board::BoardRepository;
pub use comment::{CommentRepository, UNKNOWN_AUTHOR};
pub use excuse::ExcuseRepository;
pub use gamification::{
    CompletionOutcome, EarnedAchievement, GamificationRepository, LEVELS, LeaderboardEntry, Level,
    POINTS_PER_COMPLETION, level_for_points, level_title,
};
pub use history::HistoryRepository;
pub use issue::IssueRepository;
pub use issue_type::IssueTypeRepository;
pub use project::ProjectRepository;
pub use sprint::SprintRepository;
pub use user::UserRepository;

use crate::db::store::EntityStore;
use crate::db::utils::{Clock, SystemClock};

/// Clock shared by every repository of a tracker.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Owns a store and hands out repositories over it.
///
/// There is no global instance: construct one per store and pass it (or the
/// repositories it creates) to whatever needs data access.
pub struct Tracker<S: EntityStore> {
    store: Arc<S>,
    clock: SharedClock,
}

impl<S: EntityStore> Clone for Tracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: EntityStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: SharedClock) -> Self {
        Self {
            store: Arc::new(store),
            clock,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn users(&self) -> UserRepository<'_, S> {
        UserRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn projects(&self) -> ProjectRepository<'_, S> {
        ProjectRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn issue_types(&self) -> IssueTypeRepository<'_, S> {
        IssueTypeRepository { store: &self.store }
    }

    pub fn issues(&self) -> IssueRepository<'_, S> {
        IssueRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn boards(&self) -> BoardRepository<'_, S> {
        BoardRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn sprints(&self) -> SprintRepository<'_, S> {
        SprintRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn comments(&self) -> CommentRepository<'_, S> {
        CommentRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn history(&self) -> HistoryRepository<'_, S> {
        HistoryRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn gamification(&self) -> GamificationRepository<'_, S> {
        GamificationRepository {
            store: &self.store,
            clock: self.clock.as_ref(),
        }
    }

    pub fn excuses(&self) -> ExcuseRepository<'_, S> {
        ExcuseRepository { store: &self.store }
    }
}
