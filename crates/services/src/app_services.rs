use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::board_service::BoardService;
use crate::category_service::CategoryService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::roster_service::RosterService;
use crate::set_service::SetService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    board: Arc<BoardService>,
    progress: Arc<ProgressService>,
    sets: Arc<SetService>,
    categories: Arc<CategoryService>,
    roster: Arc<RosterService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let board = Arc::new(BoardService::new(
            Arc::clone(&storage.students),
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.categories),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.sets),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.students),
            Arc::clone(&storage.exercises),
            Arc::clone(&storage.categories),
            Arc::clone(&storage.progress),
        ));
        let sets = Arc::new(SetService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.sets),
        ));
        let categories = Arc::new(CategoryService::new(
            clock,
            Arc::clone(&storage.categories),
            Arc::clone(&storage.progress),
        ));
        let roster = Arc::new(RosterService::new(
            Arc::clone(&storage.students),
            Arc::clone(&storage.exercises),
        ));

        Self {
            board,
            progress,
            sets,
            categories,
            roster,
        }
    }

    #[must_use]
    pub fn board(&self) -> Arc<BoardService> {
        Arc::clone(&self.board)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn sets(&self) -> Arc<SetService> {
        Arc::clone(&self.sets)
    }

    #[must_use]
    pub fn categories(&self) -> Arc<CategoryService> {
        Arc::clone(&self.categories)
    }

    #[must_use]
    pub fn roster(&self) -> Arc<RosterService> {
        Arc::clone(&self.roster)
    }
}
