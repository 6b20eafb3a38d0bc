use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use coach_core::model::{Category, CategoryId, CategoryName, ProgressRecordId, StudentId};
use storage::repository::{
    CategoryRepository, NewCategoryRecord, ProgressRepository, StorageError,
};

use crate::Clock;
use crate::error::CategoryServiceError;

/// Result of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The record was already in the target; nothing was written.
    Unchanged,
    Moved,
}

/// Category management and the reorganisation of records between them.
#[derive(Clone)]
pub struct CategoryService {
    clock: Clock,
    categories: Arc<dyn CategoryRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl CategoryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        categories: Arc<dyn CategoryRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            categories,
            progress,
        }
    }

    /// Categories of a student, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CategoryServiceError::Storage` if repository access fails.
    pub async fn list(&self, student_id: StudentId) -> Result<Vec<Category>, CategoryServiceError> {
        let categories = self.categories.list_categories(student_id).await?;
        debug!(student = %student_id, len = categories.len(), "listed categories");
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `CategoryServiceError::Category` for a blank name and
    /// `Storage(NotFound)` if the student does not exist.
    pub async fn create(
        &self,
        student_id: StudentId,
        name: &str,
    ) -> Result<Category, CategoryServiceError> {
        let name = CategoryName::new(name)?;
        let category = self
            .categories
            .insert_category(NewCategoryRecord {
                student_id,
                name,
                created_at: self.clock.now(),
            })
            .await?;
        info!(category = %category.id(), student = %student_id, "created category");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `CategoryServiceError::Category` for a blank name and
    /// `Storage(NotFound)` if the category does not exist.
    pub async fn rename(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<(), CategoryServiceError> {
        let name = CategoryName::new(name)?;
        self.categories.rename_category(category_id, &name).await?;
        info!(category = %category_id, "renamed category");
        Ok(())
    }

    /// Delete a category and clear it from every record that points at
    /// it, history included. Both happen in one storage write, so a failure
    /// leaves the category and its references as they were.
    ///
    /// # Errors
    ///
    /// Returns `Storage(NotFound)` if the category does not exist.
    pub async fn delete_category(&self, category_id: CategoryId) -> Result<u64, CategoryServiceError> {
        match self.categories.delete_category(category_id).await {
            Ok(cleared) => {
                info!(category = %category_id, cleared, "deleted category");
                Ok(cleared)
            }
            Err(err) => {
                warn!(category = %category_id, error = %err, "category delete failed");
                Err(err.into())
            }
        }
    }

    /// Point one record at `target`, or at no category with `None`.
    ///
    /// # Errors
    ///
    /// Returns `Storage(NotFound)` for a stale record or category id and
    /// `ForeignCategory` when the target belongs to another student.
    pub async fn move_exercise(
        &self,
        record_id: ProgressRecordId,
        target: Option<CategoryId>,
    ) -> Result<MoveOutcome, CategoryServiceError> {
        let record = self
            .progress
            .get_record(record_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        if record.category_id() == target {
            debug!(record = %record_id, "move to current category skipped");
            return Ok(MoveOutcome::Unchanged);
        }

        if let Some(category_id) = target {
            let category = self
                .categories
                .get_category(category_id)
                .await?
                .ok_or(StorageError::NotFound)?;
            if category.student_id() != record.student_id() {
                return Err(CategoryServiceError::ForeignCategory {
                    category_id,
                    student_id: record.student_id(),
                });
            }
        }

        if let Err(err) = self.progress.set_category(record_id, target).await {
            warn!(record = %record_id, error = %err, "move failed");
            return Err(err.into());
        }
        info!(record = %record_id, target = ?target, "moved record");
        Ok(MoveOutcome::Moved)
    }
}
