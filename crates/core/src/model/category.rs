use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CategoryId, StudentId};

/// Validated category name (trimmed, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a validated category name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, CategoryError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A grouping of exercises scoped to one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    student_id: StudentId,
    name: CategoryName,
    created_at: DateTime<Utc>,
}

impl Category {
    #[must_use]
    pub fn new(
        id: CategoryId,
        student_id: StudentId,
        name: CategoryName,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student_id,
            name,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> CategoryId {
        self.id
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn name(&self) -> &CategoryName {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a copy carrying a new name; identity and creation time are kept.
    #[must_use]
    pub fn renamed(&self, name: CategoryName) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn name_is_trimmed() {
        let name = CategoryName::new("  Legs ").unwrap();
        assert_eq!(name.as_str(), "Legs");
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(CategoryName::new("\t ").unwrap_err(), CategoryError::EmptyName);
    }

    #[test]
    fn renamed_keeps_identity() {
        let category = Category::new(
            CategoryId::new(3),
            StudentId::new(1),
            CategoryName::new("Upper").unwrap(),
            fixed_now(),
        );
        let renamed = category.renamed(CategoryName::new("Upper body").unwrap());
        assert_eq!(renamed.id(), category.id());
        assert_eq!(renamed.created_at(), category.created_at());
        assert_eq!(renamed.name().as_str(), "Upper body");
    }
}
