use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ExerciseId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise name cannot be empty")]
    EmptyName,
}

/// Name and muscle-group label of a catalog exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDetails {
    name: String,
    muscle_group: String,
}

impl ExerciseDetails {
    /// # Errors
    ///
    /// Returns `ExerciseError::EmptyName` if the name is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        muscle_group: impl Into<String>,
    ) -> Result<Self, ExerciseError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ExerciseError::EmptyName);
        }
        Ok(Self {
            name: name.trim().to_owned(),
            muscle_group: muscle_group.into().trim().to_owned(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Muscle-group label; may be empty.
    #[must_use]
    pub fn muscle_group(&self) -> &str {
        &self.muscle_group
    }
}

/// An exercise from the shared catalog. Not owned by any student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    id: ExerciseId,
    #[serde(flatten)]
    details: ExerciseDetails,
}

impl Exercise {
    #[must_use]
    pub fn new(id: ExerciseId, details: ExerciseDetails) -> Self {
        Self { id, details }
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn details(&self) -> &ExerciseDetails {
        &self.details
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.details.name()
    }

    #[must_use]
    pub fn muscle_group(&self) -> &str {
        self.details.muscle_group()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_name() {
        let err = ExerciseDetails::new(" ", "Chest").unwrap_err();
        assert_eq!(err, ExerciseError::EmptyName);
    }

    #[test]
    fn allows_blank_muscle_group() {
        let details = ExerciseDetails::new("Plank", "  ").unwrap();
        assert_eq!(details.name(), "Plank");
        assert_eq!(details.muscle_group(), "");
    }
}
