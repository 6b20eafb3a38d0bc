use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::StudentId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student name cannot be empty")]
    EmptyName,
}

/// Contact details for a student, validated but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    name: String,
    email: Option<String>,
    phone: Option<String>,
}

fn trimmed_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

impl StudentProfile {
    /// Validate and normalise a student's contact details.
    ///
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` if the name is empty or whitespace-only.
    pub fn new(
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, StudentError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        Ok(Self {
            name: name.to_owned(),
            email: trimmed_optional(email),
            phone: trimmed_optional(phone),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// A person whose training progress is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    #[serde(flatten)]
    profile: StudentProfile,
}

impl Student {
    #[must_use]
    pub fn new(id: StudentId, profile: StudentProfile) -> Self {
        Self { id, profile }
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.profile.name()
    }
}
