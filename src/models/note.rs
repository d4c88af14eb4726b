use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// A note.
///
/// `id` and `created_at` never change after creation. `updated_at` starts equal
/// to `created_at` and moves forward on every successful update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a note.
///
/// Both fields are optional on the wire so that a missing title surfaces as a
/// validation error rather than a decode failure. A missing `content` means
/// the empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    /// Validate and split into `(title, content)`.
    pub fn into_fields(self) -> Result<(String, String), StoreError> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            Some(_) => {
                return Err(StoreError::InvalidArgument(
                    "title must not be empty".to_string(),
                ))
            }
            None => return Err(StoreError::InvalidArgument("title is required".to_string())),
        };
        Ok((title, self.content.unwrap_or_default()))
    }
}

/// Acknowledgment returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub id: Uuid,
    pub message: String,
}

impl DeleteConfirmation {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            message: "Note deleted".to_string(),
        }
    }
}
