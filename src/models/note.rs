//! Free-text notes kept alongside the ledger.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    models::{Record, RecordId, Searchable},
};

/// A note, as stored by the ledger API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// The ID of the note.
    pub id: RecordId,
    /// The text of the note, never empty.
    pub content: String,
    /// When the server recorded the note.
    #[serde(
        rename = "created_at",
        alias = "createdAt",
        with = "time::serde::rfc3339"
    )]
    pub created_at: OffsetDateTime,
}

impl Record for Note {
    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Searchable for Note {
    fn search_text(&self) -> &str {
        &self.content
    }
}

/// The raw input of the note form.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    /// The note text as typed.
    pub content: String,
}

impl NoteDraft {
    /// Create a draft from form input.
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_owned(),
        }
    }

    /// Check the draft and turn it into a request body. The content is sent
    /// as typed, surrounding whitespace included.
    ///
    /// # Errors
    /// Returns [Error::EmptyField] if the content is empty or only whitespace.
    pub fn validate(self) -> Result<NewNote, Error> {
        if self.content.trim().is_empty() {
            return Err(Error::EmptyField("note"));
        }

        Ok(NewNote {
            content: self.content,
        })
    }
}

/// The request body for creating a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    /// The text of the note.
    pub content: String,
}
