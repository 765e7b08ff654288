use chrono::{DateTime, Utc}; // Creation timestamps
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid; // For generated document identifiers

// --- Document ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)] // Serialized as a bare string
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (v4 UUID) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
impl From<DocumentId> for String {
    fn from(doc_id: DocumentId) -> Self {
        doc_id.0
    }
}
impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Author ---

/// The author of a document. Embedded by value, it has no lifecycle of its own.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// --- Document Draft (input to save) ---

/// A document as handed to the store. Identifier and creation time are
/// optional here; the store fills them in on save.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    /// Identifier of an existing document to replace. Unknown ids are not kept.
    #[serde(default)]
    pub id: Option<DocumentId>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<Author>,
    /// Only honoured when the draft creates a new document.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl DocumentDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, author: Option<Author>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            author,
            created: None,
        }
    }

    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

// Turns a stored document back into a draft, e.g. to edit and re-save it.
impl From<Document> for DocumentDraft {
    fn from(document: Document) -> Self {
        Self {
            id: Some(document.id),
            title: document.title,
            content: document.content,
            author: document.author,
            created: Some(document.created),
        }
    }
}

// --- Stored Document ---

/// A document held by the store. Always carries an identifier and a creation time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    title: String,
    content: String,
    author: Option<Author>,
    created: DateTime<Utc>,
}

impl Document {
    /// Materializes a draft under the given identifier and creation time.
    /// Whatever id/created the draft carried is discarded.
    pub fn from_draft(draft: DocumentDraft, id: DocumentId, created: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            author: draft.author,
            created,
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> Option<&Author> {
        self.author.as_ref()
    }

    /// Identifier of the author, if the document has one.
    pub fn author_id(&self) -> Option<&str> {
        self.author.as_ref().map(|author| author.id.as_str())
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}
