use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Document, DocumentDraft, DocumentId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{MemoryRefreshKind, Pid, System};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for storing and retrieving documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Inserts the document, replacing any entry with the same ID.
    async fn save(&self, document: &Document) -> Result<(), ApplicationError>;
    /// Retrieves a document by its ID.
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError>;
    /// Returns every stored document matching the request. `None` matches all.
    async fn search(
        &self,
        request: Option<&SearchRequest>,
    ) -> Result<Vec<Document>, ApplicationError>;
    /// Returns the total number of stored documents.
    async fn count(&self) -> Result<usize, ApplicationError>;
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// Filter criteria for a search.
///
/// Fields combine with AND; values inside one list combine with OR.
/// A field left as `None` does not constrain the result, while an empty
/// list matches nothing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// Title must start with one of these.
    #[serde(default)]
    pub title_prefixes: Option<Vec<String>>,
    /// Content must contain one of these.
    #[serde(default)]
    pub contains_contents: Option<Vec<String>>,
    /// Author ID must be one of these. Documents without an author never match.
    #[serde(default)]
    pub author_ids: Option<Vec<String>>,
    /// Inclusive lower bound on the creation time.
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the creation time.
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug)]
pub struct SearchResponse {
    /// All matching documents, in no particular order.
    pub hits: Vec<Document>,
    /// Number of matching documents.
    pub nb_hits: usize,
    /// Time taken by the search operation in milliseconds.
    pub processing_time_ms: u128,
}

#[derive(Serialize, Debug)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,         // Physical memory used by all processes
    pub free_bytes: u64,         // Physical memory free
    pub available_bytes: u64,    // Memory available without swapping
    pub process_used_bytes: u64, // Memory used by this process
}

#[derive(Serialize, Debug)]
pub struct EngineStats {
    pub total_documents: usize,
}

#[derive(Serialize, Debug)]
pub struct SystemInfo {
    pub os_name: String,
    pub os_version: String,
}

/// Response for the /stats endpoint.
#[derive(Serialize, Debug)]
pub struct StatsResponse {
    pub system_info: SystemInfo,
    pub memory: MemoryStats,
    pub engine: EngineStats,
}

// --- Application Services (Use Cases) ---

/// The document store: upsert, point lookup and filtered search.
pub struct DocumentService {
    doc_repo: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    pub fn new(doc_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { doc_repo }
    }

    /// Upserts a document.
    ///
    /// A draft whose ID is missing or unknown to the store gets a freshly
    /// generated ID, and its creation time is set to now unless the draft
    /// already carries one. A draft with a known ID replaces the stored
    /// document but keeps the stored creation time.
    #[instrument(skip(self, draft), fields(requested_id = ?draft.id))]
    pub async fn save(&self, draft: DocumentDraft) -> Result<Document, ApplicationError> {
        let existing = match draft.id.as_ref() {
            Some(id) => self.doc_repo.get(id).await?,
            None => None,
        };

        let document = match existing {
            Some(stored) => {
                debug!(doc_id = %stored.id(), "Replacing existing document");
                Document::from_draft(draft, stored.id().clone(), stored.created())
            }
            None => {
                if let Some(requested) = &draft.id {
                    debug!(requested_id = %requested, "Unknown document ID, assigning a new one");
                }
                let id = self.unused_id().await?;
                let created = draft.created.unwrap_or_else(Utc::now);
                Document::from_draft(draft, id, created)
            }
        };

        if let Err(e) = self.doc_repo.save(&document).await {
            error!(doc_id = %document.id(), "Failed to save document to repository: {}", e);
            return Err(ApplicationError::InfrastructureError(format!(
                "Repository save failed: {}",
                e
            )));
        }
        info!(doc_id = %document.id(), "Document saved successfully");
        Ok(document)
    }

    /// Returns the documents matching every provided criterion. `None` returns everything.
    #[instrument(skip(self, request), fields(has_request = request.is_some()))]
    pub async fn search(
        &self,
        request: Option<&SearchRequest>,
    ) -> Result<Vec<Document>, ApplicationError> {
        let documents = self.doc_repo.search(request).await?;
        debug!(hits = documents.len(), "Search finished");
        Ok(documents)
    }

    /// Runs a search and wraps the hits with timing metadata.
    #[instrument(skip(self, request))]
    pub async fn search_documents(
        &self,
        request: Option<SearchRequest>,
    ) -> Result<SearchResponse, ApplicationError> {
        let start_time = Instant::now();
        match self.search(request.as_ref()).await {
            Ok(hits) => {
                let processing_time_ms = start_time.elapsed().as_millis();
                info!(
                    nb_hits = hits.len(),
                    time_ms = processing_time_ms,
                    "Search successful"
                );
                Ok(SearchResponse {
                    nb_hits: hits.len(),
                    hits,
                    processing_time_ms,
                })
            }
            Err(e) => {
                error!(
                    time_ms = start_time.elapsed().as_millis(),
                    "Search failed: {}", e
                );
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(doc_id = %id))]
    pub async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError> {
        self.doc_repo.get(id).await
    }

    /// Like [`find_by_id`](Self::find_by_id), but absence is an error.
    pub async fn get_document(&self, id: &DocumentId) -> Result<Document, ApplicationError> {
        self.find_by_id(id).await?.ok_or_else(|| {
            warn!(doc_id = %id, "Document not found");
            ApplicationError::NotFound(id.to_string())
        })
    }

    pub async fn count(&self) -> Result<usize, ApplicationError> {
        self.doc_repo.count().await
    }

    // Generated IDs must be unused in the store.
    async fn unused_id(&self) -> Result<DocumentId, ApplicationError> {
        loop {
            let candidate = DocumentId::generate();
            if self.doc_repo.get(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            warn!(doc_id = %candidate, "Generated ID already in use, retrying");
        }
    }
}

pub struct StatsService {
    doc_repo: Arc<dyn DocumentRepository>,
}

impl StatsService {
    pub fn new(doc_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { doc_repo }
    }

    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<StatsResponse, ApplicationError> {
        info!("Gathering engine and system statistics");

        let total_documents = self.doc_repo.count().await.map_err(|e| {
            error!("Failed to get total document count for stats: {}", e);
            ApplicationError::InfrastructureError("Failed to retrieve document count".to_string())
        })?;
        let engine_stats = EngineStats { total_documents };
        debug!("Engine stats gathered: {:?}", engine_stats);

        // sysinfo refreshes are blocking, keep them off the async workers
        let (system_info, memory_stats) = tokio::task::spawn_blocking(move || {
            let mut sys = System::new_all();
            sys.refresh_memory_specifics(MemoryRefreshKind::everything());

            let current_pid = Pid::from(std::process::id() as usize);
            let process_memory = sys.process(current_pid).map_or(0, |p| p.memory());

            let memory_stats = MemoryStats {
                total_bytes: sys.total_memory(),
                used_bytes: sys.used_memory(),
                free_bytes: sys.free_memory(),
                available_bytes: sys.available_memory(),
                process_used_bytes: process_memory,
            };
            let system_info = SystemInfo {
                os_name: System::name().unwrap_or_else(|| "Unknown OS".to_string()),
                os_version: System::os_version().unwrap_or_else(|| "Unknown Version".to_string()),
            };
            (system_info, memory_stats)
        })
        .await
        .map_err(|e| {
            ApplicationError::InfrastructureError(format!(
                "System stat gathering task failed: {}",
                e
            ))
        })?;
        debug!("System stats gathered: {:?}, {:?}", system_info, memory_stats);

        Ok(StatsResponse {
            system_info,
            memory: memory_stats,
            engine: engine_stats,
        })
    }
}
