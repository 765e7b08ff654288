// ./infrastructure/src/persistence/in_memory_repository.rs
use crate::search::matches_request;
use application::{ApplicationError, DocumentRepository, SearchRequest};
use async_trait::async_trait;
use dashmap::DashMap;
use domain::{Document, DocumentId};
use std::sync::Arc;
use tracing::{debug, instrument};

// --- Document Repository Implementation ---

/// Hash-map document store. Cloning yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    // Document ID -> Document
    store: Arc<DashMap<DocumentId, Arc<Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn save(&self, document: &Document) -> Result<(), ApplicationError> {
        debug!(doc_id = %document.id(), "Saving document to in-memory store");
        self.store
            .insert(document.id().clone(), Arc::new(document.clone()));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError> {
        debug!(doc_id = %id, "Getting document from in-memory store");
        // Get returns a Ref, so we clone the Arc's contents out before releasing the shard lock
        let doc = self.store.get(id).map(|doc_ref| (**doc_ref).clone());
        Ok(doc)
    }

    /// Full scan; there is no secondary index.
    #[instrument(skip(self, request))]
    async fn search(
        &self,
        request: Option<&SearchRequest>,
    ) -> Result<Vec<Document>, ApplicationError> {
        debug!(has_request = request.is_some(), total = self.store.len(), "Scanning in-memory store");
        let hits: Vec<Document> = self
            .store
            .iter()
            .filter(|entry| matches_request(entry.value(), request))
            .map(|entry| (**entry.value()).clone())
            .collect();
        debug!(hits = hits.len(), "In-memory scan finished");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.store.len())
    }
}
