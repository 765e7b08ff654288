// ./api/src/bin/demo.rs
//! Walks through the store once: save a document, find it by title prefix, then by ID.
use application::{ApplicationError, DocumentService, SearchRequest};
use domain::{Author, DocumentDraft};
use infrastructure::InMemoryDocumentRepository;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run().await {
        error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ApplicationError> {
    let store = DocumentService::new(Arc::new(InMemoryDocumentRepository::new()));

    let author = Author::new("1", "John Doe");
    let draft = DocumentDraft::new("First Document", "This is a test document.", Some(author));

    let document = store.save(draft).await?;
    info!(doc_id = %document.id(), "Demo document saved");

    let request = SearchRequest {
        title_prefixes: Some(vec!["First".to_string()]),
        ..Default::default()
    };
    let results = store.search(Some(&request)).await?;
    println!("Found documents: {}", to_json(&results));

    if let Some(found) = store.find_by_id(document.id()).await? {
        println!("Document found by ID: {}", to_json(&found));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}
