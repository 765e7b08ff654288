use application::SearchRequest;
use chrono::{DateTime, Utc};
use domain::Document;
use tracing::trace;

/// Checks a document against every criterion of the request.
///
/// Criteria are ANDed together. Within a list criterion a single matching
/// value is enough. A missing request or criterion matches everything.
pub fn matches_request(doc: &Document, request: Option<&SearchRequest>) -> bool {
    let Some(request) = request else {
        return true;
    };
    trace!(doc_id = %doc.id(), "Applying search criteria");

    matches_title(doc, request.title_prefixes.as_deref())
        && matches_content(doc, request.contains_contents.as_deref())
        && matches_author(doc, request.author_ids.as_deref())
        && matches_created(doc, request.created_from, request.created_to)
}

fn matches_title(doc: &Document, prefixes: Option<&[String]>) -> bool {
    prefixes.is_none_or(|prefixes| {
        prefixes
            .iter()
            .any(|prefix| doc.title().starts_with(prefix.as_str()))
    })
}

fn matches_content(doc: &Document, fragments: Option<&[String]>) -> bool {
    fragments.is_none_or(|fragments| {
        fragments
            .iter()
            .any(|fragment| doc.content().contains(fragment.as_str()))
    })
}

// A document without an author cannot satisfy an author filter.
fn matches_author(doc: &Document, author_ids: Option<&[String]>) -> bool {
    match (author_ids, doc.author_id()) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(ids), Some(author_id)) => ids.iter().any(|id| id == author_id),
    }
}

// Both bounds inclusive.
fn matches_created(
    doc: &Document,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    let created = doc.created();
    from.is_none_or(|from| created >= from) && to.is_none_or(|to| created <= to)
}
