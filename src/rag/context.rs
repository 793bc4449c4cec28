//! Context formatting for answer prompts.

use crate::vector_store::SearchResult;

/// Join retrieved chunk texts with blank lines, keeping retrieval order.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
