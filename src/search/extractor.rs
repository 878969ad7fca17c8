use crate::document::DocumentHost;
use crate::search::types::Chunk;

/// Collect every non-empty text leaf as a [`Chunk`], in document order.
pub fn extract_chunks(document: &dyn DocumentHost) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    document.walk_text(&mut |start, text| {
        if !text.is_empty() {
            chunks.push(Chunk::new(chunks.len(), text, start));
        }
    });
    chunks
}
