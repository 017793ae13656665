//! Identifier allocation and the id → document table.

use super::types::{Document, DocumentId};

/// Arena of stored documents, keyed by a dense zero-based identifier.
///
/// The identifier of a document is its position in the arena, so allocation
/// and storage are a single step and an id can never be handed out twice.
/// Entries are never removed.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` under the next identifier and returns that identifier.
    pub fn insert(&mut self, document: Document) -> DocumentId {
        let id = self.next_id();
        self.documents.push(document);
        id
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        usize::try_from(id).ok().and_then(|index| self.documents.get(index))
    }

    /// The identifier the next [`insert`](Self::insert) will return.
    pub fn next_id(&self) -> DocumentId {
        self.documents.len() as DocumentId
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_zero_based() {
        let mut store = DocumentStore::new();
        assert_eq!(store.next_id(), 0);

        assert_eq!(store.insert(Document::new("a")), 0);
        assert_eq!(store.insert(Document::new("b")), 1);
        assert_eq!(store.insert(Document::new("c")), 2);

        assert_eq!(store.len(), 3);
        assert_eq!(store.next_id(), 3);
        assert_eq!(store.get(1).map(|d| d.content.as_str()), Some("b"));
    }

    #[test]
    fn test_missing_id() {
        let mut store = DocumentStore::new();
        store.insert(Document::new("only"));

        assert!(store.get(1).is_none());
        assert!(store.get(u64::MAX).is_none());
    }
}
