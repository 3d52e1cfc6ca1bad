//! In-memory document store and the prompts built from its contents

use crate::extract::{ExtractedDocument, FileCategory, format_file_size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing entry for a stored document (no full text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub name: String,
    pub byte_size: u64,
    /// Human-readable size, e.g. "1.5 KB"
    pub size_label: String,
    pub category: FileCategory,
    pub preview: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&ExtractedDocument> for DocumentSummary {
    fn from(document: &ExtractedDocument) -> Self {
        Self {
            id: document.id,
            name: document.name.clone(),
            byte_size: document.byte_size,
            size_label: format_file_size(document.byte_size),
            category: document.category,
            preview: document.preview.clone(),
            uploaded_at: document.uploaded_at,
        }
    }
}

/// Documents uploaded during this process lifetime, in upload order
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<ExtractedDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: ExtractedDocument) -> DocumentSummary {
        let summary = DocumentSummary::from(&document);
        self.documents.push(document);
        summary
    }

    pub fn get(&self, id: Uuid) -> Option<&ExtractedDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<ExtractedDocument> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        Some(self.documents.remove(index))
    }

    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(DocumentSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Prompt asking a question about one document
pub fn document_question_prompt(document: &ExtractedDocument, question: &str) -> String {
    format!(
        "Based on the following document content, please answer this question: \"{question}\"\n\
        \n\
        Document: {name}\n\
        Content:\n\
        {content}\n\
        \n\
        Please provide a comprehensive answer based on the document content.",
        question = question,
        name = document.name,
        content = document.extracted_text,
    )
}

/// Transcript entry recorded when code is submitted for review
pub fn code_review_request(language: &str, code: &str) -> String {
    format!(
        "Please review this {lang} code:\n\n```{lang}\n{code}\n```",
        lang = language,
        code = code
    )
}

/// Prompt sent upstream for a code review
pub fn code_review_prompt(language: &str, code: &str) -> String {
    format!(
        "Please review this {lang} code and provide feedback on:\n\
        1. Code quality and best practices\n\
        2. Potential bugs or issues\n\
        3. Performance improvements\n\
        4. Security considerations\n\
        5. Suggestions for better readability\n\
        \n\
        Code:\n\
        ```{lang}\n\
        {code}\n\
        ```",
        lang = language,
        code = code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    fn document(name: &str, text: &str) -> ExtractedDocument {
        extract::extract(name, text.as_bytes()).expect("text document")
    }

    #[test]
    fn test_store_insert_get_remove() {
        let mut store = DocumentStore::new();
        let summary = store.insert(document("a.txt", "alpha"));
        store.insert(document("b.txt", "beta"));

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get(summary.id).map(|d| d.extracted_text.as_str()),
            Some("alpha")
        );

        let removed = store.remove(summary.id).expect("present");
        assert_eq!(removed.name, "a.txt");
        assert!(store.get(summary.id).is_none());
        assert!(store.remove(summary.id).is_none());
        assert_eq!(store.summaries()[0].name, "b.txt");
    }

    #[test]
    fn test_document_question_prompt_embeds_content() {
        let prompt = document_question_prompt(&document("notes.md", "The launch is in May."), "When is the launch?");
        assert!(prompt.starts_with(
            "Based on the following document content, please answer this question: \"When is the launch?\""
        ));
        assert!(prompt.contains("Document: notes.md\nContent:\nThe launch is in May.\n"));
        assert!(prompt.ends_with("based on the document content."));
    }

    #[test]
    fn test_code_review_prompt_lists_review_points() {
        let prompt = code_review_prompt("python", "print('hi')");
        assert!(prompt.starts_with("Please review this python code and provide feedback on:\n1."));
        assert!(prompt.contains("4. Security considerations\n"));
        assert!(prompt.ends_with("```python\nprint('hi')\n```"));
    }

    #[test]
    fn test_code_review_request_is_fenced() {
        assert_eq!(
            code_review_request("rust", "fn main() {}"),
            "Please review this rust code:\n\n```rust\nfn main() {}\n```"
        );
    }
}
