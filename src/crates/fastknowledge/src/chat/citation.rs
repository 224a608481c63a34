//! Source citations attached to knowledge-grounded answers.

use crate::search::{DocumentWithScore, SearchClient};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown in place of citations when retrieval found nothing.
pub const NO_DOCUMENTS_NOTICE: &str = "<span style='color:red'>No relevant documents found; this answer comes from the model's own knowledge.</span>";

/// One retrieved document as cited in an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based rank.
    pub index: usize,
    pub file_name: String,
    pub url: String,
    pub content: String,
}

impl Citation {
    /// Citations for `docs` in rank order.
    pub fn from_documents(
        docs: &[DocumentWithScore],
        knowledge_base_name: &str,
        search: &SearchClient,
    ) -> Vec<Citation> {
        docs.iter()
            .enumerate()
            .map(|(i, doc)| {
                let file_name = doc.source().to_string();
                Citation {
                    index: i + 1,
                    url: search.download_url(knowledge_base_name, &file_name),
                    file_name,
                    content: doc.page_content.clone(),
                }
            })
            .collect()
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Source [{}] [{}]({}) \n\n{}\n\n",
            self.index, self.file_name, self.url, self.content
        )
    }
}

/// Markdown entries for the `docs` field of an answer.
///
/// No citations yields the single [`NO_DOCUMENTS_NOTICE`].
pub fn render_citations(citations: &[Citation]) -> Vec<String> {
    if citations.is_empty() {
        return vec![NO_DOCUMENTS_NOTICE.to_string()];
    }
    citations.iter().map(Citation::to_string).collect()
}
