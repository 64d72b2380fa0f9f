//! Templated question answering over the substring matcher.
//!
//! There is no model behind this: the answer is a fixed template listing
//! up to [`MAX_SOURCES`] matching entries with a short content excerpt.

use serde::Serialize;

use crate::models::KnowledgeEntry;
use crate::query::matches_text;

/// Maximum number of entries cited in one answer.
pub const MAX_SOURCES: usize = 5;
/// Characters of content quoted per cited entry.
pub const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskAnswer {
    pub answer: String,
    /// Ids of the cited entries, in citation order.
    pub sources: Vec<String>,
}

pub fn ask(entries: &[KnowledgeEntry], question: &str) -> AskAnswer {
    let question_lower = question.to_lowercase();
    let relevant: Vec<&KnowledgeEntry> = entries
        .iter()
        .filter(|e| matches_text(e, &question_lower))
        .take(MAX_SOURCES)
        .collect();

    if relevant.is_empty() {
        return AskAnswer {
            answer: format!(
                "I don't have specific information about \"{}\" in your knowledge base. \
                 You can add relevant documentation using the CLI or API.",
                question
            ),
            sources: Vec::new(),
        };
    }

    let lines: Vec<String> = relevant
        .iter()
        .map(|e| {
            let excerpt: String = e.content.chars().take(EXCERPT_CHARS).collect();
            format!("- {}: {}...", e.title, excerpt)
        })
        .collect();

    AskAnswer {
        answer: format!(
            "Based on your knowledge base, here's what I found about \"{}\":\n\n{}",
            question,
            lines.join("\n")
        ),
        sources: relevant.iter().map(|e| e.id.clone()).collect(),
    }
}
