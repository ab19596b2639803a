use super::models::Conversation;
use super::tokenizer::tokenize;
use std::collections::HashMap;

/// One entry of a posting list: a conversation position in the collection
/// and the term's normalized frequency in that conversation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc: usize,
    pub tf: f64,
}

/// Inverted TF-IDF index over a finalized, sorted collection.
///
/// Built once and never mutated; all accessors take `&self`.
#[derive(Debug, Default)]
pub struct SearchIndex {
    postings: HashMap<String, Vec<Posting>>,
    idf: HashMap<String, f64>,
    doc_count: usize,
}

impl SearchIndex {
    /// Each conversation is indexed as one document made of its title and
    /// every message text. Positions refer to `conversations` as given.
    pub fn build(conversations: &[Conversation]) -> Self {
        let doc_count = conversations.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_counts: Vec<(HashMap<String, usize>, usize)> = Vec::with_capacity(doc_count);

        for conv in conversations {
            let mut counts: HashMap<String, usize> = HashMap::new();
            let mut total = 0;

            let texts = std::iter::once(conv.title.as_str())
                .chain(conv.messages.iter().map(|m| m.text.as_str()));
            for text in texts {
                for token in tokenize(text) {
                    *counts.entry(token).or_insert(0) += 1;
                    total += 1;
                }
            }

            for term in counts.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            term_counts.push((counts, total));
        }

        let idf = doc_freq
            .into_iter()
            .map(|(term, df)| (term, inverse_document_frequency(doc_count, df)))
            .collect();

        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        for (doc, (counts, total)) in term_counts.into_iter().enumerate() {
            let total = total.max(1) as f64;
            for (term, count) in counts {
                postings.entry(term).or_default().push(Posting {
                    doc,
                    tf: count as f64 / total,
                });
            }
        }

        Self {
            postings,
            idf,
            doc_count,
        }
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Smoothed IDF: `ln((N + 1) / (df + 1)) + 1`, always positive.
pub fn inverse_document_frequency(doc_count: usize, doc_freq: usize) -> f64 {
    ((doc_count as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0
}
