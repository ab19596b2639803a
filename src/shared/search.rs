use super::error::LoadError;
use super::indexer::SearchIndex;
use super::loader;
use super::models::{Conversation, SearchHit, SearchQuery};
use super::parser::sort_newest_first;
use super::tokenizer::tokenize;
use super::utils::parse_date;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Multiplier applied when the whole query appears verbatim in a title.
const TITLE_BOOST: f64 = 2.0;

/// The loaded collection together with its index.
///
/// Everything is computed in [`SearchEngine::new`]; afterwards the engine is
/// read-only, so a shared reference (or an `Arc`) can serve any number of
/// concurrent readers. Reloading means building a new engine.
#[derive(Debug)]
pub struct SearchEngine {
    conversations: Vec<Conversation>,
    titles: Vec<String>,
    positions: HashMap<String, usize>,
    index: SearchIndex,
}

impl SearchEngine {
    pub fn new(mut conversations: Vec<Conversation>) -> Self {
        sort_newest_first(&mut conversations);

        let titles = conversations
            .iter()
            .map(|c| c.title.to_lowercase())
            .collect();

        let mut positions = HashMap::with_capacity(conversations.len());
        for (pos, conv) in conversations.iter().enumerate() {
            positions.entry(conv.id.clone()).or_insert(pos);
        }

        let index = SearchIndex::build(&conversations);
        debug!(
            "Indexed {} terms across {} conversations",
            index.term_count(),
            index.doc_count()
        );

        Self {
            conversations,
            titles,
            positions,
            index,
        }
    }

    /// Load an export from disk and index it.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let engine = Self::new(loader::load(path)?);
        info!("Indexed {} conversations", engine.len());
        Ok(engine)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// First conversation carrying `id`, in collection order.
    pub fn find_by_id(&self, id: &str) -> Option<&Conversation> {
        self.positions.get(id).map(|&pos| &self.conversations[pos])
    }

    /// A slice of the collection plus the total count. An offset past the end
    /// gives an empty page.
    pub fn list_page(&self, offset: usize, limit: usize) -> (&[Conversation], usize) {
        let total = self.conversations.len();
        let start = offset.min(total);
        let end = start.saturating_add(limit).min(total);
        (&self.conversations[start..end], total)
    }

    /// Rank conversations against `query` by summed TF-IDF.
    ///
    /// Titles containing the lowercased query verbatim have their score
    /// doubled; a title match with no term score stays at zero but is still
    /// returned. Ties keep collection order. Date bounds that fail to parse
    /// are ignored.
    pub fn search(&self, query: &SearchQuery) -> Vec<SearchHit<'_>> {
        let tokens = tokenize(&query.text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scores: BTreeMap<usize, f64> = BTreeMap::new();
        for token in &tokens {
            let Some(idf) = self.index.idf(token) else {
                continue;
            };
            for posting in self.index.postings(token) {
                *scores.entry(posting.doc).or_insert(0.0) += posting.tf * idf;
            }
        }

        let needle = query.text.to_lowercase();
        for (doc, title) in self.titles.iter().enumerate() {
            if title.contains(&needle) {
                *scores.entry(doc).or_insert(0.0) *= TITLE_BOOST;
            }
        }

        let ts_from = query.date_from.as_deref().and_then(parse_date);
        let ts_to = query.date_to.as_deref().and_then(parse_date);

        // BTreeMap iterates in collection order, so the stable sort keeps it for ties.
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked
            .into_iter()
            .map(|(doc, score)| SearchHit {
                conversation: &self.conversations[doc],
                score,
            })
            .filter(|hit| {
                let ts = hit.conversation.created_at();
                ts_from.is_none_or(|from| ts >= from) && ts_to.is_none_or(|to| ts <= to)
            })
            .take(query.limit)
            .collect()
    }
}
