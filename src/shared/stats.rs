use super::models::{Conversation, epoch_to_datetime};
use std::collections::HashMap;

const TOP_MODELS: usize = 10;
const RECENT_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct UsageStats {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub earliest: Option<f64>,
    pub latest: Option<f64>,
    /// Most used models first; ties keep first-seen order.
    pub models: Vec<(String, usize)>,
    /// `YYYY-MM` buckets, newest first.
    pub monthly: Vec<(String, usize)>,
}

impl UsageStats {
    pub fn compute(conversations: &[Conversation]) -> Self {
        let dates: Vec<f64> = conversations
            .iter()
            .filter_map(|c| c.create_time)
            .filter(|ts| *ts != 0.0)
            .collect();

        let mut model_order: Vec<String> = Vec::new();
        let mut model_counts: HashMap<String, usize> = HashMap::new();
        let mut monthly_counts: HashMap<String, usize> = HashMap::new();

        for conv in conversations {
            let model = if conv.model_slug.is_empty() {
                "unknown"
            } else {
                conv.model_slug.as_str()
            };
            let count = model_counts.entry(model.to_string()).or_insert_with(|| {
                model_order.push(model.to_string());
                0
            });
            *count += 1;

            if let Some(dt) = conv
                .create_time
                .filter(|ts| *ts != 0.0)
                .and_then(epoch_to_datetime)
            {
                *monthly_counts
                    .entry(dt.format("%Y-%m").to_string())
                    .or_insert(0) += 1;
            }
        }

        let mut models: Vec<(String, usize)> = model_order
            .into_iter()
            .map(|m| {
                let count = model_counts[&m];
                (m, count)
            })
            .collect();
        models.sort_by(|a, b| b.1.cmp(&a.1));
        models.truncate(TOP_MODELS);

        let mut monthly: Vec<(String, usize)> = monthly_counts.into_iter().collect();
        monthly.sort_by(|a, b| b.0.cmp(&a.0));
        monthly.truncate(RECENT_MONTHS);

        Self {
            total_conversations: conversations.len(),
            total_messages: conversations.iter().map(|c| c.message_count()).sum(),
            earliest: dates.iter().copied().reduce(f64::min),
            latest: dates.iter().copied().reduce(f64::max),
            models,
            monthly,
        }
    }
}
