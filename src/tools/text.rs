//! Text analysis tools.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::resources::ResourceStore;

/// Word, character, and sentence statistics for a piece of text.
pub struct TextStatistics;

#[async_trait]
impl Tool for TextStatistics {
    fn name(&self) -> &str {
        "text_statistics"
    }

    fn description(&self) -> &str {
        "Analyze text and return statistics: word count, character count, average word length, and sentence count."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value, _store: &ResourceStore) -> anyhow::Result<String> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("'text' must be a string"))?;

        let words: Vec<&str> = text.split_whitespace().collect();
        let avg_word_length = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64
        };
        let sentence_count = text.matches(['.', '!', '?']).count();

        let stats = json!({
            "word_count": words.len(),
            "char_count": text.chars().count(),
            "avg_word_length": avg_word_length,
            "sentence_count": sentence_count,
        });
        Ok(stats.to_string())
    }
}
