//! Strategies for deciding whether a query needs a live web search.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::conversation::Turn;
use crate::llm_interaction::LanguageModel;

#[async_trait]
pub trait SearchDecision: Send + Sync {
    async fn decide(&self, query: &str) -> bool;
}

/// Phrase table driving [`KeywordDecision`]. All entries are lower-case.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    /// Information-seeking openers.
    pub prefixes: Vec<String>,
    /// Phrases that cancel a prefix match (questions about the assistant itself).
    pub exclusions: Vec<String>,
    /// Time-sensitive phrases that trigger a search anywhere in the query.
    pub triggers: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            prefixes: owned(&["what is", "what are", "who is"]),
            exclusions: owned(&["your name", "your purpose"]),
            triggers: owned(&[
                "latest news",
                "current price",
                "recent events",
                "today's weather",
                "what happened in",
                "summarize the news about",
                "who is",
                "what is the status of",
            ]),
        }
    }
}

/// Local phrase matching; never touches the network.
#[derive(Debug, Clone, Default)]
pub struct KeywordDecision {
    table: KeywordTable,
}

impl KeywordDecision {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();

        let has_prefix = self.table.prefixes.iter().any(|p| query.starts_with(p.as_str()));
        let excluded = self.table.exclusions.iter().any(|e| query.contains(e.as_str()));
        if has_prefix && !excluded {
            return true;
        }

        self.table.triggers.iter().any(|t| query.contains(t.as_str()))
    }
}

#[async_trait]
impl SearchDecision for KeywordDecision {
    async fn decide(&self, query: &str) -> bool {
        let decision = self.matches(query);
        debug!(decision, "Keyword search decision");
        decision
    }
}

/// Asks the language model itself for a YES/NO verdict.
pub struct ModelDecision {
    model: Arc<dyn LanguageModel>,
}

impl ModelDecision {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn prompt_for(query: &str) -> String {
        format!(
            "Does the following user query require a real-time web search to answer accurately? \
            Query: '{}'. Respond with only 'YES' or 'NO'.",
            query
        )
    }
}

#[async_trait]
impl SearchDecision for ModelDecision {
    #[instrument(skip(self, query))]
    async fn decide(&self, query: &str) -> bool {
        let turns = [Turn::user(Self::prompt_for(query))];
        match self.model.generate(&turns, None).await {
            Ok(verdict) => {
                let verdict = verdict.trim().to_uppercase();
                debug!(%verdict, "Model search decision");
                verdict.contains("YES")
            }
            Err(e) => {
                warn!(error = %e, "Search decision call failed, not searching");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm_interaction::GenerationConfig;
    use std::sync::Mutex;

    struct CannedModel {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(reply: Result<&str, ()>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate(
            &self,
            turns: &[Turn],
            config: Option<&GenerationConfig>,
        ) -> Result<String, LlmError> {
            assert!(config.is_none());
            self.prompts.lock().unwrap().push(turns[0].text.clone());
            self.reply.clone().map_err(|_| LlmError::EmptyResponse)
        }
    }

    #[test]
    fn test_every_trigger_phrase_searches() {
        let decision = KeywordDecision::default();
        for trigger in KeywordTable::default().triggers {
            let query = format!("Could you help: {} please", trigger.to_uppercase());
            assert!(decision.matches(&query), "trigger {:?} did not match", trigger);
        }
    }

    #[test]
    fn test_prefix_with_exclusion_is_not_searched() {
        let decision = KeywordDecision::default();
        assert!(!decision.matches("your name please what is"));
        assert!(!decision.matches("What is your name?"));
        assert!(!decision.matches("what are your purpose and goals"));
    }

    #[test]
    fn test_prefix_queries_search() {
        let decision = KeywordDecision::default();
        assert!(decision.matches("What is the current price of gold?"));
        // Known over-trigger of the prefix rule
        assert!(decision.matches("what is recursion"));
        assert!(decision.matches("  Who is the CEO of Google"));
    }

    #[test]
    fn test_plain_queries_do_not_search() {
        let decision = KeywordDecision::default();
        assert!(!decision.matches("Explain recursion"));
        assert!(!decision.matches("fix this python error: NameError"));
        // Known under-trigger: no prefix and no exact trigger phrase
        assert!(!decision.matches("tell me the latest stock price"));
    }

    #[test]
    fn test_custom_table() {
        let decision = KeywordDecision::new(KeywordTable {
            prefixes: vec![],
            exclusions: vec![],
            triggers: vec!["score".to_string()],
        });
        assert!(decision.matches("Final SCORE of the match"));
        assert!(!decision.matches("what is the current price"));
    }

    #[tokio::test]
    async fn test_model_decision_yes() {
        let model = CannedModel::new(Ok("  yes\n"));
        let decision = ModelDecision::new(model.clone());
        assert!(decision.decide("bitcoin price now").await);
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Query: 'bitcoin price now'"));
        assert!(prompts[0].contains("Respond with only 'YES' or 'NO'."));
    }

    #[tokio::test]
    async fn test_model_decision_no_and_ambiguous() {
        assert!(!ModelDecision::new(CannedModel::new(Ok("NO"))).decide("explain loops").await);
        assert!(!ModelDecision::new(CannedModel::new(Ok("maybe"))).decide("explain loops").await);
    }

    #[tokio::test]
    async fn test_model_decision_failure_defaults_to_no() {
        let decision = ModelDecision::new(CannedModel::new(Err(())));
        assert!(!decision.decide("latest news").await);
    }
}
