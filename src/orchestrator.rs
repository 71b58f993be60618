//! One user turn, end to end: decide, optionally search and augment, ask the
//! model.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::augment::augment;
use crate::constants::RATE_LIMIT_MESSAGE;
use crate::conversation::ConversationLog;
use crate::decision::SearchDecision;
use crate::llm_interaction::{GenerationConfig, LanguageModel};
use crate::search::{SearchProvider, SearchResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub searched_web: bool,
}

/// Closed set of things a turn can end in.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered(Reply),
    /// The search failed but the model still answered, with the failure text as
    /// its search context.
    SearchFailed { reply: Reply, detail: String },
    RateLimited,
    Failed(String),
}

impl TurnOutcome {
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            TurnOutcome::Answered(reply) | TurnOutcome::SearchFailed { reply, .. } => Some(reply),
            TurnOutcome::RateLimited | TurnOutcome::Failed(_) => None,
        }
    }

    /// Text to show the user when the turn produced no reply.
    pub fn error_message(&self) -> Option<String> {
        match self {
            TurnOutcome::RateLimited => Some(RATE_LIMIT_MESSAGE.to_string()),
            TurnOutcome::Failed(detail) => Some(format!("An error occurred: {}", detail)),
            _ => None,
        }
    }
}

pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    search: Arc<dyn SearchProvider>,
    decision: Arc<dyn SearchDecision>,
    generation: GenerationConfig,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
        decision: Arc<dyn SearchDecision>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            model,
            search,
            decision,
            generation,
        }
    }

    /// Runs the configured search decision for `user_text`.
    pub async fn needs_search(&self, user_text: &str) -> bool {
        let decision = self.decision.decide(user_text).await;
        debug!(decision, "Search decision");
        decision
    }

    /// Produces a reply for `user_text` given the history in `log`. The log is
    /// only read; see [`Orchestrator::exchange`] for recording.
    pub async fn respond(&self, log: &ConversationLog, user_text: &str) -> TurnOutcome {
        let search = self.needs_search(user_text).await;
        self.respond_decided(log, user_text, search).await
    }

    /// Like [`Orchestrator::respond`], with the search decision already made.
    /// Lets a caller report "searching" between the decision and the search.
    #[instrument(skip(self, log, user_text), fields(history = log.len()))]
    pub async fn respond_decided(
        &self,
        log: &ConversationLog,
        user_text: &str,
        searched_web: bool,
    ) -> TurnOutcome {
        let mut search_failure = None;
        let payload = if searched_web {
            info!("Performing a real-time web search");
            let results = self.search.search(user_text).await;
            if let SearchResult::Error(detail) = &results {
                warn!(%detail, "Continuing with search error as context");
                search_failure = Some(detail.clone());
            }
            augment(user_text, &results)
        } else {
            user_text.to_string()
        };

        let turns = log.with_pending(&payload);
        match self.model.generate(&turns, Some(&self.generation)).await {
            Ok(text) => {
                let reply = Reply { text, searched_web };
                match search_failure {
                    Some(detail) => TurnOutcome::SearchFailed { reply, detail },
                    None => TurnOutcome::Answered(reply),
                }
            }
            Err(e) if e.is_rate_limited() => {
                warn!("Language model rate limited, dropping turn");
                TurnOutcome::RateLimited
            }
            Err(e) => {
                error!(error = %e, "Language model call failed, dropping turn");
                TurnOutcome::Failed(e.to_string())
            }
        }
    }

    /// Runs [`Orchestrator::respond`] and records the original user text and
    /// the reply. Failed turns leave the log as it was.
    pub async fn exchange(&self, log: &mut ConversationLog, user_text: &str) -> TurnOutcome {
        let search = self.needs_search(user_text).await;
        self.exchange_decided(log, user_text, search).await
    }

    /// [`Orchestrator::exchange`] with the search decision already made.
    pub async fn exchange_decided(
        &self,
        log: &mut ConversationLog,
        user_text: &str,
        searched_web: bool,
    ) -> TurnOutcome {
        let outcome = self.respond_decided(log, user_text, searched_web).await;
        if let Some(reply) = outcome.reply() {
            log.record_exchange(user_text, reply.text.clone());
        }
        outcome
    }
}
