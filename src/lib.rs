pub mod augment;
pub mod chat;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod decision;
pub mod error;
pub mod llm_interaction;
pub mod orchestrator;
pub mod search;
pub mod web_server;

pub use config::{Config, DecisionStrategy};
pub use conversation::{ConversationLog, Role, Turn};
pub use error::{ConfigError, LlmError};
pub use llm_interaction::{GenerationConfig, LanguageModel};
pub use orchestrator::{Orchestrator, Reply, TurnOutcome};
pub use search::{SearchProvider, SearchResult};
