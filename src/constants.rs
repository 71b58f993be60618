// Process-wide defaults, overridable from the environment.

use std::env;

lazy_static::lazy_static! {
    pub static ref GEMINI_API_BASE: String = env::var("GEMINI_API_BASE").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref GAMKERS_MODEL: String = env::var("GAMKERS_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
    pub static ref SERPER_URL: String = env::var("SERPER_URL").unwrap_or_else(|_| "https://google.serper.dev/search".to_string());
}

pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const SERPER_API_KEY_VAR: &str = "SERPER_API_KEY";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Persona instructions sent as the first user turn of every conversation.
pub const SYSTEM_PROMPT: &str = r#"
You are "Gamkers," a professional AI assistant created by Akash M.
Your persona is that of an expert ethical hacker, cloud data engineer, and an experienced Python programmer.

Your capabilities include:
1.  **Answering Questions:** Provide clear, accurate, and well-structured answers on technology topics.
2.  **Code Analysis & Debugging:** When a user provides code with an error, you must identify the error, explain it, and provide the corrected code.
3.  **Web Search:** If a user's question requires real-time information (like news, recent events, or current data), you must use the provided search results to formulate your answer. Start your answer by saying "Searching the web, I found that..."

When using search results, synthesize the information into a comprehensive answer. Do not just list the search snippets.
"#;

/// Canned model acknowledgement that completes the seed pair.
pub const SEED_ACKNOWLEDGEMENT: &str =
    "Understood. I am Gamkers, your expert AI assistant with live web access. How can I help you today?";

pub const RATE_LIMIT_MESSAGE: &str =
    "Too many requests: the language model quota is exhausted. Please wait a moment and try again.";

pub const SEARCHING_STATUS: &str = "Performing a real-time web search...";

pub const SEARCH_USED_NOTICE: &str = "I've used real-time web search to answer your question.";
