use thiserror::Error;

/// Startup configuration problems. Any of these halts the process before it
/// accepts input.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing secret {0}: set it in the environment or in a .env file")]
    MissingSecret(&'static str),

    #[error("temperature must be within [0, 1], got {0}")]
    InvalidTemperature(f32),

    #[error("max output tokens must be greater than zero")]
    InvalidMaxOutputTokens,
}

/// Failures of a single language-model call.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Quota exhausted or HTTP 429.
    #[error("rate limited by the language model API")]
    RateLimited,

    #[error("language model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("language model returned no text")]
    EmptyResponse,
}

impl LlmError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_names_variable() {
        let err = ConfigError::MissingSecret("SERPER_API_KEY");
        assert!(err.to_string().contains("SERPER_API_KEY"));
    }

    #[test]
    fn test_rate_limited_detection() {
        assert!(LlmError::RateLimited.is_rate_limited());
        assert!(!LlmError::EmptyResponse.is_rate_limited());
        let api = LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!api.is_rate_limited());
        assert!(api.to_string().contains("500"));
    }
}
