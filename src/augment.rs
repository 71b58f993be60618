use crate::search::SearchResult;

/// Builds the composite prompt that stands in for the user's query when a
/// search ran. The original query is always embedded verbatim.
pub fn augment(original_query: &str, results: &SearchResult) -> String {
    let rendered = match results {
        SearchResult::Results(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        // JSON-encode the error text so it reads the same as a result payload
        SearchResult::Error(detail) => {
            serde_json::to_string(detail).unwrap_or_else(|_| detail.clone())
        }
    };

    format!(
        "Based on the following web search results, please provide a comprehensive answer to the user's original query.\n\n\
        **Search Results:**\n{}\n\n\
        **User's Original Query:**\n{}\n",
        rendered, original_query
    )
}
