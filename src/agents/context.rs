//! Supplementary context rendering
//!
//! Folds search responses into the text block that the research and
//! insights directives quote.

use crate::search::{SearchResponse, ELLIPSIS};
use tracing::warn;

pub const CONTEXT_HEADER: &str = "SEARCH RESULTS:";

/// Characters of each preview quoted in the context block
pub const PREVIEW_EXCERPT_CHARS: usize = 300;

/// Render successful responses into one block. Failed responses are skipped.
pub fn render_search_context(responses: &[SearchResponse]) -> String {
    let mut output = format!("{CONTEXT_HEADER}\n\n");

    for (n, response) in responses.iter().enumerate() {
        if !response.success {
            warn!(
                query = %response.query,
                error = response.error_message.as_deref().unwrap_or("unknown"),
                "Leaving failed search out of the context"
            );
            continue;
        }

        if n > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "Search for '{}' found {} results:\n\n",
            response.query,
            response.results.len()
        ));

        for (i, result) in response.results.iter().enumerate() {
            output.push_str(&format!("[Result {}]\n", i + 1));
            output.push_str(&format!("Title: {}\n", result.title));
            output.push_str(&format!("URL: {}\n", result.url));
            output.push_str(&format!(
                "Published: {}\n",
                result.published_date.as_deref().unwrap_or("unknown")
            ));
            if let Some(preview) = &result.content_preview {
                output.push_str(&format!(
                    "Preview: {}{}\n",
                    char_prefix(preview, PREVIEW_EXCERPT_CHARS),
                    ELLIPSIS
                ));
            }
            output.push('\n');
        }
    }

    output
}

/// The first `max_chars` characters of the context, marked as cut when shortened
pub fn bounded_prefix(context: &str, max_chars: usize) -> String {
    let prefix = char_prefix(context, max_chars);
    if prefix.len() < context.len() {
        format!("{}{}", prefix, ELLIPSIS)
    } else {
        prefix.to_string()
    }
}

/// Number of `[Result n]` blocks in a rendered context
pub fn count_result_blocks(context: &str) -> usize {
    context.lines().filter(|l| l.starts_with("[Result ")).count()
}

fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
