//! System prompts

/// Prompt used when the web search tool is offered
pub const SEARCH_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. When asked questions, \
search for the latest information and provide comprehensive answers based on what you find.";

/// Prompt used when no tools are available
pub const PLAIN_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Web search is not \
available, so answer questions as accurately and comprehensively as you can from what you \
already know, and say so when information may be out of date.";

/// Pick the system prompt for the tools the model will be offered
pub fn system_prompt(has_tools: bool) -> &'static str {
    if has_tools {
        SEARCH_SYSTEM_PROMPT
    } else {
        PLAIN_SYSTEM_PROMPT
    }
}

/// First `max_chars` characters of `text`, for log previews
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
