use tracing::warn;

use super::{generate_document, GenerationParams, TextGenerator};

pub const DEFAULT_TITLE: &str = "Generated Documentation";
pub const UNTITLED: &str = "Untitled Document";
const TITLE_CONTEXT_CHARS: usize = 2000;
const MAX_TITLE_CHARS: usize = 100;
const ELLIPSIS: &str = "...";

/// Ask the model for a short title. Never fails.
pub async fn generate_title(generator: &dyn TextGenerator, content: &str) -> String {
    if content.trim().is_empty() {
        return UNTITLED.to_string();
    }

    let excerpt: String = content.chars().take(TITLE_CONTEXT_CHARS).collect();
    let prompt = format!(
        "Generate a concise, descriptive title for the following document content:\n\n{}...\n\nTitle:",
        excerpt
    );

    match generate_document(generator, &prompt, &GenerationParams::title()).await {
        Ok(raw) => sanitize_title(&raw),
        Err(e) => {
            warn!("Title generation failed, using default title: {}", e);
            DEFAULT_TITLE.to_string()
        }
    }
}

/// Strip surrounding quotes and bound the length
pub fn sanitize_title(raw: &str) -> String {
    let title = raw
        .trim()
        .trim_start_matches(&['"', '\''][..])
        .trim_end_matches(&['"', '\''][..])
        .trim();

    if title.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    if title.chars().count() > MAX_TITLE_CHARS {
        let kept: String = title.chars().take(MAX_TITLE_CHARS - ELLIPSIS.len()).collect();
        format!("{}{}", kept.trim_end(), ELLIPSIS)
    } else {
        title.to_string()
    }
}
