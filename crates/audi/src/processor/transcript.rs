use std::path::Path;

/// Characters of a transcript kept as the chunk preview.
pub const PREVIEW_LIMIT: usize = 400;

const TRUNCATION_MARKER: &str = "...";

/// Loads a short transcript prefix for display, appending `...` when the
/// file holds more than `limit` characters.
pub async fn read_preview(path: &Path, limit: usize) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(truncate_preview(&text, limit))
}

fn truncate_preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
