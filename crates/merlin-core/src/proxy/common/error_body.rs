/// Cap an upstream error body for logs and error messages, on char boundaries.
pub fn truncate_error_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
