//! Tolerant classifier for vendor SSE lines.
//!
//! The vendor has shipped two framings over time:
//!
//! ```text
//! event: message          data: {"status":...}
//! data: {"status":...}
//! ```
//!
//! Lines are trimmed before classification; the reader decides which `Data`
//! lines are significant based on the preceding `Event` line.

/// One classified line of an SSE body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Empty line: record separator.
    Blank,
    /// `data:` payload with the marker and surrounding whitespace removed.
    Data(&'a str),
    /// `event:` name.
    Event(&'a str),
    /// `:` comment, `id:`, `retry:` or anything unrecognised.
    Ignored,
}

/// Sentinel payload some upstream variants send instead of a DONE record.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classify a single line (with or without its trailing newline).
pub fn classify_sse_line(raw: &str) -> SseLine<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return SseLine::Blank;
    }
    if let Some(payload) = line.strip_prefix("data:") {
        return SseLine::Data(payload.trim());
    }
    if let Some(name) = line.strip_prefix("event:") {
        return SseLine::Event(name.trim());
    }
    SseLine::Ignored
}
