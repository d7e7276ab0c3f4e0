//! Caps captured step output.

/// Maximum bytes kept per captured stream (1 MiB).
pub const MAX_CAPTURED_BYTES: usize = 1024 * 1024;

/// Accumulates output chunks up to a byte limit and counts what it drops.
///
/// Chunks past the limit are still accepted so the caller keeps draining the
/// pipe; a step blocked on a full pipe would otherwise never exit.
#[derive(Debug)]
pub struct OutputTruncator {
    limit: usize,
    kept: Vec<u8>,
    dropped: usize,
}

impl OutputTruncator {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            kept: Vec::new(),
            dropped: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.kept.len());
        let take = room.min(chunk.len());
        self.kept.extend_from_slice(&chunk[..take]);
        self.dropped += chunk.len() - take;
    }

    pub fn dropped_bytes(&self) -> usize {
        self.dropped
    }

    /// Decodes the kept bytes (lossily) and appends a marker if anything
    /// was dropped.
    pub fn finish(self) -> String {
        let mut text = String::from_utf8_lossy(&self.kept).into_owned();
        if self.dropped > 0 {
            if !text.ends_with('\n') && !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&format!("[output truncated: {} bytes dropped]", self.dropped));
        }
        text
    }
}

/// First non-empty line of `text`, for one-line summaries.
pub fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}
