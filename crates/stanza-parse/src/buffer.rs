//! Accumulation of content between structural events.

/// Collects content chunks until the next `enter` or `leave` asks for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBuffer {
    text: String,
    chunks: usize,
}

impl ContentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are dropped.
    pub fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.text.push_str(chunk);
        self.chunks += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.chunks == 0
    }

    /// Whether the buffer holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Take the accumulated text, leaving the buffer empty.
    pub fn flush(&mut self) -> String {
        self.chunks = 0;
        std::mem::take(&mut self.text)
    }

    pub fn clear(&mut self) {
        self.chunks = 0;
        self.text.clear();
    }
}
