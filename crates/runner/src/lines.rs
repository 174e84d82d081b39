//! Line buffering for child process output
//!
//! Chunks arrive at arbitrary boundaries. A line is only released once its
//! terminating `\n` has been seen, so a line split across reads is emitted
//! once, whole. Bytes are buffered raw and decoded per line, which keeps
//! multi-byte characters intact across chunk boundaries.

#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completed.
    ///
    /// A trailing `\r` is stripped; blank lines are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let raw = &self.pending[start..end];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let text = String::from_utf8_lossy(raw);
            if !text.trim().is_empty() {
                lines.push(text.into_owned());
            }
            start = end + 1;
        }
        self.pending.drain(..start);

        lines
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop unterminated trailing content, returning how many bytes were lost
    pub fn finish(self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feed(chunks: &[&[u8]]) -> Vec<String> {
        let mut buffer = LineBuffer::new();
        chunks.iter().flat_map(|c| buffer.push(c)).collect()
    }

    #[test]
    fn test_split_line_emitted_once() {
        let lines = feed(&[b"Running 3 te", b"sts using 1 worker\n  ok 1\n"]);
        assert_eq!(lines, vec!["Running 3 tests using 1 worker", "  ok 1"]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let lines = feed(&[b"first\r\n\r\n   \nsecond\r", b"\n"]);
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_trailing_partial_discarded() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"done\nno newline"), vec!["done"]);
        assert_eq!(buffer.pending_len(), "no newline".len());
        assert_eq!(buffer.finish(), 10);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let text = "✅ Result: PASSED\n".as_bytes();
        let lines = feed(&[&text[..1], &text[1..2], &text[2..]]);
        assert_eq!(lines, vec!["✅ Result: PASSED"]);
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_lines(
            lines in proptest::collection::vec("[a-z✓❌ │├─:]{0,20}", 0..12),
            tail in "[a-z ]{0,8}",
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let mut text = lines.join("\n");
            if !lines.is_empty() {
                text.push('\n');
            }
            text.push_str(&tail);
            let bytes = text.as_bytes();

            let whole = feed(&[bytes]);

            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();
            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut prev = 0;
            for p in points {
                chunks.push(&bytes[prev..p]);
                prev = p;
            }
            chunks.push(&bytes[prev..]);

            prop_assert_eq!(feed(&chunks), whole);
        }
    }
}
