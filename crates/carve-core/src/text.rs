//! Text model primitives: sizes, ranges, and line lookups.

pub use text_size::{TextRange, TextSize};

/// Pre-computed line start offsets for a particular text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    /// End of each line, excluding the line break.
    line_ends: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(128);
        let mut line_ends = Vec::with_capacity(128);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    line_ends.push(TextSize::from(i as u32));
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_starts.push(TextSize::from((i + 2) as u32));
                        i += 2;
                    } else {
                        line_starts.push(TextSize::from((i + 1) as u32));
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        line_ends.push(TextSize::from(text.len() as u32));

        Self {
            line_starts,
            line_ends,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// End of `line`, excluding its line break.
    #[inline]
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        self.line_ends.get(line as usize).copied()
    }

    /// End of `line` including its line break (the start of the next line, or
    /// the end of the text for the last line).
    pub fn line_end_including_break(&self, line: u32) -> Option<TextSize> {
        let _ = self.line_ends.get(line as usize)?;
        Some(self.line_start(line + 1).unwrap_or(self.text_len))
    }

    /// Zero-based line containing `offset`. Offsets past the end clamp to the
    /// last line.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        let offset = offset.min(self.text_len);
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        };
        idx as u32
    }

    /// Returns `true` if `offset` is exactly the first byte of some line.
    pub fn is_line_start(&self, offset: TextSize) -> bool {
        self.line_starts.binary_search(&offset).is_ok()
    }
}
