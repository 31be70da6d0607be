//! Offset to line/column conversion.
//!
//! Diagnostics carry 1-indexed line/column pairs while the scanner works in
//! byte offsets; `LineMap` does the translation.

/// Line map for efficient offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Starting offset of each line (`line_starts[0]` is always 0).
    line_starts: Vec<u32>,
}

impl LineMap {
    #[must_use]
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-indexed `(line, column)` for a byte offset. Offsets past the end of
    /// the source map to the last line.
    #[must_use]
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line_idx];
        (line_idx as u32 + 1, col + 1)
    }

    /// Byte offset of the start of a 1-indexed line, if it exists.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<u32> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line as usize - 1).copied()
    }

    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

/// Text of a 1-indexed line, without its trailing newline.
#[must_use]
pub fn line_text(source: &str, line: u32) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_one_indexed_positions() {
        let map = LineMap::build("ab\ncd\n\nef");
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(1), (1, 2));
        assert_eq!(map.line_col(3), (2, 1));
        assert_eq!(map.line_col(6), (3, 1));
        assert_eq!(map.line_col(7), (4, 1));
        assert_eq!(map.line_count(), 4);
    }

    #[test]
    fn line_start_is_one_indexed() {
        let map = LineMap::build("ab\ncd");
        assert_eq!(map.line_start(1), Some(0));
        assert_eq!(map.line_start(2), Some(3));
        assert_eq!(map.line_start(3), None);
        assert_eq!(map.line_start(0), None);
    }

    #[test]
    fn line_text_fetches_by_line_number() {
        assert_eq!(line_text("ab\ncd", 2), Some("cd"));
        assert_eq!(line_text("ab\ncd", 9), None);
    }
}
