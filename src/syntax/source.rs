//! Source text with a line index for location lookups and range extraction.

use super::span::Span;

/// One input file: its display name, its text and the byte offset of
/// every line start.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// Text covered by `span`. Out-of-range spans are clamped.
    pub fn slice(&self, span: Span) -> &str {
        let end = (span.end as usize).min(self.text.len());
        let start = (span.start as usize).min(end);
        self.text.get(start..end).unwrap_or("")
    }

    /// 1-based line and column (in characters) of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx] as usize;
        let end = (offset as usize).min(self.text.len());
        let col = self
            .text
            .get(line_start..end)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        (line_idx as u32 + 1, col as u32 + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_first_line() {
        let src = SourceFile::new("k.hpp", "struct A {};\nint x;\n");
        assert_eq!(src.line_col(0), (1, 1));
        assert_eq!(src.line_col(7), (1, 8));
    }

    #[test]
    fn test_line_col_later_lines() {
        let src = SourceFile::new("k.hpp", "a\nbb\nccc");
        assert_eq!(src.line_col(2), (2, 1));
        assert_eq!(src.line_col(3), (2, 2));
        assert_eq!(src.line_col(5), (3, 1));
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn test_slice_clamps() {
        let src = SourceFile::new("k.hpp", "hello");
        assert_eq!(src.slice(Span::new(1, 3)), "el");
        assert_eq!(src.slice(Span::new(3, 99)), "lo");
        assert_eq!(src.slice(Span::new(99, 120)), "");
    }
}
