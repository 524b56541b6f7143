//! Pending edits and the applier that splices them into the source text.
//!
//! Analysis never mutates text. Every rule queues edits against byte
//! offsets of the original source; the applier sorts them once and builds
//! the rewritten kernel body in a single forward pass.

use crate::syntax::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    /// Replace `span` with the text.
    ReplaceRange,
    /// Insert the text at `span.start`.
    InsertBefore,
    /// Insert the text at `span.end`.
    InsertAfter,
    /// Replace the single byte at `span.start` (a brace or bracket).
    ReplaceSingleToken,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEdit {
    pub span: Span,
    pub text: String,
    pub mode: EditMode,
    /// Creation order within the kernel's queue.
    pub seq: u32,
}

impl PendingEdit {
    /// The offset the edit is anchored at.
    pub fn point(&self) -> u32 {
        match self.mode {
            EditMode::InsertAfter => self.span.end,
            _ => self.span.start,
        }
    }

    /// Tie-break class at a shared point: closing insertions, then opening
    /// insertions, then replacements.
    fn class(&self) -> u8 {
        match self.mode {
            EditMode::InsertAfter => 0,
            EditMode::InsertBefore => 1,
            EditMode::ReplaceRange | EditMode::ReplaceSingleToken => 2,
        }
    }

    /// The byte range this edit consumes (empty for insertions).
    fn consumed(&self) -> (u32, u32) {
        match self.mode {
            EditMode::ReplaceRange => (self.span.start, self.span.end),
            EditMode::ReplaceSingleToken => (self.span.start, self.span.start + 1),
            EditMode::InsertBefore | EditMode::InsertAfter => {
                let p = self.point();
                (p, p)
            }
        }
    }
}

/// The edits queued for one kernel, numbered in creation order.
#[derive(Clone, Debug, Default)]
pub struct EditQueue {
    edits: Vec<PendingEdit>,
    next_seq: u32,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, span: Span, text: String, mode: EditMode) {
        tracing::trace!(?mode, start = span.start, end = span.end, text = %text, "queue edit");
        self.edits.push(PendingEdit {
            span,
            text,
            mode,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.push(span, text.into(), EditMode::ReplaceRange);
    }

    /// Delete `span`. Empty spans queue nothing.
    pub fn remove(&mut self, span: Span) {
        if !span.is_empty() {
            self.push(span, String::new(), EditMode::ReplaceRange);
        }
    }

    pub fn insert_before(&mut self, at: u32, text: impl Into<String>) {
        self.push(Span::point(at), text.into(), EditMode::InsertBefore);
    }

    pub fn insert_after(&mut self, at: u32, text: impl Into<String>) {
        self.push(Span::point(at), text.into(), EditMode::InsertAfter);
    }

    pub fn replace_token(&mut self, at: u32, text: impl Into<String>) {
        self.push(
            Span::new(at, at + 1),
            text.into(),
            EditMode::ReplaceSingleToken,
        );
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEdit> {
        self.edits.iter()
    }

    pub fn into_edits(self) -> Vec<PendingEdit> {
        self.edits
    }
}

/// Apply `edits` to `text` and return the rewritten contents of `region`.
///
/// Edits are sorted by anchor point, then insertion class, then creation
/// order. Replacements must not overlap; one that starts inside text
/// already consumed is dropped, as is anything outside `region`.
pub fn apply_edits(text: &str, region: Span, mut edits: Vec<PendingEdit>) -> String {
    edits.sort_by_key(|e| (e.point(), e.class(), e.seq));

    let mut out = String::with_capacity(region.len() as usize);
    let mut cursor = region.start;
    for edit in &edits {
        let (start, end) = edit.consumed();
        if start < region.start || end > region.end {
            tracing::trace!(seq = edit.seq, start, end, "edit outside kernel body, skipped");
            continue;
        }
        if start < cursor {
            tracing::warn!(
                seq = edit.seq,
                start,
                end,
                cursor,
                text = %edit.text,
                "overlapping edit dropped"
            );
            continue;
        }
        out.push_str(slice(text, cursor, start));
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(slice(text, cursor, region.end));
    out
}

/// Widen `span` to its whole line when nothing else shares the line: the
/// leading blanks, trailing blanks and the line break go with it.
pub fn whole_line(text: &str, span: Span) -> Span {
    let bytes = text.as_bytes();
    let mut start = span.start as usize;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] != b'\n' {
        return span;
    }
    let mut end = span.end as usize;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t' | b'\r') {
        end += 1;
    }
    match bytes.get(end) {
        Some(b'\n') => Span::new(start as u32, end as u32 + 1),
        None => Span::new(start as u32, end as u32),
        Some(_) => span,
    }
}

fn slice(text: &str, start: u32, end: u32) -> &str {
    text.get(start as usize..end as usize).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(text: &str) -> Span {
        Span::new(0, text.len() as u32)
    }

    #[test]
    fn test_replacements_in_any_queue_order() {
        let text = "tc::uvec3 v = tc::uvec3{1, 2, 3};";
        let mut q = EditQueue::new();
        q.replace_token(23, "(");
        q.remove(Span::new(14, 18));
        q.replace_token(31, ")");
        q.remove(Span::new(0, 4));
        assert_eq!(apply_edits(text, whole(text), q.into_edits()), "uvec3 v = uvec3(1, 2, 3);");
    }

    #[test]
    fn test_same_point_insertions_keep_queue_order() {
        let text = "x";
        let mut q = EditQueue::new();
        q.insert_before(0, "bool( ");
        q.insert_before(0, "int( ");
        q.insert_after(1, " )");
        q.insert_after(1, " ]");
        assert_eq!(apply_edits(text, whole(text), q.into_edits()), "bool( int( x ) ]");
    }

    #[test]
    fn test_closing_before_opening_at_shared_point() {
        // `a` ends where `b` begins.
        let text = "ab";
        let mut q = EditQueue::new();
        q.insert_before(1, "<");
        q.insert_after(1, ">");
        assert_eq!(apply_edits(text, whole(text), q.into_edits()), "a><b");
    }

    #[test]
    fn test_insertion_before_replacement_at_same_start() {
        let text = "tc::x";
        let mut q = EditQueue::new();
        q.remove(Span::new(0, 4));
        q.insert_before(0, "uint( ");
        q.insert_after(5, " )");
        assert_eq!(apply_edits(text, whole(text), q.into_edits()), "uint( x )");
    }

    #[test]
    fn test_overlapping_replacement_dropped() {
        let text = "abcdef";
        let mut q = EditQueue::new();
        q.replace(Span::new(1, 4), "X");
        q.replace(Span::new(2, 5), "Y");
        q.insert_before(3, "!");
        assert_eq!(apply_edits(text, whole(text), q.into_edits()), "aXef");
    }

    #[test]
    fn test_region_clips_output_and_edits() {
        let text = "struct K { int x; };";
        let mut q = EditQueue::new();
        q.remove(Span::new(0, 6));
        q.replace(Span::new(11, 14), "uint");
        let interior = Span::new(10, 18);
        assert_eq!(apply_edits(text, interior, q.into_edits()), " uint x; ");
    }

    #[test]
    fn test_empty_removal_queues_nothing() {
        let mut q = EditQueue::new();
        q.remove(Span::point(3));
        assert!(q.is_empty());
    }

    #[test]
    fn test_whole_line_takes_indent_and_break() {
        let text = "{\n    int x;\n    int y;\n}";
        let x = Span::new(6, 12);
        assert_eq!(whole_line(text, x), Span::new(2, 13));
        let mut q = EditQueue::new();
        q.remove(whole_line(text, x));
        assert_eq!(apply_edits(text, whole(text), q.into_edits()), "{\n    int y;\n}");

        let crlf = "{\r\n  int x;  \r\n}";
        assert_eq!(whole_line(crlf, Span::new(5, 11)), Span::new(3, 15));
    }

    #[test]
    fn test_whole_line_keeps_shared_lines() {
        let text = "{ int x; int y; }";
        let x = Span::new(2, 8);
        assert_eq!(whole_line(text, x), x);
        let tail = "{\n  int x; int y;\n}";
        let x = Span::new(4, 10);
        assert_eq!(whole_line(tail, x), x);
    }

    #[test]
    fn test_sequence_numbers() {
        let mut q = EditQueue::new();
        q.insert_before(0, "a");
        q.replace(Span::new(0, 1), "b");
        let seqs: Vec<u32> = q.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(q.len(), 2);
    }
}
