//! Source rewriting with out-of-order edits.
//!
//! Edits are recorded against the immutable original document as a list of
//! [`TextEdit`] operations. Applying them is a two-pass process:
//!
//! 1. every edit boundary splits the source into fragments addressed by their
//!    original offsets, and the edits are replayed in recording order against
//!    those fragments (content replacement, removal, reordering, and text
//!    attached to the left or right side of a boundary);
//! 2. the fragments are concatenated in their final order while a source map
//!    is collected for every fragment that still carries original text.
//!
//! Offsets are never shifted mid-edit, so edits recorded late can still refer
//! to positions of the original source.

use vize_carton::source_map::{LineIndex, Mapping, SourceMap, SourceMapBuilder};

/// Which side of a boundary inserted text attaches to.
///
/// Text attached to the left belongs to the fragment that ends at the offset
/// and travels with it when that fragment is moved. Text attached to the right
/// belongs to the fragment that starts at the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertSide {
    AppendLeft,
    PrependLeft,
    AppendRight,
    PrependRight,
}

/// A single recorded edit in original-source coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Remove {
        start: usize,
        end: usize,
    },
    Overwrite {
        start: usize,
        end: usize,
        content: String,
    },
    Move {
        start: usize,
        end: usize,
        target: usize,
    },
    Insert {
        offset: usize,
        content: String,
        side: InsertSide,
    },
    /// Text placed before everything else in the output.
    Prepend {
        content: String,
    },
}

impl TextEdit {
    /// Offsets at which this edit splits the source.
    fn boundaries(&self) -> [Option<usize>; 3] {
        match self {
            Self::Remove { start, end } | Self::Overwrite { start, end, .. } => {
                [Some(*start), Some(*end), None]
            }
            Self::Move { start, end, target } => [Some(*start), Some(*end), Some(*target)],
            Self::Insert { offset, .. } => [Some(*offset), None, None],
            Self::Prepend { .. } => [None, None, None],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    #[error("edit range {start}..{end} is outside of the source (length {len})")]
    OutOfRange { start: usize, end: usize, len: usize },

    #[error("cannot overwrite an empty range at {0}")]
    EmptyOverwrite(usize),

    #[error("edit at {offset} splits the already overwritten range {start}..{end}")]
    SplitOverwritten {
        offset: usize,
        start: usize,
        end: usize,
    },

    #[error("cannot overwrite {start}..{end} across a moved fragment")]
    NonContiguousOverwrite { start: usize, end: usize },

    #[error("cannot move {start}..{end} into itself at {target}")]
    MoveIntoSelf {
        start: usize,
        end: usize,
        target: usize,
    },
}

/// Result of applying all edits.
#[derive(Debug, Clone)]
pub struct RewriteOutput {
    pub code: String,
    pub map: Option<SourceMap>,
}

/// Edit buffer over an immutable source text.
#[derive(Debug)]
pub struct SourceRewriter<'s> {
    source: &'s str,
    edits: Vec<TextEdit>,
}

impl<'s> SourceRewriter<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// The original source text.
    #[inline]
    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Original text of `start..end`.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or("")
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn remove(&mut self, start: usize, end: usize) {
        if start < end {
            self.edits.push(TextEdit::Remove { start, end });
        }
    }

    pub fn overwrite(&mut self, start: usize, end: usize, content: impl Into<String>) {
        self.edits.push(TextEdit::Overwrite {
            start,
            end,
            content: content.into(),
        });
    }

    /// Move `start..end` so that it is emitted right before the fragment that
    /// originally started at `target`.
    pub fn move_range(&mut self, start: usize, end: usize, target: usize) {
        if start < end {
            self.edits.push(TextEdit::Move { start, end, target });
        }
    }

    pub fn append_left(&mut self, offset: usize, content: impl Into<String>) {
        self.insert(offset, content, InsertSide::AppendLeft);
    }

    pub fn prepend_left(&mut self, offset: usize, content: impl Into<String>) {
        self.insert(offset, content, InsertSide::PrependLeft);
    }

    pub fn append_right(&mut self, offset: usize, content: impl Into<String>) {
        self.insert(offset, content, InsertSide::AppendRight);
    }

    pub fn prepend_right(&mut self, offset: usize, content: impl Into<String>) {
        self.insert(offset, content, InsertSide::PrependRight);
    }

    pub fn prepend(&mut self, content: impl Into<String>) {
        self.edits.push(TextEdit::Prepend {
            content: content.into(),
        });
    }

    fn insert(&mut self, offset: usize, content: impl Into<String>, side: InsertSide) {
        let content = content.into();
        if !content.is_empty() {
            self.edits.push(TextEdit::Insert {
                offset,
                content,
                side,
            });
        }
    }

    /// Apply all edits and return the rewritten text.
    pub fn apply(&self) -> Result<String, RewriteError> {
        Ok(self.resolve()?.concat(None).code)
    }

    /// Apply all edits, additionally producing a source map.
    pub fn apply_with_map(&self, source_name: &str) -> Result<RewriteOutput, RewriteError> {
        Ok(self.resolve()?.concat(Some(source_name)))
    }

    /// First pass: split into fragments and replay every edit against them.
    fn resolve(&self) -> Result<Fragments<'s>, RewriteError> {
        let len = self.source.len();
        self.validate()?;

        let mut points: Vec<usize> = self
            .edits
            .iter()
            .flat_map(|e| e.boundaries())
            .flatten()
            .chain([0, len])
            .collect();
        points.sort_unstable();
        points.dedup();

        let chunks: Vec<Chunk> = points
            .windows(2)
            .filter(|w| w[0] < w[1])
            .map(|w| Chunk {
                start: w[0],
                end: w[1],
                content: None,
                intro: String::new(),
                outro: String::new(),
            })
            .collect();

        let mut fragments = Fragments {
            source: self.source,
            order: (0..chunks.len()).collect(),
            chunks,
            intro: String::new(),
            outro: String::new(),
        };

        for edit in &self.edits {
            fragments.replay(edit)?;
        }

        Ok(fragments)
    }

    fn validate(&self) -> Result<(), RewriteError> {
        let len = self.source.len();
        let mut overwritten: Vec<(usize, usize)> = Vec::new();

        for edit in &self.edits {
            for offset in edit.boundaries().into_iter().flatten() {
                if offset > len {
                    return Err(RewriteError::OutOfRange {
                        start: offset,
                        end: offset,
                        len,
                    });
                }
                if let Some(&(start, end)) = overwritten
                    .iter()
                    .find(|(start, end)| *start < offset && offset < *end)
                {
                    return Err(RewriteError::SplitOverwritten { offset, start, end });
                }
            }

            match edit {
                TextEdit::Remove { start, end } if start > end => {
                    return Err(RewriteError::OutOfRange {
                        start: *start,
                        end: *end,
                        len,
                    });
                }
                TextEdit::Overwrite { start, end, .. } => {
                    if start >= end {
                        return Err(RewriteError::EmptyOverwrite(*start));
                    }
                    overwritten.push((*start, *end));
                }
                TextEdit::Move { start, end, target } if start < target && target < end => {
                    return Err(RewriteError::MoveIntoSelf {
                        start: *start,
                        end: *end,
                        target: *target,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Chunk {
    start: usize,
    end: usize,
    /// Replacement content; `None` keeps the original text.
    content: Option<String>,
    intro: String,
    outro: String,
}

impl Chunk {
    fn clear(&mut self, content: String) {
        self.content = Some(content);
        self.intro.clear();
        self.outro.clear();
    }
}

/// Source split at every edit boundary, in current output order.
struct Fragments<'s> {
    source: &'s str,
    chunks: Vec<Chunk>,
    /// Indices into `chunks` in output order.
    order: Vec<usize>,
    intro: String,
    outro: String,
}

impl<'s> Fragments<'s> {
    fn by_start(&self, offset: usize) -> Option<usize> {
        self.chunks.binary_search_by_key(&offset, |c| c.start).ok()
    }

    fn by_end(&self, offset: usize) -> Option<usize> {
        self.chunks.binary_search_by_key(&offset, |c| c.end).ok()
    }

    /// Chunk indices covering `start..end` in original order.
    fn covering(&self, start: usize, end: usize) -> std::ops::Range<usize> {
        match (self.by_start(start), self.by_end(end)) {
            (Some(first), Some(last)) if first <= last => first..last + 1,
            _ => 0..0,
        }
    }

    fn replay(&mut self, edit: &TextEdit) -> Result<(), RewriteError> {
        match edit {
            TextEdit::Remove { start, end } => {
                for idx in self.covering(*start, *end) {
                    self.chunks[idx].clear(String::new());
                }
            }
            TextEdit::Overwrite {
                start,
                end,
                content,
            } => {
                let range = self.covering(*start, *end);
                let positions: Vec<usize> = range
                    .clone()
                    .filter_map(|idx| self.order.iter().position(|&o| o == idx))
                    .collect();
                if positions.windows(2).any(|w| w[1] != w[0] + 1) {
                    return Err(RewriteError::NonContiguousOverwrite {
                        start: *start,
                        end: *end,
                    });
                }
                let first = range.start;
                for idx in range {
                    let replacement = if idx == first {
                        content.clone()
                    } else {
                        String::new()
                    };
                    self.chunks[idx].clear(replacement);
                }
            }
            TextEdit::Move { start, end, target } => {
                let moved: Vec<usize> = self
                    .order
                    .iter()
                    .copied()
                    .filter(|&idx| self.chunks[idx].start >= *start && self.chunks[idx].end <= *end)
                    .collect();
                if moved.is_empty() {
                    return Ok(());
                }
                self.order.retain(|idx| !moved.contains(idx));
                let insert_at = match self.by_start(*target) {
                    Some(target_idx) => self
                        .order
                        .iter()
                        .position(|&o| o == target_idx)
                        .unwrap_or(self.order.len()),
                    None => self.order.len(),
                };
                self.order.splice(insert_at..insert_at, moved);
            }
            TextEdit::Insert {
                offset,
                content,
                side,
            } => match side {
                InsertSide::AppendLeft => match self.by_end(*offset) {
                    Some(idx) => self.chunks[idx].outro.push_str(content),
                    None => self.intro.push_str(content),
                },
                InsertSide::PrependLeft => match self.by_end(*offset) {
                    Some(idx) => self.chunks[idx].outro.insert_str(0, content),
                    None => self.intro.insert_str(0, content),
                },
                InsertSide::AppendRight => match self.by_start(*offset) {
                    Some(idx) => self.chunks[idx].intro.push_str(content),
                    None => self.outro.push_str(content),
                },
                InsertSide::PrependRight => match self.by_start(*offset) {
                    Some(idx) => self.chunks[idx].intro.insert_str(0, content),
                    None => self.outro.insert_str(0, content),
                },
            },
            TextEdit::Prepend { content } => {
                self.intro.insert_str(0, content);
            }
        }
        Ok(())
    }

    /// Second pass: concatenate fragments, optionally collecting mappings.
    fn concat(self, source_name: Option<&str>) -> RewriteOutput {
        let mut out = Output::new(self.source, source_name.is_some());

        out.push_generated(&self.intro);
        for &idx in &self.order {
            let chunk = &self.chunks[idx];
            out.push_generated(&chunk.intro);
            match &chunk.content {
                None => out.push_original(chunk.start, chunk.end),
                Some(content) => out.push_edited(content, chunk.start),
            }
            out.push_generated(&chunk.outro);
        }
        out.push_generated(&self.outro);

        let map = source_name.map(|name| out.map.build(Some(name), name, self.source));
        RewriteOutput {
            code: out.code,
            map,
        }
    }
}

/// Output buffer tracking the generated line/column.
struct Output<'s> {
    source: &'s str,
    code: String,
    line: u32,
    column: u32,
    index: Option<LineIndex>,
    map: SourceMapBuilder,
}

impl<'s> Output<'s> {
    fn new(source: &'s str, with_map: bool) -> Self {
        Self {
            source,
            code: String::with_capacity(source.len()),
            line: 0,
            column: 0,
            index: with_map.then(|| LineIndex::new(source)),
            map: SourceMapBuilder::new(),
        }
    }

    fn advance(&mut self, text: &str) {
        for segment in text.split_inclusive('\n') {
            if segment.ends_with('\n') {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += segment.encode_utf16().count() as u32;
            }
        }
        self.code.push_str(text);
    }

    fn mark(&mut self, original_offset: usize) {
        if let Some(index) = &self.index {
            let (original_line, original_column) = index.line_col(self.source, original_offset);
            self.map.add_mapping(Mapping {
                generated_line: self.line,
                generated_column: self.column,
                original_line,
                original_column,
            });
        }
    }

    fn push_generated(&mut self, text: &str) {
        if !text.is_empty() {
            self.advance(text);
        }
    }

    fn push_edited(&mut self, content: &str, original_start: usize) {
        if !content.is_empty() {
            self.mark(original_start);
            self.advance(content);
        }
    }

    /// Original text keeps one mapping per line start.
    fn push_original(&mut self, start: usize, end: usize) {
        let text = &self.source[start..end];
        let mut offset = start;
        for line in text.split_inclusive('\n') {
            if line != "\n" {
                self.mark(offset);
            }
            self.advance(line);
            offset += line.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edits_is_identity() {
        let s = SourceRewriter::new("const a = 1\n");
        assert_eq!(s.apply().unwrap(), "const a = 1\n");
    }

    #[test]
    fn test_remove_and_overwrite() {
        let mut s = SourceRewriter::new("const a = defineProps()\nfoo()\n");
        s.overwrite(10, 23, "__props");
        s.remove(24, 30);
        assert_eq!(s.apply().unwrap(), "const a = __props\n");
    }

    #[test]
    fn test_move_to_start_keeps_call_order() {
        let src = "<script setup>\na()\nimport x from 'x'\nimport y from 'y'\n</script>";
        let mut s = SourceRewriter::new(src);
        let x = src.find("import x").unwrap();
        let y = src.find("import y").unwrap();
        let close = src.find("</script>").unwrap();
        s.move_range(x, y, 0);
        s.move_range(y, close, 0);
        s.remove(0, 15);
        s.remove(close, src.len());
        assert_eq!(
            s.apply().unwrap(),
            "import x from 'x'\nimport y from 'y'\na()\n"
        );
    }

    #[test]
    fn test_left_and_right_inserts() {
        let mut s = SourceRewriter::new("abc");
        s.append_left(1, "[L1]");
        s.prepend_left(1, "[L0]");
        s.append_right(1, "[R0]");
        s.prepend_right(1, "[R-1]");
        s.prepend("^");
        s.append_right(3, "$");
        assert_eq!(s.apply().unwrap(), "^a[L0][L1][R-1][R0]bc$");
    }

    #[test]
    fn test_left_insert_travels_with_moved_fragment() {
        let mut s = SourceRewriter::new("aaa bbb");
        s.append_left(7, " // tail of b");
        s.move_range(4, 7, 0);
        assert_eq!(s.apply().unwrap(), "bbb // tail of baaa ");
    }

    #[test]
    fn test_remove_clears_previous_inserts_inside() {
        let mut s = SourceRewriter::new("keep drop keep");
        s.append_left(9, "!");
        s.remove(5, 10);
        assert_eq!(s.apply().unwrap(), "keep keep");
    }

    #[test]
    fn test_remove_before_insert_keeps_insert() {
        let mut s = SourceRewriter::new("<tag>body</tag>");
        s.remove(0, 5);
        s.remove(9, 15);
        s.prepend_left(5, "head{");
        s.append_right(9, "}");
        assert_eq!(s.apply().unwrap(), "head{body}");
    }

    #[test]
    fn test_splitting_overwritten_range_fails() {
        let mut s = SourceRewriter::new("abcdef");
        s.overwrite(1, 5, "X");
        s.append_left(3, "Y");
        assert_eq!(
            s.apply(),
            Err(RewriteError::SplitOverwritten {
                offset: 3,
                start: 1,
                end: 5
            })
        );
    }

    #[test]
    fn test_split_before_overwrite_is_allowed() {
        let mut s = SourceRewriter::new("abcdef");
        s.append_left(3, "Y");
        s.overwrite(1, 5, "X");
        assert_eq!(s.apply().unwrap(), "aXf");
    }

    #[test]
    fn test_out_of_range() {
        let mut s = SourceRewriter::new("abc");
        s.remove(1, 10);
        assert!(matches!(s.apply(), Err(RewriteError::OutOfRange { .. })));
    }

    #[test]
    fn test_source_map_tracks_moved_lines() {
        let src = "a()\nimport x from 'x'\n";
        let mut s = SourceRewriter::new(src);
        s.move_range(4, src.len(), 0);
        let out = s.apply_with_map("App.vue").unwrap();
        assert_eq!(out.code, "import x from 'x'\na()\n");

        let map = out.map.unwrap();
        assert_eq!(map.sources, vec!["App.vue".to_string()]);
        let lines = map.decoded_mappings();
        // generated line 0 comes from original line 1, generated line 1 from line 0
        assert_eq!(lines[0], vec![(0, 1, 0)]);
        assert_eq!(lines[1], vec![(0, 0, 0)]);
    }

    #[test]
    fn test_source_map_skips_generated_text() {
        let mut s = SourceRewriter::new("x\n");
        s.prepend("// header\n");
        let out = s.apply_with_map("a.js").unwrap();
        let lines = out.map.unwrap().decoded_mappings();
        assert!(lines[0].is_empty());
        assert_eq!(lines[1], vec![(0, 0, 0)]);
    }

    #[test]
    fn test_edit_list_is_recorded() {
        let mut s = SourceRewriter::new("abc");
        s.remove(0, 1);
        s.append_right(1, "");
        assert_eq!(s.edits(), &[TextEdit::Remove { start: 0, end: 1 }]);
        assert_eq!(s.slice(1, 3), "bc");
    }
}
