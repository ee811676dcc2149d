//! Positional text edits over an immutable original.
//!
//! Edits are half-open byte ranges of the original text with replacement
//! strings. Ranges must not overlap; overwriting an identical range
//! replaces the earlier replacement. Because every edit is addressed in
//! original coordinates, the order in which edits are recorded never
//! changes the rendered output.

use crate::error::{RedirectError, Result};
use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Edit {
    end: usize,
    replacement: String,
}

/// Set of non-overlapping replacements against `original`.
#[derive(Debug, Clone)]
pub struct EditBuffer<'s> {
    original: &'s str,
    /// start offset → edit
    edits: BTreeMap<usize, Edit>,
}

/// Final text plus a map back to the original.
#[derive(Debug)]
pub struct RenderedSource {
    pub code: String,
    pub map: SourceMap,
}

impl<'s> EditBuffer<'s> {
    pub fn new(original: &'s str) -> Self {
        Self {
            original,
            edits: BTreeMap::new(),
        }
    }

    pub fn original(&self) -> &'s str {
        self.original
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Replace `start..end` of the original with `replacement`.
    ///
    /// # Errors
    ///
    /// - [`RedirectError::EditOutOfBounds`] if the range is inverted, past the
    ///   end of the text, or splits a UTF-8 character
    /// - [`RedirectError::OverlappingEdit`] if the range intersects an
    ///   existing, different range
    pub fn overwrite(&mut self, start: usize, end: usize, replacement: impl Into<String>) -> Result<()> {
        let len = self.original.len();
        if start > end
            || end > len
            || !self.original.is_char_boundary(start)
            || !self.original.is_char_boundary(end)
        {
            return Err(RedirectError::EditOutOfBounds { start, end, len });
        }

        if let Some((&prev_start, prev)) = self.edits.range(..=start).next_back() {
            let same_range = prev_start == start && prev.end == end;
            if !same_range && (prev.end > start || prev_start == start) {
                return Err(RedirectError::OverlappingEdit {
                    start,
                    end,
                    other_start: prev_start,
                    other_end: prev.end,
                });
            }
        }
        if let Some((&next_start, next)) = self.edits.range(start + 1..).next() {
            if next_start < end {
                return Err(RedirectError::OverlappingEdit {
                    start,
                    end,
                    other_start: next_start,
                    other_end: next.end,
                });
            }
        }

        self.edits.insert(
            start,
            Edit {
                end,
                replacement: replacement.into(),
            },
        );
        Ok(())
    }

    /// Stitch original text and replacements left to right.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.original.len());
        let mut cursor = 0;
        for (&start, edit) in &self.edits {
            out.push_str(&self.original[cursor..start]);
            out.push_str(&edit.replacement);
            cursor = edit.end;
        }
        out.push_str(&self.original[cursor..]);
        out
    }

    /// Render the text and a high-resolution source map.
    ///
    /// Every unchanged character gets its own mapping; each replacement is
    /// mapped as a whole to the start of the range it replaced. The original
    /// text is embedded as the source content of `source_name`.
    pub fn render_with_map(&self, source_name: &str) -> RenderedSource {
        let mut builder = SourceMapBuilder::default();
        let source_id = builder.add_source_and_content(source_name, self.original);

        let mut code = String::with_capacity(self.original.len());
        let mut src = Position::default();
        let mut dst = Position::default();
        let mut cursor = 0;

        for (&start, edit) in &self.edits {
            for ch in self.original[cursor..start].chars() {
                if ch != '\n' {
                    builder.add_token(dst.line, dst.col, src.line, src.col, Some(source_id), None);
                }
                src.advance(ch);
                dst.advance(ch);
                code.push(ch);
            }

            if !edit.replacement.is_empty() {
                builder.add_token(dst.line, dst.col, src.line, src.col, Some(source_id), None);
            }
            for ch in edit.replacement.chars() {
                dst.advance(ch);
            }
            code.push_str(&edit.replacement);
            for ch in self.original[start..edit.end].chars() {
                src.advance(ch);
            }
            cursor = edit.end;
        }

        for ch in self.original[cursor..].chars() {
            if ch != '\n' {
                builder.add_token(dst.line, dst.col, src.line, src.col, Some(source_id), None);
            }
            src.advance(ch);
            dst.advance(ch);
            code.push(ch);
        }

        RenderedSource {
            code,
            map: builder.into_sourcemap(),
        }
    }
}

/// Line and UTF-16 column, as source maps count them.
#[derive(Debug, Default, Clone, Copy)]
struct Position {
    line: u32,
    col: u32,
}

impl Position {
    fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += ch.len_utf16() as u32;
        }
    }
}
