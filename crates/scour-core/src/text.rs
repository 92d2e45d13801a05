//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes
//!
//! `LineIndex` answers repeated lookups against the same text in
//! `O(log lines)`.

// ============================================================================
// Indentation
// ============================================================================

/// Leading whitespace of the line containing `position`.
///
/// When that line is blank, the previous line's indentation is used.
pub fn detect_indentation(source: &str, position: usize) -> &str {
    if source.is_empty() || position > source.len() || !source.is_char_boundary(position) {
        return "";
    }

    let line_start = source[..position].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = source[position..]
        .find('\n')
        .map(|i| position + i)
        .unwrap_or(source.len());

    let line = &source[line_start..line_end];
    let indent = leading_whitespace(line);
    if !line.trim().is_empty() || line_start == 0 {
        return &source[line_start..line_start + indent.len()];
    }

    let prev_line_end = line_start - 1;
    let prev_line_start = source[..prev_line_end]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let prev_indent = leading_whitespace(&source[prev_line_start..prev_line_end]);
    &source[prev_line_start..prev_line_start + prev_indent.len()]
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

// ============================================================================
// Line Index
// ============================================================================

/// Precomputed line starts for one text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Index the line starts of `content`.
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { line_starts }
    }

    /// 1-indexed line and column of `offset` within `content`.
    ///
    /// `content` must be the text this index was built from.
    pub fn position(&self, content: &str, offset: usize) -> (u32, u32) {
        let offset = offset.min(content.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line_idx];
        let col = content
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line_idx as u32 + 1, col as u32 + 1)
    }
}

// ============================================================================
// Tests
// ============================================================================
