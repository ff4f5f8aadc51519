use unicode_segmentation::UnicodeSegmentation;

use super::span::Span;

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub(crate) fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    let left = text[..byte_idx].to_string();
    let right = text[byte_idx..].to_string();
    (left, right)
}

/// Substring by character offsets, clamped to the text.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}

pub(crate) fn insert_str_at(text: &mut String, offset: usize, value: &str) {
    let byte_idx = char_to_byte_idx(text, offset);
    text.insert_str(byte_idx, value);
}

pub(crate) fn remove_chars(text: &mut String, offset: usize, count: usize) -> String {
    let start = char_to_byte_idx(text, offset);
    let end = char_to_byte_idx(text, offset + count);
    if start >= end {
        return String::new();
    }
    text.drain(start..end).collect()
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Length in chars of the grapheme cluster starting at `offset`.
pub(crate) fn grapheme_len_at(text: &str, offset: usize) -> usize {
    let byte_idx = char_to_byte_idx(text, offset);
    text[byte_idx..]
        .graphemes(true)
        .next()
        .map(|cluster| cluster.chars().count())
        .unwrap_or(0)
}

/// Length, in scalar values, of the grapheme cluster ending at `offset`.
pub(crate) fn grapheme_len_before(text: &str, offset: usize) -> usize {
    let byte_idx = char_to_byte_idx(text, offset);
    text[..byte_idx]
        .graphemes(true)
        .next_back()
        .map(|cluster| cluster.chars().count())
        .unwrap_or(0)
}

pub(crate) fn is_letter_or_number(ch: char) -> bool {
    ch.is_alphanumeric()
}

/// One logical character of the document, flattened out of its span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub ch: char,
    pub placeholder: bool,
}

pub(crate) fn document_cells(spans: &[Span]) -> Vec<Cell> {
    let mut cells = Vec::new();
    for span in spans {
        let placeholder = span.is_placeholder();
        cells.extend(span.text().chars().map(|ch| Cell { ch, placeholder }));
    }
    cells
}

fn is_plain_space(cell: Cell) -> bool {
    cell.ch == ' ' && !cell.placeholder
}

/// Caret target of a word jump to the left.
///
/// A single non-word character next to the caret is one step. Otherwise
/// leading spaces are skipped and the jump stops at the next non-word
/// character; a placeholder always ends the run.
pub(crate) fn left_word_position(cells: &[Cell], caret: usize) -> usize {
    let caret = caret.min(cells.len());
    let mut offset = 0;
    let mut jump_space = true;
    for idx in (0..caret).rev() {
        let cell = cells[idx];
        if cell.ch != ' ' || cell.placeholder {
            jump_space = false;
        }
        if idx + 1 == caret && !(is_letter_or_number(cell.ch) || is_plain_space(cell)) {
            return caret - 1;
        }
        if !jump_space && !is_letter_or_number(cell.ch) {
            return caret - offset;
        }
        offset += 1;
    }
    caret - offset
}

pub(crate) fn right_word_position(cells: &[Cell], caret: usize) -> usize {
    let caret = caret.min(cells.len());
    let mut offset = 0;
    let mut jump_space = false;
    for (idx, cell) in cells.iter().enumerate().skip(caret) {
        if is_plain_space(*cell) {
            jump_space = true;
            offset += 1;
            continue;
        }
        if idx == caret && !is_letter_or_number(cell.ch) {
            return caret + 1;
        }
        if jump_space || !is_letter_or_number(cell.ch) {
            return caret + offset;
        }
        offset += 1;
    }
    caret + offset
}

pub(crate) fn paragraph_begin_position(cells: &[Cell], caret: usize) -> usize {
    let caret = caret.min(cells.len());
    (0..caret)
        .rev()
        .find(|idx| cells[*idx].ch == '\n')
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

pub(crate) fn paragraph_end_position(cells: &[Cell], caret: usize) -> usize {
    let caret = caret.min(cells.len());
    (caret..cells.len())
        .find(|idx| cells[*idx].ch == '\n')
        .unwrap_or(cells.len())
}
