use unicode_width::UnicodeWidthChar;

/// Splits `text` into display rows no wider than `width` columns. Explicit
/// newlines always start a new row.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut used = 0usize;
    for ch in text.chars() {
        match ch {
            '\r' => continue,
            '\n' => {
                rows.push(String::new());
                used = 0;
                continue;
            }
            _ => {}
        }
        let ch_width = char_display_width(ch);
        if used + ch_width > width && used > 0 {
            rows.push(String::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        used += ch_width;
    }
    rows
}

pub fn cursor_row_col(input: &str, cursor_byte: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let cursor_byte = clamp_to_char_boundary_left(input, cursor_byte);
    let mut row = 0usize;
    let mut col = 0usize;

    for ch in input[..cursor_byte].chars() {
        if ch == '\r' {
            continue;
        }
        if ch == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        let ch_width = char_display_width(ch);
        if col + ch_width > width && col > 0 {
            row += 1;
            col = 0;
        }
        col += ch_width;
    }

    if col >= width {
        row += 1;
        col = 0;
    }
    (row, col)
}

pub fn truncate_to_display_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

pub fn clamp_to_char_boundary_left(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

pub fn prev_char_boundary(input: &str, cursor: usize) -> usize {
    let cursor = clamp_to_char_boundary_left(input, cursor);
    input[..cursor]
        .char_indices()
        .next_back()
        .map_or(0, |(idx, _)| idx)
}

pub fn next_char_boundary(input: &str, cursor: usize) -> usize {
    let cursor = clamp_to_char_boundary_left(input, cursor);
    input[cursor..]
        .chars()
        .next()
        .map_or(input.len(), |ch| cursor + ch.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lines_breaks_on_width_and_newlines() {
        assert_eq!(wrap_lines("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_lines("ab\ncd", 10), vec!["ab", "cd"]);
        assert_eq!(wrap_lines("", 10), vec![""]);
        assert_eq!(wrap_lines("abcdefghij", 3).len(), 4);
    }

    #[test]
    fn test_wide_characters_count_double() {
        assert_eq!(display_width("日本"), 4);
        assert_eq!(wrap_lines("日本語", 4), vec!["日本", "語"]);
        assert_eq!(truncate_to_display_width("日本語", 5), "日本");
    }

    #[test]
    fn test_cursor_row_col_wraps() {
        assert_eq!(cursor_row_col("abcdef", 2, 4), (0, 2));
        assert_eq!(cursor_row_col("abcdef", 5, 4), (1, 1));
        assert_eq!(cursor_row_col("abcd", 4, 4), (1, 0));
    }

    #[test]
    fn test_char_boundaries() {
        let text = "añb";
        assert_eq!(next_char_boundary(text, 1), 3);
        assert_eq!(prev_char_boundary(text, 3), 1);
        assert_eq!(prev_char_boundary(text, 2), 0);
        assert_eq!(next_char_boundary(text, 4), 4);
        assert_eq!(clamp_to_char_boundary_left(text, 2), 1);
    }
}
