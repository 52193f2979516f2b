//! Minimal word wrapping for help text: whitespace collapsing, greedy
//! filling, and hard breaks for words longer than a whole line.

/// Wrap `text` into lines of at most `width` characters.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let mut word = word;
        loop {
            let word_len = word.chars().count();
            let sep = usize::from(current_len > 0);
            if current_len + sep + word_len <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_len += sep + word_len;
                break;
            }
            if current_len == 0 {
                let (head, tail) = split_at_chars(word, width);
                lines.push(head.to_string());
                word = tail;
                if word.is_empty() {
                    break;
                }
                continue;
            }
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap `text` to `width` total columns (indent included) and glue the
/// lines back together with the given indents.
pub(crate) fn fill(text: &str, width: usize, initial_indent: &str, subsequent_indent: &str) -> String {
    let body_width = width
        .saturating_sub(subsequent_indent.chars().count())
        .max(1);
    wrap(text, body_width)
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let indent = if i == 0 { initial_indent } else { subsequent_indent };
            format!("{indent}{line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_at_chars(word: &str, width: usize) -> (&str, &str) {
    let mut end = word.len();
    for (count, (idx, _)) in word.char_indices().enumerate() {
        if count == width {
            end = idx;
            break;
        }
    }
    word.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_greedy_fill() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 15);
        assert_eq!(lines, ["the quick brown", "fox jumps over", "the lazy dog"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        let lines = wrap("a\tb\n  c", 80);
        assert_eq!(lines, ["a b c"]);
    }

    #[test]
    fn test_wrap_breaks_overlong_words() {
        let lines = wrap("aaaaaaaaaa bb", 4);
        assert_eq!(lines, ["aaaa", "aaaa", "aa", "bb"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap("", 10).is_empty());
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_fill_applies_indents() {
        let filled = fill("one two three four", 12, "  ", "  ");
        assert_eq!(filled, "  one two\n  three four");
    }
}
