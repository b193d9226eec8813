use super::metrics::text_width;
use super::FontStyle;

/// Greedy word wrap against Helvetica metrics.
///
/// Words wider than `max_width` are broken at character boundaries. A line
/// only exceeds `max_width` when a single character does.
pub fn wrap_text(text: &str, max_width: f64, size: f64, style: FontStyle) -> Vec<String> {
    let fits = |s: &str| text_width(s, size, style) <= max_width;

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !fits(word) {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = split_word(word, &fits);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if fits(&candidate) {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_word(word: &str, fits: &impl Fn(&str) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for c in word.chars() {
        piece.push(c);
        if piece.chars().count() > 1 && !fits(&piece) {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_stays_on_one_line() {
        let lines = wrap_text("Replace bushing", 170.0, 11.0, FontStyle::Regular);
        assert_eq!(lines, vec!["Replace bushing"]);
    }

    #[test]
    fn test_whitespace_is_normalised() {
        let lines = wrap_text("  oil \n\t leak  ", 170.0, 11.0, FontStyle::Regular);
        assert_eq!(lines, vec!["oil leak"]);
    }

    #[test]
    fn test_blank_text_has_no_lines() {
        assert!(wrap_text("   ", 170.0, 11.0, FontStyle::Regular).is_empty());
    }

    #[test]
    fn test_breaks_between_words() {
        // Each "aaaa" is 4 * 556 / 1000 * 10pt = 22.24pt, about 7.85mm
        let lines = wrap_text("aaaa aaaa aaaa", 17.0, 10.0, FontStyle::Regular);
        assert_eq!(lines, vec!["aaaa aaaa", "aaaa"]);
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 30.0, 10.0, FontStyle::Regular);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, 10.0, FontStyle::Regular) <= 30.0);
        }
    }

    #[test]
    fn test_long_word_after_short_word_starts_new_line() {
        let long = "y".repeat(80);
        let text = format!("ok {}", long);
        let lines = wrap_text(&text, 30.0, 10.0, FontStyle::Regular);
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1..].concat(), long);
    }
}
