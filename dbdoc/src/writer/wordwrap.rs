/// Greedy word-wrap over whitespace-split tokens. A comment's original line
/// breaks are always discarded and the text re-flowed; the fixed indent is
/// reproduced on every produced line.
pub struct WordWrap {
    max_length: usize,
    indent: usize,
}

impl WordWrap {
    pub fn new(max_length: usize, indent: usize) -> Self {
        WordWrap { max_length, indent }
    }

    pub fn wrap(&self, input: &str) -> String {
        let indent = " ".repeat(self.indent);
        let mut lines: Vec<String> = Vec::new();
        let mut line = indent.clone();
        let mut has_word = false;

        for word in input.split_whitespace() {
            if has_word && line.len() + 1 + word.len() >= self.max_length {
                lines.push(std::mem::replace(&mut line, indent.clone()));
                has_word = false;
            }
            if has_word {
                line.push(' ');
            }
            line.push_str(word);
            has_word = true;
        }

        lines.push(line);
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_stays_on_one_line() {
        let ww = WordWrap::new(80, 0);
        assert_eq!(ww.wrap("a few words"), "a few words");
    }

    #[test]
    fn ninety_chars_at_width_eighty_with_indent_two() {
        // 15 words of 5 chars = 90 chars of text including separators
        let words = vec!["abcde"; 15].join(" ");
        let ww = WordWrap::new(80, 2);
        let wrapped = ww.wrap(&words);

        let lines: Vec<&str> = wrapped.lines().collect();
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(line.len() <= 80, "line too long: {line:?}");
            assert!(line.starts_with("  "));
        }
    }

    #[test]
    fn reflows_existing_line_breaks() {
        let ww = WordWrap::new(80, 0);
        assert_eq!(ww.wrap("one\ntwo\n\nthree"), "one two three");
    }

    #[test]
    fn indent_counts_toward_the_width() {
        let ww = WordWrap::new(12, 4);
        let wrapped = ww.wrap("aa bb cc dd");
        for line in wrapped.lines() {
            assert!(line.len() <= 12);
            assert!(line.starts_with("    "));
        }
        assert!(wrapped.lines().count() >= 2);
    }

    #[test]
    fn overlong_word_is_not_split() {
        let ww = WordWrap::new(10, 0);
        let wrapped = ww.wrap("supercalifragilistic ok");
        assert_eq!(wrapped, "supercalifragilistic\nok");
    }
}
