/// Lexer position relative to Python string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    /// Inside a single-line literal opened with this quote.
    Str(char),
    /// Inside a triple-quoted block opened with this quote; dropped.
    Block(char),
    /// Inside a `#` comment; dropped up to the newline.
    Comment,
}

/// Remove `#` comments and triple-quoted blocks from Python source, then
/// trim trailing whitespace and drop blank lines. Quotes inside ordinary
/// string literals are left alone.
pub fn strip_comments(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut state = Scan::Code;
    let mut idx = 0;

    let triple_at = |idx: usize, quote: char| {
        chars.get(idx..idx + 3).is_some_and(|run| run.iter().all(|c| *c == quote))
    };

    while idx < chars.len() {
        let ch = chars[idx];
        match state {
            Scan::Code => match ch {
                '#' => state = Scan::Comment,
                '"' | '\'' if triple_at(idx, ch) => {
                    state = Scan::Block(ch);
                    idx += 3;
                    continue;
                }
                '"' | '\'' => {
                    state = Scan::Str(ch);
                    out.push(ch);
                }
                _ => out.push(ch),
            },
            Scan::Str(quote) => {
                out.push(ch);
                if ch == '\\' {
                    if let Some(next) = chars.get(idx + 1) {
                        out.push(*next);
                        idx += 2;
                        continue;
                    }
                } else if ch == quote || ch == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::Block(quote) => {
                if ch == '\\' {
                    idx += 2;
                    continue;
                }
                if triple_at(idx, quote) {
                    state = Scan::Code;
                    idx += 3;
                    continue;
                }
            }
            Scan::Comment => {
                if ch == '\n' {
                    state = Scan::Code;
                    out.push(ch);
                }
            }
        }
        idx += 1;
    }

    out.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_comment_and_blank_line_go() {
        assert_eq!(strip_comments("x = 1  # comment\n\ny = 2"), "x = 1\ny = 2");
    }

    #[test]
    fn hashes_inside_strings_survive() {
        let source = "s = \"a # b\"  # note\nt = 'it\\'s # fine'";
        assert_eq!(
            strip_comments(source),
            "s = \"a # b\"\nt = 'it\\'s # fine'"
        );
    }

    #[test]
    fn docstrings_are_removed_and_indentation_kept() {
        let source = "def f():\n    \"\"\"Doc.\n\n    More.\"\"\"\n    return 1\n";
        assert_eq!(strip_comments(source), "def f():\n    return 1");
    }

    #[test]
    fn single_quoted_blocks_are_removed() {
        let source = "'''\nheader\n'''\nimport os\n";
        assert_eq!(strip_comments(source), "import os");
    }

    #[test]
    fn triple_quotes_inside_strings_are_kept() {
        let source = "q = '\"\"\"'\n";
        assert_eq!(strip_comments(source), "q = '\"\"\"'");
    }

    #[test]
    fn empty_source_stays_empty() {
        assert_eq!(strip_comments(""), "");
        assert_eq!(strip_comments("# only\n\n"), "");
    }
}
