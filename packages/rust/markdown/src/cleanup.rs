//! Text passes applied to serialized markdown.
//!
//! Each pass is a function `&str -> String` applied in sequence. The
//! formatter's `<!-- end list -->` separators are left in place: they keep
//! adjacent lists (and a list followed by indented code) from merging.

/// Run every cleanup pass on formatter output.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = clean_blank_lines(&result);
    result = ensure_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Collapse blank lines
// ---------------------------------------------------------------------------

/// An open code fence: its character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    ch: char,
    len: usize,
}

impl Fence {
    /// Parse a fence marker at the start of `line` (up to three spaces of
    /// indentation, then three or more backticks or tildes).
    fn parse(line: &str) -> Option<(Self, &str)> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let rest = &line[indent..];
        let ch = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.len() - rest.trim_start_matches(ch).len();
        if len < 3 {
            return None;
        }
        Some((Self { ch, len }, &rest[len..]))
    }

    /// A closing fence uses the same character, is at least as long and
    /// carries nothing but whitespace after it.
    fn closed_by(&self, line: &str) -> bool {
        match Self::parse(line) {
            Some((fence, info)) => {
                fence.ch == self.ch && fence.len >= self.len && info.trim().is_empty()
            }
            None => false,
        }
    }
}

/// Collapse runs of 2+ blank lines outside fenced code into one.
fn clean_blank_lines(md: &str) -> String {
    let mut result = String::with_capacity(md.len());
    let mut open: Option<Fence> = None;
    let mut blank_run = 0;

    for line in md.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        match open {
            Some(fence) => {
                if fence.closed_by(content) {
                    open = None;
                }
                blank_run = 0;
                result.push_str(line);
                continue;
            }
            None => {
                if let Some((fence, _)) = Fence::parse(content) {
                    open = Some(fence);
                }
            }
        }

        if open.is_none() && line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        result.push_str(line);
    }

    result
}

// ---------------------------------------------------------------------------
// Pass 2: Ensure trailing newline
// ---------------------------------------------------------------------------

/// End non-empty output with exactly one newline. Blank output becomes empty.
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    if trimmed.trim().is_empty() {
        return String::new();
    }
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_blank_lines_collapses_excess() {
        assert_eq!(clean_blank_lines("a\n\n\n\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn clean_blank_lines_preserves_code() {
        let input = "```\nx\n\n\n\ny\n```\n";
        assert_eq!(clean_blank_lines(input), input);
    }

    #[test]
    fn clean_blank_lines_preserves_nested_fences() {
        let input = "````md\n```\nx\n\n\n\ny\n````\n\n\n\nafter\n";
        assert_eq!(
            clean_blank_lines(input),
            "````md\n```\nx\n\n\n\ny\n````\n\nafter\n"
        );
    }

    #[test]
    fn clean_blank_lines_tilde_fence_ignores_backticks() {
        let input = "~~~\n```\n\n\n~~~\n";
        assert_eq!(clean_blank_lines(input), input);
    }

    #[test]
    fn fence_requires_three_markers() {
        assert!(Fence::parse("``x``").is_none());
        assert!(Fence::parse("    ```").is_none());
        let (fence, info) = Fence::parse("````rust").unwrap();
        assert_eq!(fence, Fence { ch: '`', len: 4 });
        assert_eq!(info, "rust");
        assert!(!fence.closed_by("```"));
        assert!(fence.closed_by("`````"));
        assert!(!fence.closed_by("```` md"));
    }

    #[test]
    fn ensure_trailing_newline_normalizes() {
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
        assert_eq!(ensure_trailing_newline("Content\n\n\n"), "Content\n");
        assert_eq!(ensure_trailing_newline("\n"), "");
        assert_eq!(ensure_trailing_newline(""), "");
    }

    #[test]
    fn full_pipeline() {
        let input = "* a\n\n<!-- end list -->\n\n- b\n\n\n\nEnd";
        assert_eq!(
            run_pipeline(input),
            "* a\n\n<!-- end list -->\n\n- b\n\nEnd\n"
        );
    }
}
