//! Base matcher trait and shared text helpers
//!
//! A matcher is a pure function from one file's content to the places a
//! single rule is violated. Matchers never see other files or other rules'
//! output, which is what lets the engine run them in any order on any
//! thread.

use crate::config::options::RuleOptions;
use crate::detectors::syntax::SyntaxTree;
use anyhow::Result;
use std::path::Path;

/// One raw rule hit, before the engine attaches severity and category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// 1-indexed
    pub line: u32,
    /// 1-indexed, in characters
    pub column: u32,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Hit {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Everything a matcher may look at for one file
pub struct FileContext<'a> {
    pub path: &'a Path,
    pub content: &'a str,
    /// `content` with comments blanked and string contents blanked; same
    /// line structure and character count per line as `content`
    pub masked: &'a str,
    /// Best-effort syntax tree; `None` when parsing failed or the file type
    /// has no grammar
    pub syntax: Option<&'a SyntaxTree>,
    pub options: &'a RuleOptions,
}

impl<'a> FileContext<'a> {
    /// Masked lines, paired with their 1-indexed line number
    pub fn masked_lines(&self) -> impl Iterator<Item = (u32, &'a str)> {
        self.masked
            .lines()
            .enumerate()
            .map(|(i, l)| (i as u32 + 1, l))
    }

    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }

    pub fn is_typescript(&self) -> bool {
        matches!(self.extension(), "ts" | "tsx" | "mts" | "cts")
    }

    pub fn may_contain_jsx(&self) -> bool {
        matches!(self.extension(), "tsx" | "jsx" | "js")
    }
}

/// Trait for all rule matchers
///
/// ```ignore
/// pub struct NoVarMatcher;
///
/// impl Matcher for NoVarMatcher {
///     fn rule_id(&self) -> &'static str {
///         "no-var"
///     }
///
///     fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Catalog id of the rule this matcher implements
    fn rule_id(&self) -> &'static str;

    /// Whether this matcher should run on `path` at all
    fn applies_to(&self, path: &Path) -> bool {
        is_script_path(path)
    }

    /// Find every violation in one file
    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>>;
}

/// JS/TS source extensions the built-in matchers understand
pub const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

pub fn is_script_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCRIPT_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

pub fn is_typescript_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "mts" | "cts")
    )
}

/// Convert a byte offset within `line` into a 1-indexed character column
pub fn byte_to_column(line: &str, byte_idx: usize) -> u32 {
    let idx = byte_idx.min(line.len());
    let prefix = line.get(..idx).unwrap_or(line);
    prefix.chars().count() as u32 + 1
}

/// Maps byte offsets in a whole file to (line, column)
pub struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, starts }
    }

    /// 1-indexed (line, column) for a byte offset
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.starts[line_idx];
        let line_text = &self.text[start..];
        let line_text = line_text.split('\n').next().unwrap_or("");
        (line_idx as u32 + 1, byte_to_column(line_text, offset - start))
    }
}

/// Blank out comments and the contents of string literals.
///
/// Every character that is hidden becomes a single space, and newlines are
/// kept, so per-line character columns are identical to the original.
/// Quote characters themselves are kept. `'` and `"` strings end at a
/// newline; template literals may span lines.
pub fn mask_comments_and_strings(content: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(char),
    }

    let mut out = String::with_capacity(content.len());
    let mut state = State::Code;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '"' | '\'' | '`' => {
                    out.push(c);
                    state = State::Str(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            State::Str(quote) => {
                if c == '\\' {
                    out.push(' ');
                    if let Some(next) = chars.next() {
                        out.push(if next == '\n' { '\n' } else { ' ' });
                    }
                } else if c == quote {
                    out.push(c);
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                    if quote != '`' {
                        state = State::Code;
                    }
                } else {
                    out.push(' ');
                }
            }
        }
    }

    out
}

/// Byte offset just past the `>` that closes the JSX opening tag starting
/// at `start` (which should point at `<`). Braces are tracked so that `=>`
/// inside `{...}` attribute expressions does not end the tag.
pub fn tag_extent(masked: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in masked.get(start..)?.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '>' if depth == 0 && i > 0 => return Some(start + i + 1),
            _ => {}
        }
    }
    None
}

/// Byte offset of the bracket closing the one at `open` (`(`, `[` or `{`)
pub fn matching_close(masked: &str, open: usize) -> Option<usize> {
    let bytes = masked.as_bytes();
    let (open_ch, close_ch) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        b'{' => (b'{', b'}'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Whether an attribute named `name` appears in a tag's text
pub fn has_attribute(tag: &str, name: &str) -> bool {
    let bytes = tag.as_bytes();
    tag.match_indices(name).any(|(i, _)| {
        let before_ok = i == 0 || bytes[i - 1].is_ascii_whitespace();
        let rest = tag[i + name.len()..].trim_start();
        before_ok && (rest.starts_with('=') || rest.starts_with('/') || rest.starts_with('>'))
    })
}

/// Whether a tag spreads props (`{...props}`), which may supply any attribute
pub fn has_spread(tag: &str) -> bool {
    tag.contains("{...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_to_column() {
        assert_eq!(byte_to_column("abc", 0), 1);
        assert_eq!(byte_to_column("abc", 2), 3);
        assert_eq!(byte_to_column("héllo", 3), 3);
        assert_eq!(byte_to_column("abc", 99), 4);
    }

    #[test]
    fn test_line_index() {
        let text = "first\nsecond line\nthird";
        let idx = LineIndex::new(text);
        assert_eq!(idx.position(0), (1, 1));
        assert_eq!(idx.position(6), (2, 1));
        assert_eq!(idx.position(13), (2, 8));
        assert_eq!(idx.position(18), (3, 1));
    }

    #[test]
    fn test_masking_preserves_columns() {
        let src = "let a = \"x == y\"; // b == c\nconst d = 1; /* == */ e == f";
        let masked = mask_comments_and_strings(src);
        assert_eq!(masked.lines().count(), 2);
        for (orig, m) in src.lines().zip(masked.lines()) {
            assert_eq!(orig.chars().count(), m.chars().count());
        }
        let first = masked.lines().next().unwrap();
        assert!(!first.contains("=="));
        let second = masked.lines().nth(1).unwrap();
        assert_eq!(second.matches("==").count(), 1);
    }

    #[test]
    fn test_masking_multiline_block_comment() {
        let src = "a /* one\ntwo */ b";
        let masked = mask_comments_and_strings(src);
        assert_eq!(masked, "a       \n       b");
    }

    #[test]
    fn test_masking_template_literal_spans_lines() {
        let src = "const s = `a\nvar x`;\nvar y;";
        let masked = mask_comments_and_strings(src);
        let lines: Vec<&str> = masked.lines().collect();
        assert!(!lines[1].contains("var"));
        assert!(lines[2].contains("var"));
    }

    #[test]
    fn test_tag_extent_skips_arrows_in_braces() {
        let src = "<img onLoad={() => ready()} alt=\"x\" /> tail";
        let end = tag_extent(src, 0).expect("tag closes");
        assert_eq!(&src[..end], "<img onLoad={() => ready()} alt=\"x\" />");
    }

    #[test]
    fn test_matching_close() {
        let src = "f(a, (b), [c])";
        assert_eq!(matching_close(src, 1), Some(13));
        assert_eq!(matching_close(src, 5), Some(7));
        assert_eq!(matching_close("f(a", 1), None);
    }

    #[test]
    fn test_has_attribute() {
        assert!(has_attribute("<img alt=\"\" />", "alt"));
        assert!(has_attribute("<input disabled />", "disabled"));
        assert!(!has_attribute("<img data-alt=\"x\" />", "alt"));
        assert!(!has_attribute("<img altText=\"x\" />", "alt"));
    }
}
