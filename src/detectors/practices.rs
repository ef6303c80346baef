//! General best-practice rules: console calls, `var`, loose equality

use crate::detectors::base::{byte_to_column, FileContext, Hit, Matcher};
use crate::detectors::catalog::{LOOSE_EQUALITY, NO_CONSOLE, NO_VAR};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

static CONSOLE_CALL: OnceLock<Regex> = OnceLock::new();
static VAR_DECL: OnceLock<Regex> = OnceLock::new();

fn console_call() -> &'static Regex {
    CONSOLE_CALL.get_or_init(|| Regex::new(r"\bconsole\.(\w+)\s*\(").expect("valid regex"))
}

fn var_decl() -> &'static Regex {
    VAR_DECL.get_or_init(|| Regex::new(r"(?:^|[^.\w$])(var)\s+[A-Za-z_$\[{]").expect("valid regex"))
}

pub struct ConsoleMatcher;

impl Matcher for ConsoleMatcher {
    fn rule_id(&self) -> &'static str {
        NO_CONSOLE
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        // `allow = "warn,error"` exempts those methods
        let allowed: Vec<&str> = ctx
            .options
            .str_or("allow", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut hits = Vec::new();
        for (line_no, line) in ctx.masked_lines() {
            for caps in console_call().captures_iter(line) {
                let (Some(whole), Some(method)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if allowed.contains(&method.as_str()) {
                    continue;
                }
                hits.push(
                    Hit::new(
                        line_no,
                        byte_to_column(line, whole.start()),
                        format!("Unexpected console.{} call", method.as_str()),
                    )
                    .with_suggestion("Remove it or route it through the application's logger"),
                );
            }
        }
        Ok(hits)
    }
}

pub struct VarMatcher;

impl Matcher for VarMatcher {
    fn rule_id(&self) -> &'static str {
        NO_VAR
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for (line_no, line) in ctx.masked_lines() {
            for caps in var_decl().captures_iter(line) {
                let Some(kw) = caps.get(1) else { continue };
                hits.push(
                    Hit::new(
                        line_no,
                        byte_to_column(line, kw.start()),
                        "Unexpected var; use let or const",
                    )
                    .with_suggestion("Use const for bindings that are never reassigned, let otherwise"),
                );
            }
        }
        Ok(hits)
    }
}

pub struct LooseEqualityMatcher;

impl Matcher for LooseEqualityMatcher {
    fn rule_id(&self) -> &'static str {
        LOOSE_EQUALITY
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let allow_null = ctx.options.bool_or("allow_null", true);
        let mut hits = Vec::new();

        for (line_no, line) in ctx.masked_lines() {
            for idx in loose_operators(line) {
                if allow_null && compares_null(line, idx) {
                    continue;
                }
                let op = &line[idx..idx + 2];
                let strict = if op == "==" { "===" } else { "!==" };
                hits.push(
                    Hit::new(
                        line_no,
                        byte_to_column(line, idx),
                        format!("Use '{}' instead of '{}'", strict, op),
                    )
                    .with_suggestion(format!("Replace '{}' with '{}' to avoid type coercion", op, strict)),
                );
            }
        }
        Ok(hits)
    }
}

/// Byte offsets of every `==` / `!=` that is not part of `===` / `!==`
fn loose_operators(line: &str) -> Vec<usize> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        let pair = (bytes[i], bytes[i + 1]);
        let is_op = matches!(pair, (b'=', b'=') | (b'!', b'='));
        let prev_ok = i == 0 || !matches!(bytes[i - 1], b'=' | b'!' | b'<' | b'>');
        let next_ok = bytes.get(i + 2) != Some(&b'=');
        if is_op && prev_ok && next_ok {
            out.push(i);
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

fn is_null_word(s: &str) -> bool {
    s.strip_prefix("null")
        .map(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(false)
}

/// `x == null` / `null != x` is the accepted idiom for null-or-undefined
fn compares_null(line: &str, idx: usize) -> bool {
    let right = line[idx + 2..].trim_start();
    let left = line[..idx].trim_end();
    is_null_word(right)
        || (left.ends_with("null")
            && !left[..left.len() - 4].ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::options::{OptionValue, RuleOptions};
    use crate::detectors::base::mask_comments_and_strings;
    use std::path::Path;

    fn run(matcher: &dyn Matcher, src: &str, options: &RuleOptions) -> Vec<Hit> {
        let masked = mask_comments_and_strings(src);
        let ctx = FileContext {
            path: Path::new("util.js"),
            content: src,
            masked: &masked,
            syntax: None,
            options,
        };
        matcher.check(&ctx).unwrap()
    }

    #[test]
    fn test_console_calls_and_allow_list() {
        let src = "console.log(a); console.error(b);\n// console.log(c)\nlogger.console.x;\n";
        let hits = run(&ConsoleMatcher, src, &RuleOptions::default());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].column, 17);

        let opts = RuleOptions::new().with("allow", OptionValue::String("warn, error".into()));
        let hits = run(&ConsoleMatcher, src, &opts);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.contains("console.log"));
    }

    #[test]
    fn test_var_declarations() {
        let src = "var a = 1;\nfor (var i = 0; i < n; i++) {}\nconst variable = obj.var;\nconst s = \"var x\";\n";
        let hits = run(&VarMatcher, src, &RuleOptions::default());
        let positions: Vec<(u32, u32)> = hits.iter().map(|h| (h.line, h.column)).collect();
        assert_eq!(positions, vec![(1, 1), (2, 6)]);
    }

    #[test]
    fn test_loose_equality_each_occurrence() {
        let src = "if (a == b && c != d) {}\nif (a === b || c !== d) {}\nif (x <= y && y >= z) {}\n";
        let hits = run(&LooseEqualityMatcher, src, &RuleOptions::default());
        let positions: Vec<(u32, u32)> = hits.iter().map(|h| (h.line, h.column)).collect();
        assert_eq!(positions, vec![(1, 7), (1, 17)]);
        assert_eq!(hits[1].message, "Use '!==' instead of '!='");
    }

    #[test]
    fn test_loose_equality_null_idiom() {
        let src = "if (v == null) {}\nif (null != v) {}\nif (nullable == v) {}\n";
        let hits = run(&LooseEqualityMatcher, src, &RuleOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 3);

        let strict = RuleOptions::new().with("allow_null", OptionValue::Boolean(false));
        assert_eq!(run(&LooseEqualityMatcher, src, &strict).len(), 3);
    }

    #[test]
    fn test_loose_equality_ignores_strings_and_comments() {
        let src = "const s = \"a == b\"; // c != d\n";
        assert!(run(&LooseEqualityMatcher, src, &RuleOptions::default()).is_empty());
    }
}
