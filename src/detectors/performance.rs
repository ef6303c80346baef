//! Render-performance rules: inline handlers and oversized components

use crate::detectors::base::{byte_to_column, matching_close, FileContext, Hit, LineIndex, Matcher};
use crate::detectors::catalog::{INLINE_JSX_HANDLER, LARGE_COMPONENT};
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Default component length budget, in lines
pub const DEFAULT_MAX_LINES: i64 = 250;

static INLINE_HANDLER: OnceLock<Regex> = OnceLock::new();
static FUNCTION_COMPONENT: OnceLock<Regex> = OnceLock::new();
static ARROW_COMPONENT: OnceLock<Regex> = OnceLock::new();

fn inline_handler() -> &'static Regex {
    INLINE_HANDLER.get_or_init(|| {
        Regex::new(
            r"\b(on[A-Z]\w*)\s*=\s*\{\s*(?:async\s+)?(?:(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>|function\b)",
        )
        .expect("valid regex")
    })
}

fn function_component() -> &'static Regex {
    FUNCTION_COMPONENT.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:export\s+(?:default\s+)?)?function\s+([A-Z]\w*)\s*(?:<[^>]*>)?\s*\(")
            .expect("valid regex")
    })
}

fn arrow_component() -> &'static Regex {
    ARROW_COMPONENT.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?:export\s+)?(?:const|let)\s+([A-Z]\w*)\s*(?::[^=\n]+)?=\s*(?:(?:React\.)?(?:memo|forwardRef)\s*\(\s*)?(?:async\s+)?(?:function\b[^(\n]*)?\(",
        )
        .expect("valid regex")
    })
}

fn is_markup_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "jsx" | "js")
    )
}

pub struct InlineHandlerMatcher;

impl Matcher for InlineHandlerMatcher {
    fn rule_id(&self) -> &'static str {
        INLINE_JSX_HANDLER
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_markup_path(path)
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for (line_no, line) in ctx.masked_lines() {
            for caps in inline_handler().captures_iter(line) {
                let Some(prop) = caps.get(1) else { continue };
                hits.push(
                    Hit::new(
                        line_no,
                        byte_to_column(line, prop.start()),
                        format!("Inline function passed to `{}`", prop.as_str()),
                    )
                    .with_suggestion("Hoist the handler or wrap it in useCallback so memoised children do not re-render"),
                );
            }
        }
        Ok(hits)
    }
}

pub struct LargeComponentMatcher;

impl Matcher for LargeComponentMatcher {
    fn rule_id(&self) -> &'static str {
        LARGE_COMPONENT
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_markup_path(path)
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let max_lines = ctx.options.i64_or("max_lines", DEFAULT_MAX_LINES).max(1) as u32;
        let masked = ctx.masked;
        let index = LineIndex::new(masked);
        let mut hits = Vec::new();

        let starts = function_component()
            .captures_iter(masked)
            .chain(arrow_component().captures_iter(masked));

        for caps in starts {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(params_close) = matching_close(masked, whole.end() - 1) else {
                continue;
            };
            let Some(body_close) = body_end(masked, params_close + 1) else {
                continue;
            };

            let (start_line, column) = index.position(name.start());
            let (end_line, _) = index.position(body_close);
            let length = end_line - start_line + 1;
            if length > max_lines {
                hits.push(
                    Hit::new(
                        start_line,
                        column,
                        format!(
                            "Component `{}` is {} lines long (limit {})",
                            name.as_str(),
                            length,
                            max_lines
                        ),
                    )
                    .with_suggestion("Split it into smaller components or extract logic into custom hooks"),
                );
            }
        }

        hits.sort_by_key(|h| (h.line, h.column));
        Ok(hits)
    }
}

/// Offset of the bracket closing a component body that starts after `from`.
/// Expression-bodied arrows wrapped in parentheses count; bare expressions
/// do not.
fn body_end(masked: &str, from: usize) -> Option<usize> {
    let rest = masked.get(from..)?;
    let brace = rest.find('{');
    let arrow = rest.find("=>");

    let open = match (arrow, brace) {
        (Some(a), b) if b.map_or(true, |b| a < b) => {
            let after = a + 2;
            let skipped = rest[after..].len() - rest[after..].trim_start().len();
            let pos = after + skipped;
            match rest.as_bytes().get(pos)? {
                b'{' | b'(' => pos,
                _ => return None,
            }
        }
        (_, Some(b)) => b,
        _ => return None,
    };
    matching_close(masked, from + open)
}
