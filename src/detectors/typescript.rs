//! Type-safety rules: explicit `any`, suppression comments, non-null assertions

use crate::detectors::base::{byte_to_column, is_typescript_path, FileContext, Hit, Matcher};
use crate::detectors::catalog::{NON_NULL_ASSERTION, NO_EXPLICIT_ANY, TS_IGNORE_COMMENT};
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static ANY_TYPE: OnceLock<Regex> = OnceLock::new();
static TS_SUPPRESSION: OnceLock<Regex> = OnceLock::new();
static NON_NULL: OnceLock<Regex> = OnceLock::new();

fn any_type() -> &'static Regex {
    ANY_TYPE.get_or_init(|| Regex::new(r"(?:[:<,|&]\s*|\bas\s+)(any)\b").expect("valid regex"))
}

fn ts_suppression() -> &'static Regex {
    TS_SUPPRESSION
        .get_or_init(|| Regex::new(r"(?://|/\*).*?(@ts-(?:ignore|nocheck))\b").expect("valid regex"))
}

fn non_null() -> &'static Regex {
    NON_NULL.get_or_init(|| Regex::new(r"[\w\)\]](!)(?:[.\[);,]|\s*$)").expect("valid regex"))
}

pub struct ExplicitAnyMatcher;

impl Matcher for ExplicitAnyMatcher {
    fn rule_id(&self) -> &'static str {
        NO_EXPLICIT_ANY
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_typescript_path(path)
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for (line_no, line) in ctx.masked_lines() {
            for caps in any_type().captures_iter(line) {
                let Some(g) = caps.get(1) else { continue };
                hits.push(
                    Hit::new(
                        line_no,
                        byte_to_column(line, g.start()),
                        "Unexpected `any`; the value is no longer type-checked",
                    )
                    .with_suggestion("Use a concrete type, a generic, or `unknown` with narrowing"),
                );
            }
        }
        Ok(hits)
    }
}

pub struct TsIgnoreMatcher;

impl Matcher for TsIgnoreMatcher {
    fn rule_id(&self) -> &'static str {
        TS_IGNORE_COMMENT
    }

    /// Reads raw content: the directive lives in a comment
    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for (i, line) in ctx.content.lines().enumerate() {
            for caps in ts_suppression().captures_iter(line) {
                let Some(g) = caps.get(1) else { continue };
                hits.push(
                    Hit::new(
                        i as u32 + 1,
                        byte_to_column(line, g.start()),
                        format!("`{}` suppresses type errors", g.as_str()),
                    )
                    .with_suggestion("Fix the underlying type error, or use @ts-expect-error with a reason"),
                );
            }
        }
        Ok(hits)
    }
}

pub struct NonNullAssertionMatcher;

impl Matcher for NonNullAssertionMatcher {
    fn rule_id(&self) -> &'static str {
        NON_NULL_ASSERTION
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_typescript_path(path)
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let mut hits = Vec::new();
        for (line_no, line) in ctx.masked_lines() {
            for caps in non_null().captures_iter(line) {
                let Some(g) = caps.get(1) else { continue };
                hits.push(
                    Hit::new(
                        line_no,
                        byte_to_column(line, g.start()),
                        "Non-null assertion bypasses null checks",
                    )
                    .with_suggestion("Narrow with a check or optional chaining (`?.`) instead"),
                );
            }
        }
        Ok(hits)
    }
}
