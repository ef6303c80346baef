//! Layered decoder for free-text model replies
//!
//! The model is asked for a JSON object but may wrap it in prose, fence it
//! in a code block, or ignore the format entirely. Stages run in a fixed
//! order and the first one that yields a structurally valid object wins:
//!
//! 1. the whole trimmed reply as JSON
//! 2. the first fenced code block
//! 3. the first top-level `{...}` block anywhere in the text
//! 4. every flat (non-nested) `{...}` fragment, first one carrying an expected key
//! 5. text heuristics, which always produce a result
//!
//! An object is valid when it has at least one of `summary` (string),
//! `suggestions` or `insights` (arrays of strings).

use crate::ai::truncate_chars;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Summaries from the heuristic stage are capped to this many characters
pub const SUMMARY_MAX_CHARS: usize = 500;

const GENERIC_SUGGESTION: &str =
    "Review the reported findings and fix the highest-severity issues first.";

/// Which payload shape the prompt asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// `{summary, suggestions[]}`
    Report,
    /// `{insights[], suggestions[]}`
    Snippet,
}

/// The stage that produced an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    WholeResponse,
    FencedBlock,
    OuterBraces,
    BalancedFragment,
    TextHeuristics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub summary: Option<String>,
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,
    pub strategy: Strategy,
}

/// Tagged outcome of one stage
enum Stage {
    Done(Extraction),
    Continue,
}

type StageFn = fn(&str) -> Stage;

const JSON_STAGES: &[(Strategy, StageFn)] = &[
    (Strategy::WholeResponse, whole_response),
    (Strategy::FencedBlock, fenced_block),
    (Strategy::OuterBraces, outer_braces),
    (Strategy::BalancedFragment, balanced_fragment),
];

static FENCE: OnceLock<Regex> = OnceLock::new();
static FLAT_OBJECT: OnceLock<Regex> = OnceLock::new();
static SUMMARY_LABEL: OnceLock<Regex> = OnceLock::new();
static SUGGESTION_ARRAY: OnceLock<Regex> = OnceLock::new();
static QUOTED: OnceLock<Regex> = OnceLock::new();
static BULLET: OnceLock<Regex> = OnceLock::new();
static SUGGESTION_HEADER: OnceLock<Regex> = OnceLock::new();
static INSIGHT_HEADER: OnceLock<Regex> = OnceLock::new();
static ADVICE_SENTENCE: OnceLock<Regex> = OnceLock::new();

fn fence() -> &'static Regex {
    FENCE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid regex"))
}

fn flat_object() -> &'static Regex {
    FLAT_OBJECT.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"))
}

fn summary_label() -> &'static Regex {
    SUMMARY_LABEL.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*(?:#+[ \t]*)?\**[ \t]*(?:summary|overview|overall assessment)\b[ \t]*\**[ \t]*:?[ \t]*\**[ \t]*(.*)$")
            .expect("valid regex")
    })
}

fn suggestion_array() -> &'static Regex {
    SUGGESTION_ARRAY
        .get_or_init(|| Regex::new(r#"(?is)"?suggestions"?\s*:\s*\[(.*?)\]"#).expect("valid regex"))
}

fn quoted() -> &'static Regex {
    QUOTED.get_or_init(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"))
}

fn bullet() -> &'static Regex {
    BULLET.get_or_init(|| Regex::new(r"^[ \t]*(?:[-*•]|\d+[.)])[ \t]+(.+)$").expect("valid regex"))
}

fn suggestion_header() -> &'static Regex {
    SUGGESTION_HEADER.get_or_init(|| {
        Regex::new(r"(?i)^[ \t]*(?:#+[ \t]*)?\**[ \t]*(?:suggestions|recommendations|next steps)\b")
            .expect("valid regex")
    })
}

fn insight_header() -> &'static Regex {
    INSIGHT_HEADER.get_or_init(|| {
        Regex::new(r"(?i)^[ \t]*(?:#+[ \t]*)?\**[ \t]*(?:insights|observations|key findings)\b")
            .expect("valid regex")
    })
}

fn advice_sentence() -> &'static Regex {
    ADVICE_SENTENCE.get_or_init(|| {
        Regex::new(r"(?i)[^.!?\n]*\b(?:recommend|suggest|consider|should)\w*\b[^.!?\n]*[.!?]")
            .expect("valid regex")
    })
}

/// Decode a model reply. Never fails: the heuristic stage always answers.
pub fn extract(response: &str, kind: PayloadKind) -> Extraction {
    for (strategy, stage) in JSON_STAGES {
        match stage(response) {
            Stage::Done(extraction) => {
                debug!("AI response decoded via {:?}", strategy);
                return extraction;
            }
            Stage::Continue => debug!("AI response: {:?} did not apply", strategy),
        }
    }
    debug!("AI response decoded via text heuristics");
    text_heuristics(response, kind)
}

fn whole_response(response: &str) -> Stage {
    from_json(response.trim(), Strategy::WholeResponse)
}

fn fenced_block(response: &str) -> Stage {
    match fence().captures(response).and_then(|c| c.get(1)) {
        Some(body) => from_json(body.as_str().trim(), Strategy::FencedBlock),
        None => Stage::Continue,
    }
}

fn outer_braces(response: &str) -> Stage {
    let Some(start) = response.find('{') else {
        return Stage::Continue;
    };
    match balanced_object(response, start) {
        Some(candidate) => from_json(candidate, Strategy::OuterBraces),
        None => Stage::Continue,
    }
}

fn balanced_fragment(response: &str) -> Stage {
    for m in flat_object().find_iter(response) {
        if let Stage::Done(extraction) = from_json(m.as_str(), Strategy::BalancedFragment) {
            return Stage::Done(extraction);
        }
    }
    Stage::Continue
}

/// The `{...}` block starting at `start`, respecting JSON string literals
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.get(start..)?.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return text.get(start..start + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn from_json(candidate: &str, strategy: Strategy) -> Stage {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(obj)) => match validate(&obj, strategy) {
            Some(extraction) => Stage::Done(extraction),
            None => Stage::Continue,
        },
        _ => Stage::Continue,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Accept the object only if an expected key is present with the right shape
fn validate(obj: &Map<String, Value>, strategy: Strategy) -> Option<Extraction> {
    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let suggestions = obj.get("suggestions").and_then(string_list);
    let insights = obj.get("insights").and_then(string_list);

    if summary.is_none() && suggestions.is_none() && insights.is_none() {
        return None;
    }
    Some(Extraction {
        summary,
        insights: insights.unwrap_or_default(),
        suggestions: suggestions.unwrap_or_default(),
        strategy,
    })
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

fn is_prose(paragraph: &str) -> bool {
    !bullet().is_match(paragraph)
        && !paragraph.starts_with('#')
        && !paragraph.starts_with("```")
        && !suggestion_header().is_match(paragraph)
}

fn clean(item: &str) -> String {
    item.replace("**", "").trim().to_string()
}

fn heuristic_summary(text: &str) -> String {
    let labelled = summary_label().captures(text).and_then(|caps| {
        let inline = caps.get(1).map(|m| clean(m.as_str())).unwrap_or_default();
        if !inline.is_empty() {
            return Some(inline);
        }
        // Label on its own line: take the next paragraph
        let after = &text[caps.get(0)?.end()..];
        paragraphs(after).into_iter().find(|p| is_prose(p))
    });

    let summary = labelled
        .or_else(|| {
            paragraphs(text)
                .into_iter()
                .find(|p| p.chars().count() >= 20 && is_prose(p))
        })
        .unwrap_or_else(|| text.trim().to_string());

    truncate_chars(&clean(&summary), SUMMARY_MAX_CHARS)
}

/// Bullet items, preferring those under a header matching `header`
fn bullets_under(text: &str, header: &Regex) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    if let Some(pos) = lines.iter().position(|l| header.is_match(l)) {
        let mut items = Vec::new();
        for line in &lines[pos + 1..] {
            if let Some(caps) = bullet().captures(line) {
                items.push(clean(&caps[1]));
            } else if !line.trim().is_empty() && !items.is_empty() {
                break;
            }
        }
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

fn all_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|l| bullet().captures(l).map(|c| clean(&c[1])))
        .filter(|s| !s.is_empty())
        .collect()
}

fn heuristic_suggestions(text: &str) -> Vec<String> {
    // (a) a textual `suggestions: [...]` array
    if let Some(body) = suggestion_array().captures(text).and_then(|c| c.get(1)) {
        let items: Vec<String> = quoted()
            .captures_iter(body.as_str())
            .map(|c| c[1].replace("\\\"", "\"").trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !items.is_empty() {
            return items;
        }
    }

    // (b) bulleted or numbered lines
    let under_header = bullets_under(text, suggestion_header());
    if !under_header.is_empty() {
        return under_header;
    }
    let bullets = all_bullets(text);
    if !bullets.is_empty() {
        return bullets;
    }

    // (c) advice-like sentences
    let sentences: Vec<String> = advice_sentence()
        .find_iter(text)
        .map(|m| clean(m.as_str()))
        .filter(|s| s.chars().count() >= 15)
        .collect();
    if !sentences.is_empty() {
        return sentences;
    }

    // (d) the first few substantial paragraphs
    let paras: Vec<String> = paragraphs(text)
        .into_iter()
        .filter(|p| p.chars().count() > 40)
        .take(3)
        .collect();
    if !paras.is_empty() {
        return paras;
    }

    vec![GENERIC_SUGGESTION.to_string()]
}

fn text_heuristics(response: &str, kind: PayloadKind) -> Extraction {
    let summary = heuristic_summary(response);
    let suggestions = heuristic_suggestions(response);
    let insights = match kind {
        PayloadKind::Report => Vec::new(),
        PayloadKind::Snippet => {
            let found = bullets_under(response, insight_header());
            if found.is_empty() {
                vec![summary.clone()]
            } else {
                found
            }
        }
    };

    Extraction {
        summary: Some(summary),
        insights,
        suggestions,
        strategy: Strategy::TextHeuristics,
    }
}
