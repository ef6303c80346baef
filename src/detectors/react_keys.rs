//! Missing `key` in list rendering
//!
//! Looks at the element returned from a `.map()` callback. With a syntax
//! tree the callback's return value is located exactly; without one the
//! first JSX tag after `.map(` is inspected.

use crate::detectors::base::{has_attribute, has_spread, matching_close, tag_extent, FileContext, Hit, LineIndex, Matcher};
use crate::detectors::catalog::REACT_MISSING_KEY;
use crate::detectors::syntax::{unparenthesize, SyntaxTree};
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::Node;

static MAP_CALL: OnceLock<Regex> = OnceLock::new();
static JSX_OPEN: OnceLock<Regex> = OnceLock::new();

fn map_call() -> &'static Regex {
    MAP_CALL.get_or_init(|| Regex::new(r"\.map\s*\(").expect("valid regex"))
}

fn jsx_open() -> &'static Regex {
    JSX_OPEN.get_or_init(|| Regex::new(r"<([A-Za-z][\w.]*|>)").expect("valid regex"))
}

const MESSAGE: &str = "Element rendered from .map() has no `key` prop";
const SUGGESTION: &str = "Add a stable key, e.g. key={item.id}; avoid array indexes when the list can reorder";
const FRAGMENT_SUGGESTION: &str =
    "Short fragments cannot take a key; use <React.Fragment key={...}> instead";

pub struct MissingKeyMatcher;

impl Matcher for MissingKeyMatcher {
    fn rule_id(&self) -> &'static str {
        REACT_MISSING_KEY
    }

    fn applies_to(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("tsx" | "jsx" | "js")
        )
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        match ctx.syntax {
            Some(tree) => Ok(check_tree(tree)),
            None => Ok(check_text(ctx.masked)),
        }
    }
}

fn check_tree(tree: &SyntaxTree) -> Vec<Hit> {
    let mut hits = Vec::new();
    tree.for_each_node(&mut |node| {
        if node.kind() != "call_expression" || !is_map_call(tree, node) {
            return;
        }
        let Some(callback) = node
            .child_by_field_name("arguments")
            .and_then(|args| args.named_child(0))
        else {
            return;
        };
        for element in returned_jsx(callback) {
            if let Some(hit) = inspect_element(tree, element) {
                hits.push(hit);
            }
        }
    });
    hits
}

fn is_map_call(tree: &SyntaxTree, call: Node<'_>) -> bool {
    call.child_by_field_name("function")
        .filter(|f| f.kind() == "member_expression")
        .and_then(|f| f.child_by_field_name("property"))
        .map(|p| tree.text(p) == "map")
        .unwrap_or(false)
}

/// JSX elements a `.map()` callback returns
fn returned_jsx(callback: Node<'_>) -> Vec<Node<'_>> {
    if !matches!(
        callback.kind(),
        "arrow_function" | "function_expression" | "function"
    ) {
        return Vec::new();
    }
    let Some(body) = callback.child_by_field_name("body") else {
        return Vec::new();
    };

    if body.kind() != "statement_block" {
        return jsx_only(unparenthesize(body));
    }

    let mut out = Vec::new();
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        if stmt.kind() == "return_statement" {
            if let Some(value) = stmt.named_child(0) {
                out.extend(jsx_only(unparenthesize(value)));
            }
        }
    }
    out
}

fn jsx_only(node: Node<'_>) -> Vec<Node<'_>> {
    match node.kind() {
        "jsx_element" | "jsx_self_closing_element" => vec![node],
        _ => Vec::new(),
    }
}

fn inspect_element(tree: &SyntaxTree, element: Node<'_>) -> Option<Hit> {
    let (line, column) = tree.position(element);
    let opening = if element.kind() == "jsx_element" {
        let mut cursor = element.walk();
        let found = element
            .named_children(&mut cursor)
            .find(|c| c.kind() == "jsx_opening_element");
        found?
    } else {
        element
    };

    let head = tree.text(opening).trim_start_matches('<').trim_start();
    if head.starts_with('>') {
        return Some(Hit::new(line, column, MESSAGE).with_suggestion(FRAGMENT_SUGGESTION));
    }

    let mut cursor = opening.walk();
    let mut keyed = false;
    for attr in opening.named_children(&mut cursor) {
        match attr.kind() {
            "jsx_attribute" => {
                if attr.named_child(0).map(|n| tree.text(n)) == Some("key") {
                    keyed = true;
                }
            }
            "jsx_expression" => {
                let mut inner = attr.walk();
                if attr
                    .named_children(&mut inner)
                    .any(|c| c.kind() == "spread_element")
                {
                    keyed = true;
                }
            }
            _ => {}
        }
    }

    (!keyed).then(|| Hit::new(line, column, MESSAGE).with_suggestion(SUGGESTION))
}

/// Fallback when no syntax tree is available
fn check_text(masked: &str) -> Vec<Hit> {
    let index = LineIndex::new(masked);
    let mut hits = Vec::new();
    // nested maps share their innermost tag; report each tag once
    let mut seen = BTreeSet::new();

    for m in map_call().find_iter(masked) {
        let open = m.end() - 1;
        let end = matching_close(masked, open).unwrap_or(masked.len());
        let Some(region) = masked.get(open..end) else {
            continue;
        };
        let Some(tag) = jsx_open().captures(region) else {
            continue;
        };
        let Some(whole) = tag.get(0) else {
            continue;
        };
        let tag_start = open + whole.start();
        if !seen.insert(tag_start) {
            continue;
        }
        let (line, column) = index.position(tag_start);

        if tag.get(1).map(|g| g.as_str()) == Some(">") {
            hits.push(Hit::new(line, column, MESSAGE).with_suggestion(FRAGMENT_SUGGESTION));
            continue;
        }
        let Some(tag_end) = tag_extent(masked, tag_start) else {
            continue;
        };
        let text = &masked[tag_start..tag_end];
        if !has_attribute(text, "key") && !has_spread(text) {
            hits.push(Hit::new(line, column, MESSAGE).with_suggestion(SUGGESTION));
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::options::RuleOptions;
    use crate::detectors::base::mask_comments_and_strings;
    use crate::detectors::syntax::SourceLanguage;

    fn run(src: &str, with_tree: bool) -> Vec<Hit> {
        let masked = mask_comments_and_strings(src);
        let tree = if with_tree {
            Some(SyntaxTree::parse(src, SourceLanguage::Tsx).expect("fixture parses"))
        } else {
            None
        };
        let options = RuleOptions::default();
        let ctx = FileContext {
            path: Path::new("List.tsx"),
            content: src,
            masked: &masked,
            syntax: tree.as_ref(),
            options: &options,
        };
        MissingKeyMatcher.check(&ctx).unwrap()
    }

    const UNKEYED: &str = "const L = ({ items }) => (\n  <ul>{items.map((item) => (<li>{item.name}</li>))}</ul>\n);\n";
    const KEYED: &str = "const L = ({ items }) => (\n  <ul>{items.map((item) => <li key={item.id}>{item.name}</li>)}</ul>\n);\n";

    #[test]
    fn test_tree_detects_missing_key() {
        let hits = run(UNKEYED, true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 2);
    }

    #[test]
    fn test_tree_accepts_key() {
        assert!(run(KEYED, true).is_empty());
    }

    #[test]
    fn test_tree_block_body_return() {
        let src = "const L = ({ items }) => (\n  <ul>{items.map((item) => {\n    const n = item.name;\n    return <li>{n}</li>;\n  })}</ul>\n);\n";
        let hits = run(src, true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 4);
    }

    #[test]
    fn test_tree_spread_props_count_as_keyed() {
        let src = "const L = ({ items }) => <ul>{items.map((p) => <Row {...p} />)}</ul>;\n";
        assert!(run(src, true).is_empty());
    }

    #[test]
    fn test_tree_fragment_reported() {
        let src = "const L = ({ items }) => <dl>{items.map((i) => <><dt>{i.a}</dt></>)}</dl>;\n";
        let hits = run(src, true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].suggestion.as_deref(), Some(FRAGMENT_SUGGESTION));
    }

    #[test]
    fn test_tree_ignores_non_jsx_map() {
        let src = "const ids = items.map((i) => i.id);\n";
        assert!(run(src, true).is_empty());
    }

    #[test]
    fn test_text_fallback_agrees() {
        assert_eq!(run(UNKEYED, false).len(), 1);
        assert!(run(KEYED, false).is_empty());
        assert!(run("const ids = items.map((i) => i.id);\n", false).is_empty());
    }

    #[test]
    fn test_text_fallback_nested_maps_report_once() {
        let src = "const L = ({ rows }) => <ul>{rows.map((r) => r.tags.map((t) => <b>{t}</b>))}</ul>;\n";
        let hits = run(src, false);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].line, hits[0].column), (1, 64));
        assert_eq!(run(src, true).len(), 1);
    }
}
