//! Rules of hooks
//!
//! - Conditional hook calls (inside if/loops/ternaries/short-circuits)
//! - Effect and memo hooks without a dependency array

use crate::detectors::base::{matching_close, FileContext, Hit, LineIndex, Matcher};
use crate::detectors::catalog::{REACT_HOOKS_CONDITIONAL, REACT_HOOKS_MISSING_DEPS};
use crate::detectors::syntax::{is_function_boundary, SyntaxTree};
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::Node;

static HOOK_CALL: OnceLock<Regex> = OnceLock::new();
static DEPS_HOOK: OnceLock<Regex> = OnceLock::new();
static CONDITIONAL_HEADER: OnceLock<Regex> = OnceLock::new();
static FUNCTION_HEADER: OnceLock<Regex> = OnceLock::new();

fn hook_call() -> &'static Regex {
    HOOK_CALL.get_or_init(|| Regex::new(r"\b(use[A-Z]\w*)\s*\(").expect("valid regex"))
}

fn deps_hook() -> &'static Regex {
    DEPS_HOOK.get_or_init(|| {
        Regex::new(r"\b(useEffect|useLayoutEffect|useCallback|useMemo)\s*\(").expect("valid regex")
    })
}

fn conditional_header() -> &'static Regex {
    CONDITIONAL_HEADER.get_or_init(|| {
        Regex::new(r"\b(if|else|for|while|switch|case|do)\b").expect("valid regex")
    })
}

fn function_header() -> &'static Regex {
    FUNCTION_HEADER.get_or_init(|| Regex::new(r"\bfunction\b|=>").expect("valid regex"))
}

fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

pub struct ConditionalHookMatcher;

impl Matcher for ConditionalHookMatcher {
    fn rule_id(&self) -> &'static str {
        REACT_HOOKS_CONDITIONAL
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        match ctx.syntax {
            Some(tree) => Ok(conditional_hooks_in_tree(tree)),
            None => Ok(conditional_hooks_in_text(ctx)),
        }
    }
}

fn hit_for(name: &str, line: u32, column: u32) -> Hit {
    Hit::new(
        line,
        column,
        format!("React hook `{}` is called conditionally", name),
    )
    .with_suggestion("Call hooks unconditionally at the top level of the component; move the condition inside the hook")
}

fn conditional_hooks_in_tree(tree: &SyntaxTree) -> Vec<Hit> {
    let mut hits = Vec::new();
    tree.for_each_node(&mut |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let name_node = match callee.kind() {
            "identifier" => Some(callee),
            "member_expression" => callee.child_by_field_name("property"),
            _ => None,
        };
        let Some(name_node) = name_node else {
            return;
        };
        let name = tree.text(name_node);
        if is_hook_name(name) && under_condition(tree, node) {
            let (line, column) = tree.position(name_node);
            hits.push(hit_for(name, line, column));
        }
    });
    hits
}

/// Whether any ancestor up to the enclosing function makes `node` conditional
fn under_condition(tree: &SyntaxTree, node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        let kind = n.kind();
        if is_function_boundary(kind) {
            return false;
        }
        match kind {
            "if_statement" | "ternary_expression" | "for_statement" | "for_in_statement"
            | "while_statement" | "do_statement" | "switch_statement" => return true,
            "binary_expression" => {
                let op = n
                    .child_by_field_name("operator")
                    .map(|o| tree.text(o))
                    .unwrap_or("");
                if matches!(op, "&&" | "||" | "??") {
                    return true;
                }
            }
            _ => {}
        }
        current = n.parent();
    }
    false
}

#[derive(Clone, Copy, PartialEq)]
enum Frame {
    Function,
    Conditional,
    Plain,
}

/// Brace-stack heuristic used when the file did not parse
fn conditional_hooks_in_text(ctx: &FileContext<'_>) -> Vec<Hit> {
    let mut hits = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for (line_no, line) in ctx.masked_lines() {
        let in_conditional = stack
            .iter()
            .rev()
            .take_while(|f| **f != Frame::Function)
            .any(|f| *f == Frame::Conditional);

        for caps in hook_call().captures_iter(line) {
            let Some(name) = caps.get(1) else { continue };
            let before = &line[..name.start()];
            let inline = before.contains('?')
                || before.contains("&&")
                || before.contains("||")
                || conditional_header().is_match(before);
            if in_conditional || inline {
                let column = crate::detectors::base::byte_to_column(line, name.start());
                hits.push(hit_for(name.as_str(), line_no, column));
            }
        }

        let frame = if function_header().is_match(line) {
            Frame::Function
        } else if conditional_header().is_match(line) {
            Frame::Conditional
        } else {
            Frame::Plain
        };
        for c in line.chars() {
            match c {
                '{' => stack.push(frame),
                '}' => {
                    stack.pop();
                }
                _ => {}
            }
        }
    }
    hits
}

pub struct MissingDepsMatcher;

impl Matcher for MissingDepsMatcher {
    fn rule_id(&self) -> &'static str {
        REACT_HOOKS_MISSING_DEPS
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let masked = ctx.masked;
        let index = LineIndex::new(masked);
        let mut hits = Vec::new();

        for caps in deps_hook().captures_iter(masked) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let open = whole.end() - 1;
            let Some(close) = matching_close(masked, open) else {
                continue;
            };
            if has_top_level_comma(&masked[open + 1..close]) {
                continue;
            }
            let (line, column) = index.position(name.start());
            hits.push(
                Hit::new(
                    line,
                    column,
                    format!("`{}` has no dependency array", name.as_str()),
                )
                .with_suggestion("Pass a dependency array listing every value the callback reads"),
            );
        }
        Ok(hits)
    }
}

fn has_top_level_comma(args: &str) -> bool {
    let mut depth = 0i32;
    for c in args.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}
