//! Best-effort syntax trees for JS/TS sources
//!
//! Tree-aware matchers use these when available. A failed parse is not an
//! error for the file: the engine records a diagnostic and the matchers fall
//! back to line heuristics.

use std::path::Path;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Tree};

/// Grammar to use for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
}

impl SourceLanguage {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            _ => None,
        }
    }

    fn grammar(&self) -> Language {
        match self {
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error("failed to load grammar: {0}")]
    Grammar(String),

    #[error("parser returned no tree")]
    NoTree,

    #[error("syntax error near line {line}")]
    Malformed { line: u32 },
}

/// A parsed file. Only produced for trees without error nodes.
pub struct SyntaxTree {
    tree: Tree,
    source: String,
    language: SourceLanguage,
}

impl SyntaxTree {
    pub fn parse(source: &str, language: SourceLanguage) -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| SyntaxError::Grammar(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or(SyntaxError::NoTree)?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(&tree).unwrap_or(1);
            return Err(SyntaxError::Malformed { line });
        }

        Ok(Self {
            tree,
            source: source.to_string(),
            language,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Source text of a node
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// 1-indexed (line, column) of a node's start
    pub fn position(&self, node: Node<'_>) -> (u32, u32) {
        let point = node.start_position();
        let line_text = self.source.lines().nth(point.row).unwrap_or("");
        (
            point.row as u32 + 1,
            crate::detectors::base::byte_to_column(line_text, point.column),
        )
    }

    /// Visit every node in the tree, depth first.
    ///
    /// Walks with a cursor instead of recursing, so nesting depth is bounded
    /// by the heap, not the worker's stack.
    pub fn for_each_node<'t>(&'t self, f: &mut dyn FnMut(Node<'t>)) {
        let mut cursor = self.tree.walk();
        loop {
            f(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }
}

/// Line of the first error or missing node, following erroneous children
fn first_error_line(tree: &Tree) -> Option<u32> {
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row as u32 + 1);
        }
        if !cursor.goto_first_child() {
            return None;
        }
        while !cursor.node().has_error() {
            if !cursor.goto_next_sibling() {
                return None;
            }
        }
    }
}

/// Node kinds that start a new function scope
pub fn is_function_boundary(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "function_expression"
            | "function"
            | "arrow_function"
            | "method_definition"
            | "generator_function_declaration"
    )
}

/// Unwrap `( ... )` around an expression
pub fn unparenthesize(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/b.tsx")),
            Some(SourceLanguage::Tsx)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("x.mjs")),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("x.py")), None);
    }

    #[test]
    fn test_parse_valid_tsx() {
        let src = "export const A = () => <div className=\"a\">hi</div>;\n";
        let tree = SyntaxTree::parse(src, SourceLanguage::Tsx).expect("parses");
        let mut saw_jsx = false;
        tree.for_each_node(&mut |n| {
            if n.kind() == "jsx_element" {
                saw_jsx = true;
            }
        });
        assert!(saw_jsx);
    }

    #[test]
    fn test_parse_rejects_broken_source() {
        let src = "function (\n  {{{ <div\n";
        let err = SyntaxTree::parse(src, SourceLanguage::Tsx).err().expect("fails");
        assert!(matches!(err, SyntaxError::Malformed { .. }));
    }

    #[test]
    fn test_walk_survives_deep_nesting() {
        let depth = 100_000;
        let src = format!("const a = {}1{};\n", "[".repeat(depth), "]".repeat(depth));
        let tree = SyntaxTree::parse(&src, SourceLanguage::JavaScript).expect("parses");
        let mut arrays = 0usize;
        tree.for_each_node(&mut |n| {
            if n.kind() == "array" {
                arrays += 1;
            }
        });
        assert_eq!(arrays, depth);
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let src = "let a = 1;\nlet b = [2, 3];\n";
        let tree = SyntaxTree::parse(src, SourceLanguage::JavaScript).expect("parses");
        let mut numbers = Vec::new();
        tree.for_each_node(&mut |n| {
            if n.kind() == "number" {
                numbers.push(tree.text(n).to_string());
            }
        });
        assert_eq!(numbers, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_position_is_one_indexed() {
        let src = "const a = 1;\n  let b = 2;\n";
        let tree = SyntaxTree::parse(src, SourceLanguage::TypeScript).expect("parses");
        let mut positions = Vec::new();
        tree.for_each_node(&mut |n| {
            if n.kind() == "lexical_declaration" {
                positions.push(tree.position(n));
            }
        });
        assert_eq!(positions, vec![(1, 1), (2, 3)]);
    }
}
