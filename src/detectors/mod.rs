//! Rule matchers and the evaluation engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RuleEngine                            │
//! │  - Parses each file once (best-effort tree-sitter)          │
//! │  - Runs enabled matchers in parallel (rayon)                │
//! │  - Isolates matcher errors and panics per rule/file         │
//! │  - Stamps effective severity + category, sorts output       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Matcher Trait                          │
//! │  - rule_id(): catalog id                                    │
//! │  - applies_to(path): file filter                            │
//! │  - check(ctx): raw hits for one file                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Matchers are stateless and never see other files or rules. Tree-aware
//! matchers fall back to text heuristics when `FileContext::syntax` is `None`.

pub mod accessibility;
pub mod base;
pub mod catalog;
pub mod engine;
pub mod performance;
pub mod practices;
pub mod react_hooks;
pub mod react_keys;
pub mod syntax;
pub mod typescript;

pub use base::{FileContext, Hit, Matcher};
pub use catalog::Rule;
pub use engine::{Evaluation, FileEvaluation, RuleEngine};

use std::sync::Arc;

/// One matcher per catalog rule
pub fn default_matchers() -> Vec<Arc<dyn Matcher>> {
    vec![
        // Correctness
        Arc::new(react_keys::MissingKeyMatcher),
        Arc::new(practices::LooseEqualityMatcher),
        // Hooks
        Arc::new(react_hooks::ConditionalHookMatcher),
        Arc::new(react_hooks::MissingDepsMatcher),
        // Type safety
        Arc::new(typescript::ExplicitAnyMatcher),
        Arc::new(typescript::TsIgnoreMatcher),
        Arc::new(typescript::NonNullAssertionMatcher),
        // Accessibility
        Arc::new(accessibility::ImgAltMatcher),
        Arc::new(accessibility::ClickKeyboardMatcher),
        // Performance
        Arc::new(performance::InlineHandlerMatcher),
        Arc::new(performance::LargeComponentMatcher),
        // Best practices
        Arc::new(practices::ConsoleMatcher),
        Arc::new(practices::VarMatcher),
    ]
}
