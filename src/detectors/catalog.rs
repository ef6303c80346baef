//! Static rule catalog
//!
//! One immutable table, built at compile time. Configurations are composed
//! over this table; nothing mutates it at runtime.

use crate::models::Severity;
use std::collections::BTreeSet;

/// Rule categories used by the built-in catalog
pub mod category {
    pub const CORRECTNESS: &str = "correctness";
    pub const REACT_HOOKS: &str = "react-hooks";
    pub const TYPE_SAFETY: &str = "type-safety";
    pub const ACCESSIBILITY: &str = "accessibility";
    pub const PERFORMANCE: &str = "performance";
    pub const BEST_PRACTICES: &str = "best-practices";
}

/// Immutable rule descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub default_severity: Severity,
    pub category: &'static str,
    /// Option keys this rule understands; anything else is dropped at resolution
    pub option_keys: &'static [&'static str],
}

pub const REACT_MISSING_KEY: &str = "react-missing-key";
pub const REACT_HOOKS_CONDITIONAL: &str = "react-hooks-conditional";
pub const REACT_HOOKS_MISSING_DEPS: &str = "react-hooks-missing-deps";
pub const NO_EXPLICIT_ANY: &str = "no-explicit-any";
pub const TS_IGNORE_COMMENT: &str = "ts-ignore-comment";
pub const NON_NULL_ASSERTION: &str = "non-null-assertion";
pub const IMG_MISSING_ALT: &str = "img-missing-alt";
pub const CLICK_WITHOUT_KEYBOARD: &str = "click-without-keyboard";
pub const INLINE_JSX_HANDLER: &str = "inline-jsx-handler";
pub const LARGE_COMPONENT: &str = "large-component";
pub const NO_CONSOLE: &str = "no-console";
pub const NO_VAR: &str = "no-var";
pub const LOOSE_EQUALITY: &str = "loose-equality";

static RULES: &[Rule] = &[
    Rule {
        id: REACT_MISSING_KEY,
        name: "Missing key in list rendering",
        description: "Elements returned from .map() need a stable `key` prop so React can reconcile the list.",
        default_severity: Severity::Error,
        category: category::CORRECTNESS,
        option_keys: &[],
    },
    Rule {
        id: REACT_HOOKS_CONDITIONAL,
        name: "Hook called conditionally",
        description: "Hooks must be called in the same order on every render; never inside conditions or loops.",
        default_severity: Severity::Error,
        category: category::REACT_HOOKS,
        option_keys: &[],
    },
    Rule {
        id: REACT_HOOKS_MISSING_DEPS,
        name: "Hook without dependency array",
        description: "useEffect/useMemo/useCallback without a dependency array re-run on every render.",
        default_severity: Severity::Warning,
        category: category::REACT_HOOKS,
        option_keys: &[],
    },
    Rule {
        id: NO_EXPLICIT_ANY,
        name: "Explicit any",
        description: "`any` disables type checking for everything it touches.",
        default_severity: Severity::Warning,
        category: category::TYPE_SAFETY,
        option_keys: &[],
    },
    Rule {
        id: TS_IGNORE_COMMENT,
        name: "TypeScript suppression comment",
        description: "@ts-ignore and @ts-nocheck hide real type errors.",
        default_severity: Severity::Warning,
        category: category::TYPE_SAFETY,
        option_keys: &[],
    },
    Rule {
        id: NON_NULL_ASSERTION,
        name: "Non-null assertion",
        description: "The `!` postfix operator tells the compiler to trust a value that may be null.",
        default_severity: Severity::Info,
        category: category::TYPE_SAFETY,
        option_keys: &[],
    },
    Rule {
        id: IMG_MISSING_ALT,
        name: "Image without alt text",
        description: "Images need an `alt` attribute for screen readers.",
        default_severity: Severity::Warning,
        category: category::ACCESSIBILITY,
        option_keys: &[],
    },
    Rule {
        id: CLICK_WITHOUT_KEYBOARD,
        name: "Click handler without keyboard handler",
        description: "Non-interactive elements with onClick should also handle keyboard events.",
        default_severity: Severity::Info,
        category: category::ACCESSIBILITY,
        option_keys: &[],
    },
    Rule {
        id: INLINE_JSX_HANDLER,
        name: "Inline function in JSX prop",
        description: "Inline arrow functions in event props are re-created on every render.",
        default_severity: Severity::Info,
        category: category::PERFORMANCE,
        option_keys: &[],
    },
    Rule {
        id: LARGE_COMPONENT,
        name: "Large component",
        description: "Components longer than the configured line budget are hard to read and re-render as a unit.",
        default_severity: Severity::Info,
        category: category::PERFORMANCE,
        option_keys: &["max_lines"],
    },
    Rule {
        id: NO_CONSOLE,
        name: "Console statement",
        description: "console.* calls left in application code.",
        default_severity: Severity::Info,
        category: category::BEST_PRACTICES,
        option_keys: &["allow"],
    },
    Rule {
        id: NO_VAR,
        name: "var declaration",
        description: "`var` is function-scoped and hoisted; use let or const.",
        default_severity: Severity::Warning,
        category: category::BEST_PRACTICES,
        option_keys: &[],
    },
    Rule {
        id: LOOSE_EQUALITY,
        name: "Loose equality",
        description: "== and != perform type coercion; use === and !==.",
        default_severity: Severity::Warning,
        category: category::CORRECTNESS,
        option_keys: &["allow_null"],
    },
];

/// All rules, in catalog order
pub fn all() -> &'static [Rule] {
    RULES
}

/// Look up a rule by id
pub fn lookup(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}

/// Whether `id` names a catalog rule
pub fn contains(id: &str) -> bool {
    lookup(id).is_some()
}

/// Every category that at least one rule belongs to
pub fn categories() -> BTreeSet<&'static str> {
    RULES.iter().map(|r| r.category).collect()
}
