//! Built-in configuration presets
//!
//! Each preset is a total table over the rule catalog: every rule id has an
//! explicit enabled flag and severity. `minimal` is contained in
//! `recommended`, which is contained in `strict`, both in coverage and in
//! severity.

use crate::detectors::catalog::{self, *};
use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A named preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Minimal,
    #[default]
    Recommended,
    Strict,
}

/// A preset's decision for one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetEntry {
    pub enabled: bool,
    pub severity: Severity,
}

const fn on(severity: Severity) -> PresetEntry {
    PresetEntry {
        enabled: true,
        severity,
    }
}

const fn off(severity: Severity) -> PresetEntry {
    PresetEntry {
        enabled: false,
        severity,
    }
}

use crate::models::Severity::{Error, Info, Warning};

static MINIMAL: &[(&str, PresetEntry)] = &[
    (REACT_MISSING_KEY, on(Error)),
    (REACT_HOOKS_CONDITIONAL, on(Error)),
    (REACT_HOOKS_MISSING_DEPS, off(Warning)),
    (NO_EXPLICIT_ANY, off(Warning)),
    (TS_IGNORE_COMMENT, off(Warning)),
    (NON_NULL_ASSERTION, off(Info)),
    (IMG_MISSING_ALT, off(Warning)),
    (CLICK_WITHOUT_KEYBOARD, off(Info)),
    (INLINE_JSX_HANDLER, off(Info)),
    (LARGE_COMPONENT, off(Info)),
    (NO_CONSOLE, off(Info)),
    (NO_VAR, off(Warning)),
    (LOOSE_EQUALITY, off(Warning)),
];

static RECOMMENDED: &[(&str, PresetEntry)] = &[
    (REACT_MISSING_KEY, on(Error)),
    (REACT_HOOKS_CONDITIONAL, on(Error)),
    (REACT_HOOKS_MISSING_DEPS, on(Warning)),
    (NO_EXPLICIT_ANY, on(Warning)),
    (TS_IGNORE_COMMENT, on(Warning)),
    (NON_NULL_ASSERTION, off(Info)),
    (IMG_MISSING_ALT, on(Warning)),
    (CLICK_WITHOUT_KEYBOARD, on(Info)),
    (INLINE_JSX_HANDLER, off(Info)),
    (LARGE_COMPONENT, on(Info)),
    (NO_CONSOLE, off(Info)),
    (NO_VAR, on(Warning)),
    (LOOSE_EQUALITY, on(Warning)),
];

static STRICT: &[(&str, PresetEntry)] = &[
    (REACT_MISSING_KEY, on(Error)),
    (REACT_HOOKS_CONDITIONAL, on(Error)),
    (REACT_HOOKS_MISSING_DEPS, on(Error)),
    (NO_EXPLICIT_ANY, on(Error)),
    (TS_IGNORE_COMMENT, on(Error)),
    (NON_NULL_ASSERTION, on(Warning)),
    (IMG_MISSING_ALT, on(Error)),
    (CLICK_WITHOUT_KEYBOARD, on(Warning)),
    (INLINE_JSX_HANDLER, on(Warning)),
    (LARGE_COMPONENT, on(Warning)),
    (NO_CONSOLE, on(Warning)),
    (NO_VAR, on(Error)),
    (LOOSE_EQUALITY, on(Error)),
];

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Minimal, Preset::Recommended, Preset::Strict];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Minimal => "minimal",
            Preset::Recommended => "recommended",
            Preset::Strict => "strict",
        }
    }

    fn table(&self) -> &'static [(&'static str, PresetEntry)] {
        match self {
            Preset::Minimal => MINIMAL,
            Preset::Recommended => RECOMMENDED,
            Preset::Strict => STRICT,
        }
    }

    /// This preset's entry for `rule_id`, if it has one
    pub fn entry(&self, rule_id: &str) -> Option<PresetEntry> {
        self.table()
            .iter()
            .find(|(id, _)| *id == rule_id)
            .map(|(_, entry)| *entry)
    }

    /// Rule ids this preset enables
    pub fn enabled_rules(&self) -> Vec<&'static str> {
        self.table()
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Catalog ids this preset has no entry for (empty for every built-in preset)
    pub fn missing_rules(&self) -> Vec<&'static str> {
        catalog::all()
            .iter()
            .filter(|r| self.entry(r.id).is_none())
            .map(|r| r.id)
            .collect()
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Preset::Minimal),
            "recommended" => Ok(Preset::Recommended),
            "strict" => Ok(Preset::Strict),
            other => Err(format!(
                "unknown preset '{}'. Valid presets: minimal, recommended, strict",
                other
            )),
        }
    }
}
