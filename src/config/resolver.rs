//! Configuration resolution
//!
//! Merges a preset with caller overrides into one effective
//! [`AnalyzerConfig`]. Precedence for enablement, highest first:
//!
//! 1. explicit rule allow-list (`enabled_rules`)
//! 2. category allow-list (`categories`)
//! 3. per-rule override (`rules.<id>.enabled`)
//! 4. the preset table
//! 5. enabled (a rule nobody configured is on)
//!
//! Severity: per-rule override, then preset, then the catalog default.
//!
//! Resolution never fails. Problems are reported as warnings.

use crate::config::options::RuleOptions;
use crate::config::preset::Preset;
use crate::detectors::catalog::{self, Rule};
use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Caller-supplied override for a single rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOverride {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub options: RuleOptions,
}

/// Everything a caller can layer on top of a preset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// When present, only these rules run
    pub enabled_rules: Option<Vec<String>>,
    /// When present, rules outside these categories are disabled
    pub categories: Option<Vec<String>>,
    pub rules: BTreeMap<String, RuleOverride>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_rules = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rule(mut self, id: impl Into<String>, rule: RuleOverride) -> Self {
        self.rules.insert(id.into(), rule);
        self
    }
}

/// Effective settings for one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConfig {
    pub enabled: bool,
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "RuleOptions::is_empty")]
    pub options: RuleOptions,
}

/// Fully resolved configuration. Immutable once built: derive a new one
/// instead of patching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerConfig {
    preset: Preset,
    categories: BTreeMap<String, bool>,
    rules: BTreeMap<String, RuleConfig>,
}

static EMPTY_OPTIONS: std::sync::OnceLock<RuleOptions> = std::sync::OnceLock::new();

impl AnalyzerConfig {
    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn categories(&self) -> &BTreeMap<String, bool> {
        &self.categories
    }

    pub fn rules(&self) -> &BTreeMap<String, RuleConfig> {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&RuleConfig> {
        self.rules.get(id)
    }

    /// Whether a rule runs. A rule with no entry is enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.rules.get(id).map(|r| r.enabled).unwrap_or(true)
    }

    /// Effective severity: override, else the catalog default
    pub fn severity_for(&self, id: &str) -> Option<Severity> {
        self.rules
            .get(id)
            .and_then(|r| r.severity)
            .or_else(|| catalog::lookup(id).map(|r| r.default_severity))
    }

    pub fn options_for(&self, id: &str) -> &RuleOptions {
        self.rules
            .get(id)
            .map(|r| &r.options)
            .unwrap_or_else(|| EMPTY_OPTIONS.get_or_init(RuleOptions::default))
    }

    /// Ids of every enabled rule, in catalog order
    pub fn enabled_rule_ids(&self) -> Vec<&'static str> {
        catalog::all()
            .iter()
            .filter(|r| self.is_enabled(r.id))
            .map(|r| r.id)
            .collect()
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        resolve_preset(Preset::default(), &Overrides::default()).config
    }
}

/// Output of resolution: the config plus any non-fatal warnings
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: AnalyzerConfig,
    pub warnings: Vec<String>,
}

/// Resolve a preset given by name. Unknown names fall back to `recommended`.
pub fn resolve(preset_name: &str, overrides: &Overrides) -> Resolved {
    let (preset, fallback_warning) = match preset_name.parse::<Preset>() {
        Ok(p) => (p, None),
        Err(e) => {
            warn!("{}; falling back to 'recommended'", e);
            (
                Preset::Recommended,
                Some(format!("{}; using 'recommended' instead", e)),
            )
        }
    };

    let mut resolved = resolve_preset(preset, overrides);
    if let Some(w) = fallback_warning {
        resolved.warnings.insert(0, w);
    }
    resolved
}

/// Resolve a known preset
pub fn resolve_preset(preset: Preset, overrides: &Overrides) -> Resolved {
    let mut warnings = validate_overrides(overrides);

    let allowed_categories: Option<BTreeSet<&str>> = overrides
        .categories
        .as_ref()
        .map(|cats| cats.iter().map(String::as_str).collect());
    let allowed_rules: Option<BTreeSet<&str>> = overrides
        .enabled_rules
        .as_ref()
        .map(|ids| ids.iter().map(String::as_str).collect());

    let categories = catalog::categories()
        .into_iter()
        .map(|c| {
            let on = allowed_categories
                .as_ref()
                .map(|set| set.contains(c))
                .unwrap_or(true);
            (c.to_string(), on)
        })
        .collect();

    let mut rules = BTreeMap::new();
    for rule in catalog::all() {
        let over = overrides.rules.get(rule.id);
        let entry = preset.entry(rule.id);

        let enabled = if let Some(ids) = &allowed_rules {
            ids.contains(rule.id)
        } else if allowed_categories
            .as_ref()
            .is_some_and(|set| !set.contains(rule.category))
        {
            false
        } else {
            over.and_then(|o| o.enabled)
                .or(entry.map(|e| e.enabled))
                .unwrap_or(true)
        };

        let severity = over
            .and_then(|o| o.severity)
            .or(entry.map(|e| e.severity))
            .unwrap_or(rule.default_severity);

        let options = resolve_options(rule, over, &mut warnings);

        rules.insert(
            rule.id.to_string(),
            RuleConfig {
                enabled,
                severity: Some(severity),
                options,
            },
        );
    }

    debug!(
        "Resolved preset '{}': {} of {} rules enabled",
        preset,
        rules.values().filter(|r| r.enabled).count(),
        rules.len()
    );

    Resolved {
        config: AnalyzerConfig {
            preset,
            categories,
            rules,
        },
        warnings,
    }
}

fn resolve_options(
    rule: &Rule,
    over: Option<&RuleOverride>,
    warnings: &mut Vec<String>,
) -> RuleOptions {
    let Some(over) = over else {
        return RuleOptions::default();
    };
    let mut options = over.options.clone();
    for key in options.retain_known(rule.option_keys) {
        let msg = format!("rule '{}' does not recognise option '{}'", rule.id, key);
        warn!("{}", msg);
        warnings.push(msg);
    }
    options
}

fn validate_overrides(overrides: &Overrides) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(ids) = &overrides.enabled_rules {
        for id in ids.iter().filter(|id| !catalog::contains(id)) {
            warnings.push(format!("unknown rule '{}' in rule allow-list", id));
        }
    }

    if let Some(cats) = &overrides.categories {
        let known = catalog::categories();
        for c in cats.iter().filter(|c| !known.contains(c.as_str())) {
            warnings.push(format!("unknown category '{}' in category allow-list", c));
        }
    }

    for id in overrides.rules.keys().filter(|id| !catalog::contains(id)) {
        warnings.push(format!("override for unknown rule '{}' ignored", id));
    }

    for w in &warnings {
        warn!("{}", w);
    }
    warnings
}
