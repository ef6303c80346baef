//! Project metadata from `package.json`
//!
//! Best effort: a missing or unparseable manifest yields
//! [`ProjectInfo::default`] and [`Platform::Generic`], never an error.

use crate::models::{Platform, ProjectInfo};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Minimal package.json structure for parsing
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageJson {
    fn has(&self, dep: &str) -> bool {
        self.dependencies.contains_key(dep) || self.dev_dependencies.contains_key(dep)
    }
}

/// Framework name and platform, most specific first
fn detect_framework(pkg: &PackageJson) -> (&'static str, Platform) {
    if pkg.has("next") {
        ("Next.js", Platform::NextJs)
    } else if pkg.has("react-native") || pkg.has("expo") {
        ("React Native", Platform::ReactNative)
    } else if pkg.has("react") {
        ("React", Platform::React)
    } else if pkg.has("vue") {
        ("Vue", Platform::Generic)
    } else if pkg.has("express") || pkg.has("fastify") || pkg.has("koa") {
        ("Node", Platform::Node)
    } else {
        ("Unknown", Platform::Generic)
    }
}

/// Read project metadata from `root/package.json`
pub fn load_project_info(root: &Path) -> (ProjectInfo, Platform) {
    let path = root.join("package.json");
    if !path.exists() {
        debug!("No package.json in {}, using defaults", root.display());
        return (ProjectInfo::default(), Platform::Generic);
    }

    let parsed = std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str::<PackageJson>(&content).map_err(Into::into));
    match parsed {
        Ok(pkg) => from_package(pkg),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            (ProjectInfo::default(), Platform::Generic)
        }
    }
}

fn from_package(pkg: PackageJson) -> (ProjectInfo, Platform) {
    let defaults = ProjectInfo::default();
    let (framework, platform) = detect_framework(&pkg);
    let info = ProjectInfo {
        project_name: pkg
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(defaults.project_name),
        framework: framework.to_string(),
        version: pkg
            .version
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.version),
        dependencies: pkg.dependencies.keys().cloned().collect(),
        dev_dependencies: pkg.dev_dependencies.keys().cloned().collect(),
    };
    (info, platform)
}
