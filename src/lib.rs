//! pulsecheck - health analysis for React and TypeScript projects
//!
//! Runs a fixed catalog of rules over a project's source files, scores the
//! result from 0 to 10 and can optionally ask an LLM to summarise it.
//!
//! ```rust,ignore
//! use pulsecheck::pipeline::{analyze_project, AnalysisOptions};
//!
//! let result = analyze_project(Path::new("."), &AnalysisOptions::default())?;
//! println!("{:.1}/10", result.health_score);
//! ```

pub mod ai;
pub mod config;
pub mod detectors;
pub mod files;
pub mod models;
pub mod pipeline;
pub mod project;
pub mod reporters;
pub mod scoring;
