//! JSON reporter
//!
//! Outputs the full AnalysisResult as pretty-printed JSON, camelCase keys.

use crate::models::AnalysisResult;
use anyhow::Result;

pub fn render(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_json_render_valid() {
        let json_str = render(&test_result()).expect("render JSON");
        let parsed: serde_json::Value = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(parsed["healthScore"], 7.0);
        assert_eq!(parsed["aiEnhanced"], false);
        assert_eq!(parsed["findings"][0]["ruleId"], "react-missing-key");
        assert_eq!(parsed["metrics"]["bySeverity"]["error"], 1);
        assert!(parsed.get("aiError").is_none());
    }

    #[test]
    fn test_json_reads_back() {
        let original = test_result();
        let json_str = render(&original).expect("render JSON");
        let back: AnalysisResult = serde_json::from_str(&json_str).expect("parse JSON");
        assert_eq!(back.findings, original.findings);
        assert_eq!(back.project, original.project);
    }
}
