//! Scan summary rendering.
//!
//! Turns a [`ScanResult`] into the text or JSON printed at the end of a run.

use crate::error::ScanError;
use crate::models::ScanResult;
use anyhow::Result;

/// Render a human-readable summary.
pub fn render_text(result: &ScanResult) -> String {
    let mut output = String::new();

    output.push_str("📊 Scan Summary:\n");
    output.push_str(&format!("   Parties with due items: {}\n", result.parties));
    output.push_str(&format!("   Notified: {}\n", result.notified));
    if result.silent > 0 {
        output.push_str(&format!("   No message warranted: {}\n", result.silent));
    }
    output.push_str(&format!("   Rows skipped: {}\n", result.skipped));

    if result.errors.is_empty() {
        return output;
    }

    output.push_str(&format!("\n⚠️  Errors ({}):\n", result.errors.len()));
    for error in &result.errors {
        let marker = match error {
            ScanError::Fatal(_) => "⛔",
            ScanError::RowDecode(_) => "⏭️ ",
            ScanError::Send { .. } => "✉️ ",
        };
        output.push_str(&format!("   {} {}\n", marker, error));
    }

    output
}

/// Render the result as pretty-printed JSON.
pub fn render_json(result: &ScanResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SendError;

    fn create_test_result() -> ScanResult {
        ScanResult {
            notified: 2,
            skipped: 1,
            silent: 0,
            parties: 3,
            errors: vec![ScanError::Send {
                party_id: "bob".to_string(),
                source: SendError::new("+15550100", "HTTP 500"),
            }],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&create_test_result());
        assert!(text.contains("Notified: 2"));
        assert!(text.contains("Rows skipped: 1"));
        assert!(text.contains("Errors (1)"));
        assert!(text.contains("party bob"));
        assert!(!text.contains("No message warranted"));
    }

    #[test]
    fn test_render_text_clean_scan() {
        let text = render_text(&ScanResult::default());
        assert!(text.contains("Notified: 0"));
        assert!(!text.contains("Errors"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&create_test_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["notified"], 2);
        assert_eq!(value["skipped"], 1);
        assert_eq!(value["parties"], 3);
        assert_eq!(
            value["errors"][0],
            "party bob: delivery to +15550100 failed: HTTP 500"
        );
    }
}
