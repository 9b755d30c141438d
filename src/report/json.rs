use crate::context::SymbolContextPayload;
use miette::{IntoDiagnostic, Result};

/// JSON renderer for tooling built on top of the report
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, payload: &SymbolContextPayload) -> Result<String> {
        let mut json = serde_json::to_string_pretty(payload).into_diagnostic()?;
        json.push('\n');
        Ok(json)
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_payload_shape() {
        let rendered = JsonRenderer::new()
            .render(&SymbolContextPayload::with_warning("Index not ready"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert!(value["target"].is_null());
        assert_eq!(value["referenced_symbols"], serde_json::json!([]));
        assert_eq!(value["warning"], "Index not ready");
    }
}
