mod json;
mod log;
mod text;

pub use json::JsonRenderer;
pub use log::LogWriter;
pub use text::{TextRenderer, END_DELIMITER};

use crate::context::SymbolContextPayload;
use miette::Result;
use std::str::FromStr;

/// Output format for rendered payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = miette::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(miette::miette!("Unknown report format '{}' (expected text or json)", other)),
        }
    }
}

/// Renders payloads and appends them to the report log
pub struct Reporter {
    format: ReportFormat,
    log: Option<LogWriter>,
}

impl Reporter {
    pub fn new(format: ReportFormat, log: Option<LogWriter>) -> Self {
        Self { format, log }
    }

    pub fn render(&self, payload: &SymbolContextPayload) -> Result<String> {
        match self.format {
            ReportFormat::Text => Ok(TextRenderer::new().render(payload)),
            ReportFormat::Json => JsonRenderer::new().render(payload),
        }
    }

    /// Render a completed payload and append it to the log, if one is set
    pub fn emit(&self, payload: &SymbolContextPayload) -> Result<String> {
        let rendered = self.render(payload)?;
        if let Some(log) = &self.log {
            log.append(&rendered)?;
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("sarif".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_emit_appends_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("context.log");
        let reporter = Reporter::new(ReportFormat::Text, Some(LogWriter::new(&path)));
        let payload = SymbolContextPayload::with_warning("nothing to do");

        let first = reporter.emit(&payload).unwrap();
        reporter.emit(&payload).unwrap();

        let logged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(logged, format!("{}{}", first, first));
    }
}
