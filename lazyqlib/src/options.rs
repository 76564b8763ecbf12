//! Input options for running sample queries.
//!
//! This module contains the configuration types that control how sample
//! results are drained and presented.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a report is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Title line followed by one compact row per line
    #[default]
    Table,
    /// Reports as a JSON array
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Options for draining sample queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunOptions {
    /// Output format for the reports
    pub format: OutputFormat,
    /// Stop each sample after this many rows
    pub limit: Option<usize>,
}

impl RunOptions {
    /// Create options with defaults (table output, no limit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the output format
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder: cap the number of rows drained per sample
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builder: drain every row
    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options_default() {
        let options = RunOptions::default();
        assert_eq!(options.format, OutputFormat::Table);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_run_options_builder() {
        let options = RunOptions::new().format(OutputFormat::Json).limit(5);
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.unlimited().limit, None);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("TABLE").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::from_str("csv").is_err());
    }

    #[test]
    fn test_run_options_serde() {
        let options = RunOptions::new().format(OutputFormat::Json).limit(2);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"format":"json","limit":2}"#);
        let back: RunOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
