//! Output formatting for batch compilation results.

use crate::compiler::BatchResult;
use colored::Colorize;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// Formats a batch result as a string.
pub fn format_batch_result(result: &BatchResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
        OutputFormat::Text => format_batch_result_text(result),
    }
}

/// Formats a batch result as human-readable text.
fn format_batch_result_text(result: &BatchResult) -> String {
    let mut output = String::new();

    for error in &result.errors {
        output.push_str(&format!(
            "{} {} - {}\n",
            "ERROR".red().bold(),
            error.file.display().to_string().dimmed(),
            error.message
        ));
    }

    output.push_str(&format!(
        "Compiled {} test description(s), {} up-to-date\n",
        result.compiled, result.skipped
    ));

    if result.errors.is_empty() {
        output.push_str(&format!("{} No failures\n", "OK".green().bold()));
    } else {
        output.push_str(&format!(
            "{} failure(s)\n",
            result.errors.len().to_string().red().bold()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::BatchError;
    use std::path::PathBuf;

    #[test]
    fn test_json_format_lists_errors() {
        let result = BatchResult {
            compiled: 1,
            skipped: 2,
            errors: vec![BatchError {
                file: PathBuf::from("bad.yaml"),
                message: "boom".to_string(),
            }],
        };
        let json = format_batch_result(&result, OutputFormat::Json);
        assert!(json.contains("\"compiled\":1"));
        assert!(json.contains("bad.yaml"));
    }

    #[test]
    fn test_text_format_mentions_counts() {
        let result = BatchResult {
            compiled: 3,
            skipped: 0,
            errors: vec![],
        };
        let text = format_batch_result(&result, OutputFormat::Text);
        assert!(text.contains("Compiled 3 test description(s)"));
    }
}
