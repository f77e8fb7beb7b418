//! Structured JSON-lines logger.
//!
//! One event per line, deterministic key ordering, synchronous writes.
//! Events are terse upper-snake names (`DATASET_RESOLVED`,
//! `VALIDATION_REJECTED`, `PLAN_EXECUTED`, `STORE_ERROR`) with string
//! fields only, so log lines diff cleanly across runs.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 0,
    /// Recoverable issues, including request rejections
    Warn = 1,
    /// Operation failures
    Error = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured logger. Stateless; severity routing is fixed: errors go
/// to stderr, everything else to stdout.
pub struct Logger;

impl Logger {
    /// Logs one event. Fields are emitted alphabetically by key after
    /// the fixed `event` and `severity` keys.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::log_to_writer(severity, event, fields, &mut io::stdout());
    }

    pub fn log_stderr(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::log_to_writer(severity, event, fields, &mut io::stderr());
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        // JSON built by hand: field order must not depend on caller
        // order, and the line must be written in one syscall.
        let mut output = String::with_capacity(256);

        output.push('{');
        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');
        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log_stderr(Severity::Error, event, fields);
    }
}

#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_log_is_valid_json() {
        let output = capture_log(
            Severity::Info,
            "PLAN_EXECUTED",
            &[("dataset", "crimes"), ("rows", "2")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "PLAN_EXECUTED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["dataset"], "crimes");
        assert_eq!(parsed["rows"], "2");
    }

    #[test]
    fn test_field_order_is_deterministic() {
        let forward = capture_log(
            Severity::Warn,
            "VALIDATION_REJECTED",
            &[("fields", "dataset_name"), ("count", "1")],
        );
        let backward = capture_log(
            Severity::Warn,
            "VALIDATION_REJECTED",
            &[("count", "1"), ("fields", "dataset_name")],
        );
        assert_eq!(forward, backward);
        assert!(forward.find("\"count\"").unwrap() < forward.find("\"fields\"").unwrap());
    }

    #[test]
    fn test_event_key_comes_first() {
        let output = capture_log(Severity::Info, "DATASET_RESOLVED", &[("aaa", "1")]);
        assert!(output.find("\"event\"").unwrap() < output.find("\"aaa\"").unwrap());
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
    }

    #[test]
    fn test_escapes_embedded_quotes() {
        let output = capture_log(
            Severity::Error,
            "STORE_ERROR",
            &[("detail", "no such table: \"crimez\"\n")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["detail"], "no such table: \"crimez\"\n");
    }
}
