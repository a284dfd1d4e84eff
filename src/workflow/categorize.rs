use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of extraction failure messages, recorded in the
/// audit notes so reports can group failures. Informational only; it never
/// gates a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    AiExtraction,
    Timeout,
    Network,
    FileAccess,
    Validation,
    Configuration,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::AiExtraction => "ai_extraction",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::FileAccess => "file_access",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PATTERNS: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Configuration,
        &["config", "environment variable", "missing setting"],
    ),
    (
        ErrorCategory::Timeout,
        &["timeout", "timed out", "deadline"],
    ),
    (
        ErrorCategory::Network,
        &["network", "connection", "dns", "ssl", "socket", "unreachable"],
    ),
    (
        ErrorCategory::AiExtraction,
        &[
            "api",
            "model",
            "extraction",
            "vision",
            "token",
            "rate limit",
            "quota",
            "authentication",
        ],
    ),
    (
        ErrorCategory::FileAccess,
        &["file", "permission", "not found", "path", "directory"],
    ),
    (
        ErrorCategory::Validation,
        &["validation", "parse", "convert", "required field"],
    ),
];

/// Best-effort classification by message content, first match wins.
pub fn categorize_error(message: &str) -> ErrorCategory {
    let lowered = message.to_lowercase();
    for (category, needles) in PATTERNS {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            return *category;
        }
    }
    ErrorCategory::Unknown
}
