//! Error types for npm operations.
//!
//! npm reports failures as an `npm ERR! code <CODE>` line on stderr (or an
//! `"error": {"code": ...}` object with `--json`). Classifying that code lets
//! callers treat an authorization refusal as an answer rather than a fault.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Categories of npm errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Registry unreachable, DNS, timeouts
    Network,
    /// Not logged in or not allowed (`E401`, `E403`, `ENEEDAUTH`)
    Permission,
    /// Package, org or team does not exist (`E404`)
    NotFound,
    /// npm printed something we could not parse
    Format,
    /// npm not found on PATH
    NpmNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Permission => "Permission denied",
            Self::NotFound => "Not found in registry",
            Self::Format => "Unexpected npm output",
            Self::NpmNotFound => "npm not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and registry settings",
            Self::Permission => "Check that USER_NPM_TOKEN is set and belongs to an org admin",
            Self::NotFound => "Verify the package, org, or team name",
            Self::Format => "Check the npm version and the error details",
            Self::NpmNotFound => "Install Node.js and npm from https://nodejs.org",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during npm operations.
#[derive(Debug, Error)]
pub enum Error {
    /// npm refused for lack of credentials or rights
    #[error("npm permission denied ({code}): {message}")]
    Permission {
        /// npm error code, e.g. `E403`
        code: String,
        /// npm's own message
        message: String,
    },

    /// Registry object not found
    #[error("not found: {message}")]
    NotFound {
        /// npm's own message
        message: String,
    },

    /// Network-related error
    #[error("network error: {message}")]
    Network {
        /// npm's own message
        message: String,
    },

    /// npm is not installed or not on PATH
    #[error("npm not found. Install Node.js from https://nodejs.org")]
    NpmNotFound,

    /// Package name has no npmjs origin
    #[error("package name `{0}` does not have an npmjs origin")]
    InvalidPackageName(String),

    /// npm output did not have the expected shape
    #[error("unexpected npm output: {0}")]
    InvalidOutput(String),

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// What was being run
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

static ERR_CODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^npm (?:ERR!|error) code (\S+)").expect("valid regex")
});

static ERR_CODE_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""code"\s*:\s*"([A-Za-z0-9_]+)""#).expect("valid regex"));

/// Pull the npm error code out of npm output.
pub fn error_code(output: &str) -> Option<&str> {
    ERR_CODE_LINE
        .captures(output)
        .or_else(|| ERR_CODE_JSON.captures(output))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Network { .. } => ErrorCategory::Network,
            Error::NpmNotFound => ErrorCategory::NpmNotFound,
            Error::InvalidOutput(_) | Error::Json(_) => ErrorCategory::Format,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether npm refused the call for lack of rights.
    pub fn is_permission_denied(&self) -> bool {
        self.category() == ErrorCategory::Permission
    }

    /// Create an error from npm command output.
    ///
    /// `output` is stderr, optionally followed by stdout (npm writes the
    /// `--json` error object to stdout).
    pub fn from_npm_output(output: &str, context: &str) -> Self {
        let message = output
            .lines()
            .find(|l| l.contains("ERR!") || l.starts_with("npm error"))
            .unwrap_or_else(|| output.trim())
            .trim()
            .to_string();

        match error_code(output) {
            Some(code @ ("E401" | "E403" | "ENEEDAUTH" | "EOTP")) => Error::Permission {
                code: code.to_string(),
                message,
            },
            Some("E404") => Error::NotFound { message },
            Some(
                "ENOTFOUND" | "ECONNREFUSED" | "ECONNRESET" | "ETIMEDOUT" | "EAI_AGAIN"
                | "ENETUNREACH",
            ) => Error::Network { message },
            _ => Error::CommandFailed {
                message: format!("npm {context} failed"),
                stderr: output.trim().to_string(),
            },
        }
    }
}

/// Result type for npm operations.
pub type Result<T> = std::result::Result<T, Error>;
