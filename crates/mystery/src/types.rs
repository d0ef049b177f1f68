use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output reported when a successful run printed nothing
pub const NO_OUTPUT_PLACEHOLDER: &str = "Code executed successfully (no output)";

/// A language the execution backend will run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
}

impl Language {
    /// Every language in the allow-list
    pub const ALL: [Language; 1] = [Language::Python];

    /// Identifier used on the wire and as the configuration key
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = RequestError;

    /// Case-insensitive lookup against the allow-list
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| RequestError::UnsupportedLanguage(s.to_string()))
    }
}

/// Reasons a request is rejected before any code is looked at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Language and code are required")]
    MissingFields,

    #[error("Language {0} is not supported")]
    UnsupportedLanguage(String),
}

/// A validated request to run some source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub language: Language,
    pub source: String,
}

impl ExecutionRequest {
    /// Build a request from the raw fields of an API call.
    ///
    /// Absent and empty fields are treated alike. The language is only
    /// checked once both fields are present.
    pub fn from_parts(language: Option<&str>, source: Option<&str>) -> Result<Self, RequestError> {
        let (Some(language), Some(source)) = (
            language.filter(|l| !l.is_empty()),
            source.filter(|s| !s.is_empty()),
        ) else {
            return Err(RequestError::MissingFields);
        };

        Ok(Self {
            language: language.parse()?,
            source: source.to_string(),
        })
    }
}

/// Result of a run that exited with code 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Always true for a result that reached the caller
    pub success: bool,

    /// Captured stdout, or [`NO_OUTPUT_PLACEHOLDER`] when there was none
    pub output: String,

    /// Captured stderr, if the program wrote any
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Normalize the raw streams of a successful run
    pub fn from_streams(stdout: &[u8], stderr: &[u8]) -> Self {
        let output = if stdout.is_empty() {
            NO_OUTPUT_PLACEHOLDER.to_string()
        } else {
            String::from_utf8_lossy(stdout).into_owned()
        };
        let error = (!stderr.is_empty()).then(|| String::from_utf8_lossy(stderr).into_owned());

        Self {
            success: true,
            output,
            error,
        }
    }
}
