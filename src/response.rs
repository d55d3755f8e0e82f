//! Model response post-processing
//!
//! Agents may declare `parse_response_as: json|yaml`. The raw text is
//! parsed after stripping a surrounding fenced code block, if any.

use lazy_regex::regex_captures;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
    Yaml,
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Json => write!(f, "json"),
            ResponseFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// A response as text, or parsed per the agent's format hint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedResponse {
    Text(String),
    Structured(serde_json::Value),
}

/// Content of the first fenced block, or the whole text trimmed
pub fn strip_code_fence(text: &str) -> &str {
    match regex_captures!(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```", text) {
        Some((_, inner)) => inner,
        None => text.trim(),
    }
}

pub fn parse_response(text: &str, format: Option<ResponseFormat>) -> Result<ParsedResponse> {
    let Some(format) = format else {
        return Ok(ParsedResponse::Text(text.to_string()));
    };

    let body = strip_code_fence(text);
    let value = match format {
        ResponseFormat::Json => serde_json::from_str(body).map_err(|e| Error::Parse {
            format: format.to_string(),
            message: e.to_string(),
        })?,
        ResponseFormat::Yaml => serde_yaml::from_str::<serde_json::Value>(body).map_err(|e| Error::Parse {
            format: format.to_string(),
            message: e.to_string(),
        })?,
    };
    Ok(ParsedResponse::Structured(value))
}
