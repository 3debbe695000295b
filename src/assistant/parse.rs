//! Decoding of provider replies
//!
//! Replies are loosely formatted: usually JSON, sometimes wrapped in a
//! markdown fence. Decode failures and shape failures are kept apart because
//! callers show different recovery messages for each.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One function and what the assistant had to say about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationEntry {
    pub function_name: String,
    pub explanation: String,
}

/// A whole-file replacement proposed by the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub summary: Option<String>,
    pub updated_content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Explanations,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    Explanations(Vec<ExplanationEntry>),
    Edit(EditResult),
}

#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has the wrong shape: {0}")]
    Shape(String),
}

impl MalformedResponse {
    pub fn is_shape(&self) -> bool {
        matches!(self, MalformedResponse::Shape(_))
    }
}

/// Strip markdown code fences from a response
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = match trimmed.strip_prefix("```") {
        // Drop the info string (`json`, `JSON`, ...) that follows the fence
        Some(rest) => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        None => trimmed,
    };
    let clean = clean.trim_end();
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

pub fn parse_response(
    raw: &str,
    shape: ResponseShape,
) -> Result<ParsedResponse, MalformedResponse> {
    match shape {
        ResponseShape::Explanations => parse_explanations(raw).map(ParsedResponse::Explanations),
        ResponseShape::Edit => parse_edit(raw).map(ParsedResponse::Edit),
    }
}

/// Decode an array of `{functionName, explanation}` records. `[]` is valid.
pub fn parse_explanations(raw: &str) -> Result<Vec<ExplanationEntry>, MalformedResponse> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))?;
    let Value::Array(items) = &value else {
        return Err(MalformedResponse::Shape(format!(
            "expected an array of explanations, got {}",
            kind_of(&value)
        )));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(record) = item else {
                return Err(MalformedResponse::Shape(format!(
                    "entry {} is {}, not an object",
                    i + 1,
                    kind_of(item)
                )));
            };
            Ok(ExplanationEntry {
                function_name: required_text(record, "functionName", i)?,
                explanation: required_text(record, "explanation", i)?,
            })
        })
        .collect()
}

/// Decode a `{summary?, updatedContent}` record
pub fn parse_edit(raw: &str) -> Result<EditResult, MalformedResponse> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))?;
    let Value::Object(record) = &value else {
        return Err(MalformedResponse::Shape(format!(
            "expected an edit object, got {}",
            kind_of(&value)
        )));
    };

    let updated_content = match record.get("updatedContent") {
        Some(Value::String(content)) => content.clone(),
        Some(other) => {
            return Err(MalformedResponse::Shape(format!(
                "updatedContent is {}, not a string",
                kind_of(other)
            )))
        }
        None => return Err(MalformedResponse::Shape("missing updatedContent".to_string())),
    };

    // A summary of the wrong type is dropped rather than failing the edit
    let summary = match record.get("summary") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    Ok(EditResult {
        summary,
        updated_content,
    })
}

fn required_text(
    record: &Map<String, Value>,
    field: &str,
    index: usize,
) -> Result<String, MalformedResponse> {
    match record.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(MalformedResponse::Shape(format!(
            "entry {}: {} is empty",
            index + 1,
            field
        ))),
        Some(other) => Err(MalformedResponse::Shape(format!(
            "entry {}: {} is {}, not a string",
            index + 1,
            field,
            kind_of(other)
        ))),
        None => Err(MalformedResponse::Shape(format!(
            "entry {}: missing {}",
            index + 1,
            field
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
