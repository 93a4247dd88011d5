//! Compiler for the `key:type` output-format shorthand.
//!
//! A format string is a comma-separated list of pairs such as
//! `"name:string,age:integer,tags:string[]"`. The type defaults to `string`
//! when omitted; `type[]` declares an array of that element type. The legacy
//! `array[type]` spelling is rejected.

use crate::error::{LlmError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(String),
    /// Array of the given element kind. Nested arrays are not supported.
    Array(String),
}

impl FieldKind {
    /// Human-readable type label used in natural-language schema hints.
    pub fn label(&self) -> String {
        match self {
            Self::Scalar(t) => t.clone(),
            Self::Array(elem) => format!("array<{elem}>"),
        }
    }
}

/// One declared output field, parsed from the shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatField {
    pub name: String,
    pub kind: FieldKind,
}

/// Parse a format shorthand string into a list of declared fields.
///
/// The empty string compiles to an empty field list; whether that means "no
/// schema" is the caller's policy. Field names are unique in the result: a
/// later pair silently overwrites an earlier one with the same key. Any
/// malformed pair fails the whole string, no partial results.
pub fn compile_format(format: &str) -> Result<Vec<FormatField>> {
    if format.is_empty() {
        return Ok(Vec::new());
    }

    let mut fields: Vec<FormatField> = Vec::new();

    for pair in format.split(',') {
        let trimmed = pair.trim();
        if trimmed.is_empty() {
            return Err(LlmError::Format(format!("invalid format pair: {pair}")));
        }

        let (key_part, type_part) = match trimmed.split_once(':') {
            Some((k, t)) => (k, Some(t)),
            None => (trimmed, None),
        };

        let key = key_part.trim();
        if key.is_empty() {
            return Err(LlmError::Format(format!("empty key in format pair: {pair}")));
        }

        // Type defaults to string when omitted or blank (e.g. "name" or "name:").
        let mut type_str = "string";
        if let Some(t) = type_part {
            if t.contains(':') {
                return Err(LlmError::Format(format!("invalid format pair: {pair}")));
            }
            let t = t.trim();
            if !t.is_empty() {
                type_str = t;
            }
        }

        let kind = if let Some(element) = type_str.strip_suffix("[]") {
            let element = element.trim();
            if element.is_empty() {
                return Err(LlmError::Format(format!(
                    "empty element type in array specification: {type_str}"
                )));
            }
            if element.ends_with("[]") {
                return Err(LlmError::Format(format!(
                    "nested array types are not supported: {type_str}"
                )));
            }
            FieldKind::Array(element.to_string())
        } else if type_str.starts_with("array[") {
            return Err(LlmError::Format(format!(
                "invalid array specification: use type[] syntax, got {type_str}"
            )));
        } else {
            FieldKind::Scalar(type_str.to_string())
        };

        // Last declaration wins on duplicate names.
        if let Some(existing) = fields.iter_mut().find(|f| f.name == key) {
            existing.kind = kind;
        } else {
            fields.push(FormatField {
                name: key.to_string(),
                kind,
            });
        }
    }

    Ok(fields)
}
