// Response shape normalization
//
// List-valued endpoints answer with a JSON array, a JSON object keyed by
// identifier, or (on some server builds) a single string holding several
// 36-character identifiers run together. Everything that consumes such an
// endpoint goes through `identifiers()`; call sites never inspect the raw
// shape themselves.

use serde_json::Value;

use crate::models::Identifier;

/// How an identifier list was encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEncoding {
    /// A JSON array.
    Sequence,
    /// A string whose length is a multiple of the identifier width.
    Concatenated,
    /// A string of any other length, taken as a single element.
    Single,
    /// A JSON object; its keys are the identifiers.
    Mapping,
}

/// Identifiers decoded from a list-valued response, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierList {
    pub encoding: ListEncoding,
    pub ids: Vec<Identifier>,
}

impl IdentifierList {
    pub fn into_ids(self) -> Vec<Identifier> {
        self.ids
    }
}

/// The value matched none of the recognized encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    pub shape: String,
}

/// Decode an identifier list from any of the encodings the platform uses.
///
/// Rules, in order:
/// 1. arrays are returned in order; elements may be identifier strings or
///    objects carrying a string `id`
/// 2. strings whose length is an exact multiple of 36 are split into
///    36-character chunks
/// 3. any other string is a one-element list
/// 4. objects yield their keys in insertion order
/// 5. anything else is a [`ShapeError`]
///
/// Rule 3 means an error message and an identifier look alike here; the
/// session rejects non-2xx responses before they reach this function.
pub fn identifiers(value: &Value) -> Result<IdentifierList, ShapeError> {
    match value {
        Value::Array(items) => {
            let ids = items
                .iter()
                .map(sequence_element)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(IdentifierList {
                encoding: ListEncoding::Sequence,
                ids,
            })
        }
        Value::String(s) => Ok(split_concatenated(s)),
        Value::Object(map) => Ok(IdentifierList {
            encoding: ListEncoding::Mapping,
            ids: map.keys().map(|k| Identifier::from(k.as_str())).collect(),
        }),
        other => Err(ShapeError {
            shape: kind_name(other).into(),
        }),
    }
}

fn sequence_element(item: &Value) -> Result<Identifier, ShapeError> {
    match item {
        Value::String(s) => Ok(Identifier::from(s.as_str())),
        Value::Object(obj) => match obj.get("id") {
            Some(Value::String(id)) => Ok(Identifier::from(id.as_str())),
            _ => Err(ShapeError {
                shape: "array element object without a string id".into(),
            }),
        },
        other => Err(ShapeError {
            shape: format!("array element of type {}", kind_name(other)),
        }),
    }
}

fn split_concatenated(s: &str) -> IdentifierList {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() % Identifier::WIDTH == 0 {
        IdentifierList {
            encoding: ListEncoding::Concatenated,
            ids: chars
                .chunks(Identifier::WIDTH)
                .map(|chunk| Identifier::new(chunk.iter().collect::<String>()))
                .collect(),
        }
    } else {
        IdentifierList {
            encoding: ListEncoding::Single,
            ids: vec![Identifier::from(s)],
        }
    }
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
