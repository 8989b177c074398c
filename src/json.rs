//! # JSON Lines Rows
//!
//! Row adapters for JSON Lines input, where each non-blank line is one row. Rows can be read as
//! typed structs or as untyped [`serde_json::Value`] maps; [`field`] pulls individual fields out
//! of untyped rows for use in key extractors and mappers.
//!
//! ## Example
//!
//! ```rust
//! use rowweave::json::{field, read_json_lines};
//! use serde_json::Value;
//!
//! let input = "{\"id\": 100, \"dish\": \"Chicken\"}\n\n{\"id\": 101, \"dish\": \"Fish\"}\n";
//! let rows: Vec<Value> = read_json_lines(input.as_bytes())
//!   .collect::<Result<_, _>>()
//!   .unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(field::<u64>(&rows[1], "id").unwrap(), 101);
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::BufRead;
use thiserror::Error;

/// Error reading a JSON Lines source.
#[derive(Debug, Error)]
pub enum JsonLinesError {
  /// The underlying reader failed.
  #[error("failed to read line: {0}")]
  Io(#[from] std::io::Error),
  /// A line was not valid JSON for the requested row type.
  #[error("line {line} is not a valid row: {source}")]
  Parse {
    /// 1-based line number.
    line: usize,
    /// The parse error.
    #[source]
    source: serde_json::Error,
  },
}

/// Error extracting a field from an untyped row.
#[derive(Debug, Error)]
pub enum FieldError {
  /// The row has no such field, or the field is `null`.
  #[error("field `{0}` is missing")]
  Missing(String),
  /// The field exists but does not deserialize into the requested type.
  #[error("field `{name}` has an unexpected type: {source}")]
  Invalid {
    /// The field name.
    name: String,
    /// The deserialization error.
    #[source]
    source: serde_json::Error,
  },
}

/// Reads one row per non-blank line.
///
/// Rows are produced lazily, so the reader is consumed as the tree accumulates and the whole
/// source is never held in memory.
pub fn read_json_lines<T, B>(reader: B) -> impl Iterator<Item = Result<T, JsonLinesError>>
where
  T: DeserializeOwned,
  B: BufRead,
{
  reader
    .lines()
    .enumerate()
    .filter_map(|(index, line)| match line {
      Ok(line) if line.trim().is_empty() => None,
      Ok(line) => Some(
        serde_json::from_str(&line).map_err(|source| JsonLinesError::Parse {
          line: index + 1,
          source,
        }),
      ),
      Err(error) => Some(Err(error.into())),
    })
}

/// Extracts and deserializes the field `name` of an untyped row.
pub fn field<T>(row: &Value, name: &str) -> Result<T, FieldError>
where
  T: DeserializeOwned,
{
  let value = row
    .get(name)
    .filter(|value| !value.is_null())
    .ok_or_else(|| FieldError::Missing(name.to_string()))?;
  T::deserialize(value).map_err(|source| FieldError::Invalid {
    name: name.to_string(),
    source,
  })
}
