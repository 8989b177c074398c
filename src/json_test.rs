//! Tests for the JSON Lines row adapters.

use crate::json::{FieldError, JsonLinesError, field, read_json_lines};
use serde::Deserialize;
use serde_json::{Value, json};
use std::io;

#[derive(Debug, Deserialize, PartialEq)]
struct Meal {
  id: u64,
  dish: String,
}

#[test]
fn test_read_typed_rows_skips_blank_lines() {
  let input = "{\"id\": 1, \"dish\": \"Soup\"}\n   \n{\"id\": 2, \"dish\": \"Stew\"}\n";

  let rows: Vec<Meal> = read_json_lines(input.as_bytes())
    .collect::<Result<_, _>>()
    .unwrap();

  assert_eq!(
    rows,
    vec![
      Meal {
        id: 1,
        dish: "Soup".to_string(),
      },
      Meal {
        id: 2,
        dish: "Stew".to_string(),
      },
    ]
  );
}

#[test]
fn test_parse_error_carries_line_number() {
  let input = "{\"id\": 1, \"dish\": \"Soup\"}\n\n{\"id\": \"two\"}\n";

  let results: Vec<Result<Meal, JsonLinesError>> = read_json_lines(input.as_bytes()).collect();

  assert!(results[0].is_ok());
  match &results[1] {
    Err(JsonLinesError::Parse { line, .. }) => assert_eq!(*line, 3),
    other => panic!("unexpected result: {other:?}"),
  }
}

#[test]
fn test_unreadable_line_is_an_io_error() {
  let input: &[u8] = b"{\"id\": 1, \"dish\": \"Soup\"}\n\xff\xfe\n";

  let results: Vec<Result<Meal, JsonLinesError>> = read_json_lines(input).collect();

  assert!(results[0].is_ok());
  assert!(matches!(
    &results[1],
    Err(JsonLinesError::Io(error)) if error.kind() == io::ErrorKind::InvalidData
  ));
}

#[test]
fn test_field_extracts_typed_values() {
  let row = json!({"id": 100, "name": "Joe", "tags": ["a", "b"]});

  assert_eq!(field::<u64>(&row, "id").unwrap(), 100);
  assert_eq!(field::<String>(&row, "name").unwrap(), "Joe");
  assert_eq!(field::<Vec<String>>(&row, "tags").unwrap(), vec!["a", "b"]);
}

#[test]
fn test_field_missing_or_null() {
  let row = json!({"id": null});

  assert!(matches!(
    field::<u64>(&row, "id"),
    Err(FieldError::Missing(name)) if name == "id"
  ));
  assert!(matches!(
    field::<u64>(&row, "other"),
    Err(FieldError::Missing(_))
  ));
}

#[test]
fn test_field_with_wrong_type() {
  let row: Value = json!({"id": "one hundred"});

  let error = field::<u64>(&row, "id").unwrap_err();
  assert!(matches!(error, FieldError::Invalid { ref name, .. } if name == "id"));
  assert!(error.to_string().starts_with("field `id` has an unexpected type"));
}
