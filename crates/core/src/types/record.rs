//! Catalog record domain model

use crate::error::{RecordError, RecordResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Plain key/value form of a record
pub type RecordMap = Map<String, Value>;

const FIELD_ID: &str = "book_id";
const FIELD_TITLE: &str = "title";
const FIELD_AUTHOR: &str = "author";
const FIELD_BORROWED: &str = "is_borrowed";

/// Caller-assigned identifier of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a RecordId from a raw integer
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        Self(i64::from(id))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loan status of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoanStatus {
    Available,
    Borrowed,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Borrowed => write!(f, "Borrowed"),
        }
    }
}

/// One catalog entry
///
/// The id, title and author are fixed once the record exists; only the
/// borrowed flag changes over its lifetime. Serializes with the store's
/// field names (`book_id`, `title`, `author`, `is_borrowed`) in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "book_id")]
    id: RecordId,
    title: String,
    author: String,
    #[serde(rename = "is_borrowed")]
    borrowed: bool,
}

impl Record {
    /// Creates an available record
    ///
    /// Fails with [`RecordError::EmptyField`] if the title or author is blank.
    pub fn new(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> RecordResult<Self> {
        let title = title.into();
        let author = author.into();
        require_text(FIELD_TITLE, &title)?;
        require_text(FIELD_AUTHOR, &author)?;

        Ok(Self {
            id: id.into(),
            title,
            author,
            borrowed: false,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_borrowed(&self) -> bool {
        self.borrowed
    }

    /// Returns the loan status derived from the borrowed flag
    pub fn status(&self) -> LoanStatus {
        if self.borrowed {
            LoanStatus::Borrowed
        } else {
            LoanStatus::Available
        }
    }

    /// Sets the borrowed flag
    ///
    /// Transition rules are enforced by the owning catalog, not here.
    pub fn set_borrowed(&mut self, borrowed: bool) {
        self.borrowed = borrowed;
    }

    /// Converts the record into its plain mapping form
    pub fn to_map(&self) -> RecordMap {
        let mut map = RecordMap::new();
        map.insert(FIELD_ID.to_string(), Value::from(self.id.get()));
        map.insert(FIELD_TITLE.to_string(), Value::from(self.title.clone()));
        map.insert(FIELD_AUTHOR.to_string(), Value::from(self.author.clone()));
        map.insert(FIELD_BORROWED.to_string(), Value::from(self.borrowed));
        map
    }

    /// Builds a record from its plain mapping form
    ///
    /// Every key must be present with the right kind of value. Extra keys
    /// are ignored. The input is not modified.
    pub fn from_map(map: &RecordMap) -> RecordResult<Self> {
        let id = field(map, FIELD_ID)?;
        let id = id.as_i64().ok_or_else(|| wrong_type(FIELD_ID, "an integer", id))?;

        let title = text_field(map, FIELD_TITLE)?;
        let author = text_field(map, FIELD_AUTHOR)?;

        let borrowed = field(map, FIELD_BORROWED)?;
        let borrowed = borrowed
            .as_bool()
            .ok_or_else(|| wrong_type(FIELD_BORROWED, "a boolean", borrowed))?;

        let mut record = Self::new(id, title, author)?;
        record.borrowed = borrowed;
        Ok(record)
    }

    /// Builds a record from any JSON value, which must be an object
    pub fn from_value(value: &Value) -> RecordResult<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(RecordError::NotAnObject {
                found: kind_of(other),
            }),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Book ID: {} | Title: {} | Author: {} | Status: {}",
            self.id,
            self.title,
            self.author,
            self.status()
        )
    }
}

fn field<'a>(map: &'a RecordMap, name: &'static str) -> RecordResult<&'a Value> {
    map.get(name)
        .ok_or(RecordError::MissingField { field: name })
}

fn text_field(map: &RecordMap, name: &'static str) -> RecordResult<String> {
    let value = field(map, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(name, "a string", value))
}

fn require_text(name: &'static str, value: &str) -> RecordResult<()> {
    if value.trim().is_empty() {
        Err(RecordError::EmptyField { field: name })
    } else {
        Ok(())
    }
}

fn wrong_type(name: &'static str, expected: &'static str, found: &Value) -> RecordError {
    RecordError::WrongType {
        field: name,
        expected,
        found: found.to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dune() -> Record {
        Record::new(1, "Dune", "Frank Herbert").unwrap()
    }

    fn as_map(value: Value) -> RecordMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_new_record_is_available() {
        let record = dune();
        assert_eq!(record.id(), RecordId::new(1));
        assert_eq!(record.title(), "Dune");
        assert_eq!(record.author(), "Frank Herbert");
        assert!(!record.is_borrowed());
        assert_eq!(record.status(), LoanStatus::Available);
    }

    #[test]
    fn test_new_rejects_blank_text() {
        assert_eq!(
            Record::new(1, "  ", "Herbert"),
            Err(RecordError::EmptyField { field: "title" })
        );
        assert_eq!(
            Record::new(1, "Dune", ""),
            Err(RecordError::EmptyField { field: "author" })
        );
    }

    #[test]
    fn test_to_map_uses_store_field_names() {
        let map = dune().to_map();
        assert_eq!(
            Value::Object(map),
            json!({
                "book_id": 1,
                "title": "Dune",
                "author": "Frank Herbert",
                "is_borrowed": false
            })
        );
    }

    #[test]
    fn test_map_roundtrip_keeps_borrowed_flag() {
        let mut record = dune();
        record.set_borrowed(true);

        let restored = Record::from_map(&record.to_map()).unwrap();
        assert_eq!(restored, record);
        assert_eq!(restored.status(), LoanStatus::Borrowed);
    }

    #[test]
    fn test_from_map_missing_field() {
        let map = as_map(json!({ "book_id": 1, "title": "Dune", "is_borrowed": false }));
        assert_eq!(
            Record::from_map(&map),
            Err(RecordError::MissingField { field: "author" })
        );
    }

    #[test]
    fn test_from_map_rejects_non_integer_id() {
        for id in [json!("7"), json!(7.5), json!(null), json!(u64::MAX)] {
            let map = as_map(json!({
                "book_id": id,
                "title": "Dune",
                "author": "Herbert",
                "is_borrowed": false
            }));
            assert!(matches!(
                Record::from_map(&map),
                Err(RecordError::WrongType { field: "book_id", .. })
            ));
        }
    }

    #[test]
    fn test_from_map_rejects_non_boolean_flag() {
        let map = as_map(json!({
            "book_id": 1,
            "title": "Dune",
            "author": "Herbert",
            "is_borrowed": "yes"
        }));
        assert!(matches!(
            Record::from_map(&map),
            Err(RecordError::WrongType { field: "is_borrowed", .. })
        ));
    }

    #[test]
    fn test_from_map_does_not_mutate_input() {
        let map = dune().to_map();
        let before = map.clone();
        let _ = Record::from_map(&map);
        assert_eq!(map, before);
    }

    #[test]
    fn test_from_value_requires_object() {
        assert_eq!(
            Record::from_value(&json!([1, 2])),
            Err(RecordError::NotAnObject { found: "an array" })
        );
    }

    #[test]
    fn test_serialize_field_order() {
        let json = serde_json::to_string(&dune()).unwrap();
        assert_eq!(
            json,
            r#"{"book_id":1,"title":"Dune","author":"Frank Herbert","is_borrowed":false}"#
        );
    }

    #[test]
    fn test_display_matches_listing_format() {
        let mut record = dune();
        assert_eq!(
            record.to_string(),
            "Book ID: 1 | Title: Dune | Author: Frank Herbert | Status: Available"
        );
        record.set_borrowed(true);
        assert!(record.to_string().ends_with("Status: Borrowed"));
    }
}
