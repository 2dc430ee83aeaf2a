use serde_json::Value;

/// A single exported value.
///
/// Lists are split so an answered-but-empty multi-select (`EmptyList`) stays
/// distinguishable from an unanswered one (`Null`).
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    StringList(Vec<String>),
    EmptyList,
}

impl ExportValue {
    pub fn list(items: Vec<String>) -> Self {
        if items.is_empty() {
            Self::EmptyList
        } else {
            Self::StringList(items)
        }
    }

    pub fn string_or_null(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::String)
    }

    pub fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::String(text) => Value::String(text),
            Self::Integer(number) => Value::from(number),
            Self::Float(number) => Value::from(number),
            Self::StringList(items) => Value::from(items),
            Self::EmptyList => Value::Array(Vec::new()),
        }
    }
}
