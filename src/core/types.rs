use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

/// A single imported record: field name to scalar value, in source order
pub type Row = Map<String, Value>;

/// Unique identifier for an imported dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(Uuid);

impl DatasetId {
    /// Create a new unique dataset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the ID as a string
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s).map_err(|e| e.to_string())?))
    }
}

/// Field names of a dataset, taken from the first row in enumeration order
pub fn field_names(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Lower-cased string content of a cell, `None` for non-string scalars
pub fn lowercase_str(value: &Value) -> Option<String> {
    value.as_str().map(str::to_lowercase)
}

/// Raw display form of a cell value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// True when `candidate` parses as an absolute URL with an http or https scheme
pub fn is_valid_http_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_id_creation() {
        let id1 = DatasetId::new();
        let id2 = DatasetId::new();

        assert_ne!(id1, id2, "IDs should be unique");
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_dataset_id_serialization() {
        let id = DatasetId::from_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let restored: DatasetId = serde_json::from_str(&json).unwrap();

        assert_eq!(id, restored);
    }

    #[test]
    fn test_field_names_follow_first_row_order() {
        let rows: Vec<Row> = vec![
            serde_json::from_value(json!({"zeta": "1", "alpha": "2", "mid": "3"})).unwrap(),
        ];
        assert_eq!(field_names(&rows), vec!["zeta", "alpha", "mid"]);
        assert!(field_names(&[]).is_empty());
    }

    #[test]
    fn test_http_url_detection() {
        assert!(is_valid_http_url("http://x/1.png"));
        assert!(is_valid_http_url("https://example.com/a.jpg?size=2"));
        assert!(!is_valid_http_url("N/A"));
        assert!(!is_valid_http_url("ftp://example.com/a.png"));
        assert!(!is_valid_http_url("example.com/a.png"));
        assert!(!is_valid_http_url(""));
    }

    #[test]
    fn test_cell_helpers() {
        assert_eq!(lowercase_str(&json!("CaT")), Some("cat".to_string()));
        assert_eq!(lowercase_str(&json!(3)), None);
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!("x")), "x");
    }
}
