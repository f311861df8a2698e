//! JSON export and import of the collection.

use std::path::Path;

use serde_json::Value;

use crate::error::{ImportError, Result};
use crate::quote::Quote;

/// File name offered when the user does not pick one.
pub const DEFAULT_EXPORT_FILE: &str = "quotes.json";

/// Pretty-printed JSON array of the whole collection.
pub fn export_json(quotes: &[Quote]) -> Result<String> {
    Ok(serde_json::to_string_pretty(quotes)?)
}

pub fn export_to_path(quotes: &[Quote], path: &Path) -> Result<()> {
    let json = export_json(quotes)?;
    fs_err::write(path, json)?;
    tracing::info!(path = %path.display(), count = quotes.len(), "exported quotes");
    Ok(())
}

/// Parse an uploaded file into quotes.
///
/// Only a top-level array is accepted. Each entry must be a JSON object;
/// its `text` and `category` fields are taken as-is (missing ones become
/// empty strings) and anything else is ignored.
pub fn parse_import(contents: &str) -> Result<Vec<Quote>, ImportError> {
    let value: Value =
        serde_json::from_str(contents).map_err(|e| ImportError::Malformed(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(ImportError::NotArray);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(ImportError::NotObject { index });
            }
            Ok(Quote {
                text: string_field(&entry, "text"),
                category: string_field(&entry, "category"),
            })
        })
        .collect()
}

pub fn read_import(path: &Path) -> Result<Vec<Quote>> {
    let contents = fs_err::read_to_string(path)?;
    Ok(parse_import(&contents)?)
}

// Non-string values are kept in their JSON form rather than rejected.
fn string_field(entry: &Value, field: &str) -> String {
    match entry.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn export_is_pretty_array() {
        let json = export_json(&[Quote::new("a", "b")]).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("\"text\": \"a\""));
    }

    #[test]
    fn export_then_parse_gives_back_records() {
        let quotes = vec![Quote::new("a", "x"), Quote::new("b", "y")];
        let parsed = parse_import(&export_json(&quotes).unwrap()).unwrap();
        assert_eq!(parsed, quotes);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_import("[{\"text\": "),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_non_array() {
        assert_eq!(
            parse_import(r#"{"text":"a","category":"b"}"#),
            Err(ImportError::NotArray)
        );
    }

    #[test]
    fn rejects_non_object_entry() {
        assert_eq!(
            parse_import(r#"[{"text":"a","category":"b"}, 3]"#),
            Err(ImportError::NotObject { index: 1 })
        );
    }

    #[test]
    fn loose_entries_are_accepted() {
        let parsed = parse_import(r#"[{"text":"a"}, {"category":7, "author":"x"}, {}]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Quote::new("a", ""), Quote::new("", "7"), Quote::new("", "")]
        );
    }

    #[test]
    fn export_to_path_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_EXPORT_FILE);

        export_to_path(&[Quote::new("a", "b")], &path).unwrap();
        assert_eq!(read_import(&path).unwrap(), vec![Quote::new("a", "b")]);
    }
}
