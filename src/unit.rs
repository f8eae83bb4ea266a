//! Loading and saving source units
//!
//! A source unit is a JSON document holding the methods to scan. The
//! node serialization is the serde form of [`SyntaxNode`], tagged by
//! `kind`, so units can be produced by any frontend that emits the
//! same shape.

use crate::syntax::Method;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Unit load/save error
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A named collection of methods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Unit name, typically the originating class or module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Methods in declaration order
    pub methods: Vec<Method>,
}

impl SourceUnit {
    pub fn new(methods: Vec<Method>) -> Self {
        Self {
            name: None,
            methods,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Load a unit from a JSON file
    pub fn load(path: &Path) -> Result<Self, UnitError> {
        let content = std::fs::read_to_string(path).map_err(|source| UnitError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| UnitError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Save a unit as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), UnitError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| UnitError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| UnitError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{BinaryOp, SyntaxNode};
    use pretty_assertions::assert_eq;

    fn unit() -> SourceUnit {
        SourceUnit::new(vec![Method::new(
            "check_age",
            vec!["age"],
            SyntaxNode::block(vec![SyntaxNode::ret(Some(SyntaxNode::binary(
                BinaryOp::Gt,
                SyntaxNode::ident("age"),
                SyntaxNode::int(18),
            )))]),
        )])
        .with_name("AgeChecker")
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.json");

        let original = unit();
        original.save(&path).unwrap();
        let loaded = SourceUnit::load(&path).unwrap();

        assert_eq!(loaded.name.as_deref(), Some("AgeChecker"));
        assert_eq!(loaded.methods.len(), 1);
        assert_eq!(loaded.methods[0], original.methods[0]);
    }

    #[test]
    fn test_load_hand_written_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.json");
        std::fs::write(
            &path,
            r#"{
              "methods": [{
                "name": "noop",
                "parameters": [],
                "body": {
                  "kind": "block",
                  "statements": [{"kind": "return", "value": null}]
                }
              }]
            }"#,
        )
        .unwrap();

        let loaded = SourceUnit::load(&path).unwrap();
        assert!(loaded.name.is_none());
        assert_eq!(loaded.methods[0].name, "noop");
        assert!(loaded.methods[0].constants.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SourceUnit::load(Path::new("/nonexistent/unit.json")).unwrap_err();
        assert!(matches!(err, UnitError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = SourceUnit::load(&path).unwrap_err();
        assert!(matches!(err, UnitError::Json { .. }));
    }
}
