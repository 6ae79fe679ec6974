//! Reading and schema-validating manifest files.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::ManifestDocument;
use crate::error::ManifestError;

/// Loads manifests and validates each one against a Draft-04 schema.
///
/// The schema is compiled once and reused for every manifest visited during a
/// resolution.
pub struct ManifestLoader {
    schema_path: PathBuf,
    validator: jsonschema::Validator,
}

impl fmt::Debug for ManifestLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestLoader")
            .field("schema_path", &self.schema_path)
            .finish_non_exhaustive()
    }
}

impl ManifestLoader {
    /// Compile the schema stored at `schema_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Schema`] if the file is missing, is not JSON,
    /// or is not a valid Draft-04 schema.
    pub fn new(schema_path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(schema_path).map_err(|e| ManifestError::Schema {
            path: schema_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let schema: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| ManifestError::Schema {
                path: schema_path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_schema(&schema, schema_path)
    }

    /// Compile an already-parsed schema; `origin` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Schema`] if `schema` is not a valid Draft-04
    /// schema.
    pub fn from_schema(schema: &serde_json::Value, origin: &Path) -> Result<Self> {
        let validator = jsonschema::draft4::new(schema).map_err(|e| ManifestError::Schema {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            schema_path: origin.to_path_buf(),
            validator,
        })
    }

    /// Path of the schema this loader validates against.
    #[must_use]
    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Read, validate, and deserialize the manifest at `path`.
    ///
    /// Validation happens on the raw JSON tree before any field is read, and
    /// every violation is reported rather than just the first.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`], [`ManifestError::Parse`], or
    /// [`ManifestError::SchemaValidation`].
    pub fn load(&self, path: &Path) -> Result<ManifestDocument> {
        if !path.is_file() {
            return Err(ManifestError::NotFound(path.to_path_buf()).into());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let violations: Vec<String> = self
            .validator
            .iter_errors(&value)
            .map(|e| e.to_string())
            .collect();
        if !violations.is_empty() {
            return Err(ManifestError::SchemaValidation {
                path: path.to_path_buf(),
                violations,
            }
            .into());
        }

        let doc = serde_json::from_value(value).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("loaded manifest {}", path.display());
        Ok(doc)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::manifest::BUNDLED_SCHEMA;

    fn bundled_loader() -> ManifestLoader {
        let schema: serde_json::Value = serde_json::from_str(BUNDLED_SCHEMA).unwrap();
        ManifestLoader::from_schema(&schema, Path::new("schema.json")).unwrap()
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "root.snix",
            r#"{"items":[{"names":["wget","jq"],"via":"brew"}],"repos":["git@host:a/b.git"]}"#,
        );
        let doc = bundled_loader().load(&path).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.repos, vec!["git@host:a/b.git"]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = bundled_loader()
            .load(&dir.path().join("nope.snix"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn directory_is_not_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = bundled_loader().load(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.snix", "{ \"items\": [");
        let err = bundled_loader().load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn item_without_via_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "m.snix", r#"{"items":[{"names":["wget"]}]}"#);
        let err = bundled_loader().load(&path).unwrap_err();
        match err.downcast_ref::<ManifestError>() {
            Some(ManifestError::SchemaValidation { violations, .. }) => {
                assert_eq!(violations.len(), 1);
                assert!(violations[0].contains("via"), "got: {violations:?}");
            }
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn every_violation_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "m.snix",
            r#"{"items":[{"names":["wget"]}],"repos":[42],"unknown":true}"#,
        );
        let err = bundled_loader().load(&path).unwrap_err();
        match err.downcast_ref::<ManifestError>() {
            Some(ManifestError::SchemaValidation { violations, .. }) => {
                assert!(violations.len() >= 3, "got: {violations:?}");
            }
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn missing_schema_file_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestLoader::new(&dir.path().join("schema.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Schema { .. })
        ));
    }

    #[test]
    fn schema_that_is_not_a_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "schema.json", r#"{"type": 12}"#);
        let err = ManifestLoader::new(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ManifestError>(),
            Some(ManifestError::Schema { .. })
        ));
    }
}
