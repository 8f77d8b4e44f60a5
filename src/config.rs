//! Store configuration via `jsonstore.toml`
//!
//! On first open of a data directory, a default `jsonstore.toml` is
//! created next to the database file. To change settings, edit the file
//! and reopen.

use std::path::Path;

use jsonstore_core::{Error, Limits, NullPolicy, Result, DECODABLE_NESTING_DEPTH};
use jsonstore_storage::validate_table_name;
use serde::{Deserialize, Serialize};

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "jsonstore.toml";

/// Default table for object rows.
pub const DEFAULT_OBJECT_TABLE: &str = "objectstore";

/// Default table for array rows.
pub const DEFAULT_ARRAY_TABLE: &str = "arraystore";

/// Store configuration loaded from `jsonstore.toml`.
///
/// # Example
///
/// ```toml
/// object_table = "objectstore"
/// array_table = "arraystore"
/// null_policy = "marker"
///
/// [limits]
/// max_nesting_depth = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Table holding object rows.
    #[serde(default = "default_object_table")]
    pub object_table: String,
    /// Table holding array rows.
    #[serde(default = "default_array_table")]
    pub array_table: String,
    /// How `null` members are written: `"marker"` or `"literal"`.
    #[serde(default)]
    pub null_policy: NullPolicy,
    /// Size limits checked before decomposition.
    #[serde(default)]
    pub limits: Limits,
}

fn default_object_table() -> String {
    DEFAULT_OBJECT_TABLE.to_string()
}

fn default_array_table() -> String {
    DEFAULT_ARRAY_TABLE.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            object_table: default_object_table(),
            array_table: default_array_table(),
            null_policy: NullPolicy::default(),
            limits: Limits::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# jsonstore configuration
#
# Tables holding object and array rows. Must be plain SQL identifiers.
object_table = "objectstore"
array_table = "arraystore"

# How null members are stored: "marker" (default) or "literal"
#   "marker"  = no text and no digest in the row
#   "literal" = the text "null" and its digest
null_policy = "marker"

# Limits checked before a container is decomposed.
[limits]
max_nesting_depth = 100
max_document_bytes = 16777216
max_members = 1000000
"#
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Check table names and limits.
    pub fn validate(&self) -> Result<()> {
        for table in [&self.object_table, &self.array_table] {
            validate_table_name(table).map_err(|e| Error::Config(e.to_string()))?;
        }
        if self.object_table == self.array_table {
            return Err(Error::Config(format!(
                "object_table and array_table must differ (both '{}')",
                self.object_table
            )));
        }
        if self.limits.max_nesting_depth == 0 {
            return Err(Error::Config("limits.max_nesting_depth must be at least 1".into()));
        }
        if self.limits.max_nesting_depth > DECODABLE_NESTING_DEPTH {
            return Err(Error::Config(format!(
                "limits.max_nesting_depth must be at most {} (got {})",
                DECODABLE_NESTING_DEPTH, self.limits.max_nesting_depth
            )));
        }
        Ok(())
    }
}
