// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry configuration.
//!
//! Supports both programmatic and file-based configuration (TOML, YAML or
//! JSON, picked from the file extension).

use crate::facts::{TypeName, Visibility, ROOT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root "any" type. Never gets a no-argument strategy and is the default
    /// element/key/value type of unparameterized containers.
    #[serde(default = "default_root_type")]
    pub root_type: TypeName,

    /// Types never treated as beans.
    #[serde(default)]
    pub not_bean_types: BTreeSet<TypeName>,

    /// Minimum visibility of the no-argument constructor a bean needs.
    #[serde(default = "default_bean_constructor_visibility")]
    pub bean_constructor_visibility: Visibility,

    /// Reject types without any bean property.
    #[serde(default = "default_true")]
    pub require_bean_properties: bool,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Concrete types used to construct abstract or interface types.
    #[serde(default)]
    pub implementations: BTreeMap<TypeName, TypeName>,
}

fn default_root_type() -> TypeName {
    TypeName::from(ROOT_TYPE)
}

fn default_bean_constructor_visibility() -> Visibility {
    Visibility::Public
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root_type: default_root_type(),
            not_bean_types: BTreeSet::new(),
            bean_constructor_visibility: Visibility::Public,
            require_bean_properties: true,
            log_level: "info".to_string(),
            implementations: BTreeMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a `.toml`, `.yaml`/`.yml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let config: Self = match ext.as_str() {
            "toml" => toml::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Use `implementation` when constructing `abstract_type`.
    #[must_use]
    pub fn implementation(
        mut self,
        abstract_type: impl Into<TypeName>,
        implementation: impl Into<TypeName>,
    ) -> Self {
        self.implementations
            .insert(abstract_type.into(), implementation.into());
        self
    }

    #[must_use]
    pub fn not_bean(mut self, name: impl Into<TypeName>) -> Self {
        self.not_bean_types.insert(name.into());
        self
    }

    #[must_use]
    pub fn root_type(mut self, name: impl Into<TypeName>) -> Self {
        self.root_type = name.into();
        self
    }

    #[must_use]
    pub fn bean_constructor_visibility(mut self, visibility: Visibility) -> Self {
        self.bean_constructor_visibility = visibility;
        self
    }

    #[must_use]
    pub fn require_bean_properties(mut self, require: bool) -> Self {
        self.require_bean_properties = require;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_type.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("Root type name is empty".into()));
        }

        for (abstract_type, implementation) in &self.implementations {
            if abstract_type == implementation {
                return Err(ConfigError::Invalid(format!(
                    "Type '{}' is configured as its own implementation",
                    abstract_type
                )));
            }
            if implementation.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Type '{}' has an empty implementation name",
                    abstract_type
                )));
            }
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Unknown log level '{}' (expected one of {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.root_type.as_str(), "Object");
        assert!(config.require_bean_properties);
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let config = RegistryConfig::from_toml_str(
            r#"
            not_bean_types = ["Handle"]

            [implementations]
            Shape = "Circle"
            "#,
        )
        .expect("valid toml");
        assert_eq!(
            config.implementations.get("Shape").map(TypeName::as_str),
            Some("Circle")
        );
        assert!(config.not_bean_types.contains("Handle"));
        assert_eq!(config.bean_constructor_visibility, Visibility::Public);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_self_implementation() {
        let config = RegistryConfig::default().implementation("Shape", "Shape");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let config = RegistryConfig {
            log_level: "verbose".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");

        let yaml = dir.path().join("registry.yaml");
        std::fs::write(
            &yaml,
            "root_type: Any\nbean_constructor_visibility: protected\nrequire_bean_properties: false\n",
        )
        .expect("write yaml");
        let config = RegistryConfig::from_file(&yaml).expect("yaml config");
        assert_eq!(config.root_type.as_str(), "Any");
        assert_eq!(config.bean_constructor_visibility, Visibility::Protected);
        assert!(!config.require_bean_properties);

        let json = dir.path().join("registry.json");
        let mut file = std::fs::File::create(&json).expect("create json");
        writeln!(file, r#"{{ "not_bean_types": ["Socket"], "log_level": "debug" }}"#)
            .expect("write json");
        let config = RegistryConfig::from_file(&json).expect("json config");
        assert!(config.not_bean_types.contains("Socket"));

        let ini = dir.path().join("registry.ini");
        std::fs::write(&ini, "").expect("write ini");
        assert!(matches!(
            RegistryConfig::from_file(&ini),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip_of_generated_config() {
        let config = RegistryConfig::default()
            .implementation("List", "ArrayList")
            .not_bean("Thread");
        let text = config.to_toml_string().expect("serialize");
        let back = RegistryConfig::from_toml_str(&text).expect("parse back");
        assert_eq!(back, config);
    }
}
