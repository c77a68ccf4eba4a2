// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog configuration
//!
//! Connection-level switches that shape how the dictionary caches behave.
//! The host hands its plugin settings to [`CatalogConfig::from_settings`];
//! every cache then receives the derived [`CacheOptions`] at construction, so
//! no switch is read from process-wide state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use sqlnav_catalog::CatalogConfig;
//!
//! let config = CatalogConfig::from_settings(&json!({
//!     "sqlnav": { "readAllSynonyms": false, "fetchSize": 500 }
//! }))?;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;
use crate::key::KeyCase;

/// What a cache does when its load query fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadPolicy {
    /// Every fetch error reaches the caller
    #[default]
    Strict,
    /// Recoverable errors (see [`CatalogError::is_recoverable`]) degrade to an
    /// empty, loaded collection
    Lenient,
}

/// Per-cache behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheOptions {
    /// Identifier comparison policy
    pub key_case: KeyCase,
    /// Fetch error handling
    pub read_policy: ReadPolicy,
    /// Whether composite objects without any detail row are kept
    pub allow_empty_details: bool,
}

impl CacheOptions {
    pub fn new(key_case: KeyCase) -> Self {
        Self {
            key_case,
            ..Default::default()
        }
    }

    /// Builder method: set read policy
    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    /// Builder method: keep composite objects that have no details
    pub fn with_empty_details(mut self, allow: bool) -> Self {
        self.allow_empty_details = allow;
        self
    }
}

/// Catalog configuration for one connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    /// Compare identifiers exactly instead of ignoring ASCII case
    pub case_sensitive_identifiers: bool,

    /// List every synonym of a schema; when off only synonyms that point at
    /// tables and views are listed
    pub read_all_synonyms: bool,

    /// Treat permission-gated dictionary views (triggers) as empty instead of
    /// failing the listing
    pub recover_restricted_views: bool,

    /// Keep constraints that report no key columns (check constraints)
    pub allow_empty_constraints: bool,

    /// Show schemas maintained by the vendor
    pub show_system_schemas: bool,

    /// Schemas never listed, whatever `show_system_schemas` says
    pub hidden_schemas: Vec<String>,

    /// Row prefetch hint passed with every catalog statement
    pub fetch_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            case_sensitive_identifiers: false,
            read_all_synonyms: true,
            recover_restricted_views: true,
            allow_empty_constraints: true,
            show_system_schemas: false,
            hidden_schemas: Vec::new(),
            fetch_size: 200,
        }
    }
}

impl CatalogConfig {
    /// Parse the catalog section of the host's plugin settings.
    ///
    /// Expected shape:
    /// {
    ///   "sqlnav": {
    ///     "caseSensitiveIdentifiers": false,
    ///     "readAllSynonyms": true,
    ///     "fetchSize": 200
    ///   }
    /// }
    ///
    /// A missing section yields the defaults; unknown keys are ignored.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let config = match settings.get("sqlnav") {
            Some(section) => serde_json::from_value::<CatalogConfig>(section.clone())
                .map_err(|e| ConfigError::InvalidSettings {
                    reason: e.to_string(),
                })?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_size == 0 {
            return Err(ConfigError::InvalidFetchSize);
        }

        if let Some(blank) = self.hidden_schemas.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidSettings {
                reason: format!("hidden schema name cannot be blank: {:?}", blank),
            });
        }

        Ok(())
    }

    pub fn key_case(&self) -> KeyCase {
        if self.case_sensitive_identifiers {
            KeyCase::Sensitive
        } else {
            KeyCase::Insensitive
        }
    }

    /// Base options for every cache of this connection
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::new(self.key_case())
    }

    /// Read policy for permission-gated views
    pub fn restricted_read_policy(&self) -> ReadPolicy {
        if self.recover_restricted_views {
            ReadPolicy::Lenient
        } else {
            ReadPolicy::Strict
        }
    }

    /// Whether a schema is hidden from listings
    pub fn is_schema_hidden(&self, name: &str, is_system: bool) -> bool {
        if is_system && !self.show_system_schemas {
            return true;
        }
        let case = self.key_case();
        self.hidden_schemas.iter().any(|h| case.names_eq(h, name))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Fetch size must be positive
    #[error("fetchSize must be greater than 0")]
    InvalidFetchSize,

    /// Settings payload could not be read
    #[error("Invalid catalog settings: {reason}")]
    InvalidSettings { reason: String },

    /// Catalog-related error
    #[error("Catalog error: {0}")]
    CatalogError(#[from] CatalogError),
}
