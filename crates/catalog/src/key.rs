// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Cache keys
//!
//! Every cached object is identified by a [`CacheKey`]. Whether two keys are
//! equal depends on the owning cache's [`KeyCase`]: the dictionary stores
//! unquoted identifiers upper-cased, so most caches compare case-insensitively.

use serde::{Deserialize, Serialize};

/// Identifier comparison policy of one cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyCase {
    /// Exact, byte-wise comparison
    Sensitive,
    /// ASCII case-insensitive comparison
    #[default]
    Insensitive,
}

impl KeyCase {
    /// Compare two identifiers under this policy
    pub fn names_eq(&self, a: &str, b: &str) -> bool {
        match self {
            KeyCase::Sensitive => a == b,
            KeyCase::Insensitive => a.eq_ignore_ascii_case(b),
        }
    }

    /// Normalize an identifier so that equal identifiers hash equally
    pub fn fold(&self, name: &str) -> String {
        match self {
            KeyCase::Sensitive => name.to_string(),
            KeyCase::Insensitive => name.to_ascii_uppercase(),
        }
    }
}

/// Identity of a cached object: a plain name or an `(owner, name)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    Name(String),
    Qualified { owner: String, name: String },
}

impl CacheKey {
    pub fn name(name: impl Into<String>) -> Self {
        CacheKey::Name(name.into())
    }

    pub fn qualified(owner: impl Into<String>, name: impl Into<String>) -> Self {
        CacheKey::Qualified {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The object-name part of the key
    pub fn object_name(&self) -> &str {
        match self {
            CacheKey::Name(name) => name,
            CacheKey::Qualified { name, .. } => name,
        }
    }

    /// Compare with another key under `case`
    pub fn matches(&self, other: &CacheKey, case: KeyCase) -> bool {
        match (self, other) {
            (CacheKey::Name(a), CacheKey::Name(b)) => case.names_eq(a, b),
            (
                CacheKey::Qualified { owner: oa, name: na },
                CacheKey::Qualified { owner: ob, name: nb },
            ) => case.names_eq(oa, ob) && case.names_eq(na, nb),
            _ => false,
        }
    }

    /// Normalized copy for use as a map key
    pub fn folded(&self, case: KeyCase) -> CacheKey {
        match self {
            CacheKey::Name(name) => CacheKey::Name(case.fold(name)),
            CacheKey::Qualified { owner, name } => CacheKey::Qualified {
                owner: case.fold(owner),
                name: case.fold(name),
            },
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Name(name) => write!(f, "{}", name),
            CacheKey::Qualified { owner, name } => write!(f, "{}.{}", owner, name),
        }
    }
}

/// An object that can live in a catalog cache
pub trait CatalogObject: Send + Sync + 'static {
    /// Display name, used for by-name lookups
    fn name(&self) -> &str;

    /// Identity used when merging reloads; defaults to the name
    fn key(&self) -> CacheKey {
        CacheKey::Name(self.name().to_string())
    }
}
