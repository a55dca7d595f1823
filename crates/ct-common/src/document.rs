//! The census document model.
//!
//! A census document is a flat mapping from section name to an arbitrary
//! JSON value. Each provider owns a fixed set of top-level section names and
//! writes each of them exactly once per run. Section ownership is a
//! design-time contract: no two providers may claim the same name.
//!
//! The builder is exclusively owned by the run loop and passed `&mut` to
//! each provider in turn; once built, the document is immutable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An immutable, fully populated census document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CensusDocument {
    sections: BTreeMap<String, Value>,
}

impl CensusDocument {
    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Iterate over (name, value) pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.sections.iter()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Serialize to a JSON byte vector (the wire and audit format).
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Builder used by providers to populate the census document.
#[derive(Debug, Default)]
pub struct CensusBuilder {
    sections: BTreeMap<String, Value>,
}

impl CensusBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a section value under a provider-owned name.
    ///
    /// Duplicate names indicate two providers claiming the same section,
    /// which violates the key-ownership contract. This is asserted in debug
    /// builds; in release builds the later write wins, matching the
    /// last-write semantics of a plain map.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let prior = self.sections.insert(name.clone(), value);
        debug_assert!(prior.is_none(), "duplicate census section: {name}");
    }

    /// Serialize a value and insert it as a section.
    pub fn insert_serialized<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<()> {
        self.insert(name, serde_json::to_value(value)?);
        Ok(())
    }

    /// Whether a section with this name has already been written.
    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Number of sections written so far.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Finalize into an immutable document.
    pub fn build(self) -> CensusDocument {
        CensusDocument {
            sections: self.sections,
        }
    }
}
