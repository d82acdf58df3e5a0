//! Deterministic surrogate identifiers
//!
//! Maps `(original, category)` to a name-based version-5 UUID under a
//! fixed application namespace. The same sensitive token therefore maps to
//! the same surrogate across documents, runs and processes, so anonymised
//! records stay correlatable without being reversible. The key is
//! lowercased (no Unicode normalisation form is applied), making
//! occurrence identity case-insensitive.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

const APPLICATION_NAMESPACE: &str = "document-anonymization";

/// One `(original, category) → uuid` binding held by the mapper
#[derive(Debug, Clone, Serialize)]
pub struct SurrogateBinding {
    pub original: String,
    pub category: String,
    pub uuid: String,
}

/// Deterministic `original → uuid` mapper with a process-wide cache
///
/// The cache is the only state shared across documents within a process;
/// insertion is idempotent, so concurrent writers of the same key agree.
#[derive(Debug)]
pub struct SurrogateMapper {
    namespace: Uuid,
    cache: RwLock<HashMap<(String, String), String>>,
}

impl SurrogateMapper {
    /// Mapper under the fixed application namespace
    pub fn new() -> Self {
        Self::with_namespace(Uuid::new_v5(
            &Uuid::NAMESPACE_DNS,
            APPLICATION_NAMESPACE.as_bytes(),
        ))
    }

    /// Mapper under an explicit namespace
    pub fn with_namespace(namespace: Uuid) -> Self {
        Self {
            namespace,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Canonical hyphenated surrogate for `(original, category)`.
    /// Deterministic and idempotent within and across processes.
    pub fn uuid_for(&self, original: &str, category: &str) -> String {
        let key = (original.to_lowercase(), category.to_string());

        if let Some(existing) = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return existing.clone();
        }

        let name = format!("{}_{}", key.0, category);
        let uuid = Uuid::new_v5(&self.namespace, name.as_bytes()).to_string();

        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_insert_with(|| uuid.clone());
        uuid
    }

    /// Snapshot of every binding, for ledger generation
    pub fn bindings(&self) -> Vec<SurrogateBinding> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let mut bindings: Vec<SurrogateBinding> = cache
            .iter()
            .map(|((original, category), uuid)| SurrogateBinding {
                original: original.clone(),
                category: category.clone(),
                uuid: uuid.clone(),
            })
            .collect();
        bindings.sort_by(|a, b| (&a.category, &a.original).cmp(&(&b.category, &b.original)));
        bindings
    }

    /// Number of cached bindings
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SurrogateMapper {
    fn default() -> Self {
        Self::new()
    }
}
