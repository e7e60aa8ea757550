use std::collections::HashMap;
use std::sync::Arc;

use crate::domains::record::types::Record;

/// Attributes never returned to callers, whatever the entity type.
const INTERNAL_ATTRIBUTES: &[&str] = &["password", "passwordHash", "authToken", "deleted"];

/// Strips or reshapes attributes unsuitable for external output.
pub trait RecordOutputPreparer: Send + Sync {
    fn prepare_for_output(&self, record: &mut Record);
}

/// Removes internal attributes, `_`-prefixed keys and a per-type forbidden list.
#[derive(Debug, Clone, Default)]
pub struct DefaultOutputPreparer {
    forbidden_attributes: Vec<String>,
}

impl DefaultOutputPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forbidden(attributes: &[&str]) -> Self {
        Self {
            forbidden_attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl RecordOutputPreparer for DefaultOutputPreparer {
    fn prepare_for_output(&self, record: &mut Record) {
        record.attributes.retain(|key, _| {
            !key.starts_with('_')
                && !INTERNAL_ATTRIBUTES.contains(&key.as_str())
                && !self.forbidden_attributes.iter().any(|f| f == key)
        });
    }
}

/// Per-entity-type preparers, falling back to a shared default.
pub struct RecordServiceContainer {
    preparers: HashMap<String, Arc<dyn RecordOutputPreparer>>,
    fallback: Arc<dyn RecordOutputPreparer>,
}

impl RecordServiceContainer {
    pub fn new(fallback: Arc<dyn RecordOutputPreparer>) -> Self {
        Self {
            preparers: HashMap::new(),
            fallback,
        }
    }

    pub fn register(mut self, entity_type: &str, preparer: Arc<dyn RecordOutputPreparer>) -> Self {
        self.preparers.insert(entity_type.to_string(), preparer);
        self
    }

    pub fn get(&self, entity_type: &str) -> Arc<dyn RecordOutputPreparer> {
        self.preparers
            .get(entity_type)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for RecordServiceContainer {
    fn default() -> Self {
        Self::new(Arc::new(DefaultOutputPreparer::new()))
            .register("User", Arc::new(DefaultOutputPreparer::with_forbidden(&["apiKey", "secretKey"])))
    }
}
