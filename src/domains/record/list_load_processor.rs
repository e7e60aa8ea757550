use serde_json::Value;

use crate::domains::record::types::Record;

/// Enriches a fetched record with computed fields before it leaves a listing.
pub trait ListLoadProcessor: Send + Sync {
    fn process(&self, record: &mut Record);
}

/// A single derived-field rule
pub trait FieldLoader: Send + Sync {
    fn load(&self, record: &mut Record);
}

/// Runs every registered loader in registration order.
pub struct FieldListLoadProcessor {
    loaders: Vec<Box<dyn FieldLoader>>,
}

impl FieldListLoadProcessor {
    pub fn new(loaders: Vec<Box<dyn FieldLoader>>) -> Self {
        Self { loaders }
    }
}

impl Default for FieldListLoadProcessor {
    fn default() -> Self {
        Self::new(vec![Box::new(PersonNameLoader), Box::new(EmailAddressLoader)])
    }
}

impl ListLoadProcessor for FieldListLoadProcessor {
    fn process(&self, record: &mut Record) {
        for loader in &self.loaders {
            loader.load(record);
        }
    }
}

/// Fills an empty `name` from `salutationName`, `firstName` and `lastName`.
pub struct PersonNameLoader;

impl FieldLoader for PersonNameLoader {
    fn load(&self, record: &mut Record) {
        if record.name.as_deref().is_some_and(|n| !n.trim().is_empty()) {
            return;
        }

        let parts: Vec<&str> = ["salutationName", "firstName", "lastName"]
            .iter()
            .filter_map(|key| record.get_str(key))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if !parts.is_empty() {
            record.name = Some(parts.join(" "));
        }
    }
}

/// Sets `emailAddress` to the primary entry of `emailAddressData`.
///
/// `emailAddressData` is a list of `{"emailAddress": "...", "primary": bool}`;
/// without a primary flag the first entry wins.
pub struct EmailAddressLoader;

impl FieldLoader for EmailAddressLoader {
    fn load(&self, record: &mut Record) {
        if record.get_str("emailAddress").is_some() {
            return;
        }
        let Some(Value::Array(entries)) = record.get("emailAddressData") else {
            return;
        };

        let primary = entries
            .iter()
            .find(|e| e.get("primary").and_then(Value::as_bool).unwrap_or(false))
            .or_else(|| entries.first())
            .and_then(|e| e.get("emailAddress"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase());

        if let Some(address) = primary {
            record.set("emailAddress", Value::String(address));
        }
    }
}
