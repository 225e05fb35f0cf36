//! Partial updates.
//!
//! A patch is a JSON object shallow-merged over the current value. The merged value is
//! re-parsed and validated as a whole, then only the patched fields are written back with
//! an atomic field set, so concurrent patches of different fields do not overwrite each
//! other.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    error::{CatalogError, CatalogResult},
    models::Validate,
};

#[derive(Debug, Clone)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    /// Parses a patch body. Keys listed in `immutable` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if `body` is not a JSON object.
    pub fn parse(body: Value, immutable: &[&str]) -> CatalogResult<Self> {
        let Value::Object(mut fields) = body else {
            return Err(CatalogError::validation("update body must be a JSON object"));
        };

        for key in immutable {
            if fields.remove(*key).is_some() {
                tracing::debug!(field = *key, "ignoring update of immutable field");
            }
        }

        Ok(Self { fields })
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sets a field regardless of the immutable list, e.g. a modification timestamp.
    pub fn set(&mut self, field: &str, value: impl Serialize) -> CatalogResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| CatalogError::validation(e.to_string()))?;

        self.fields.insert(field.to_string(), value);
        Ok(())
    }

    /// Merges the patch over `current` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if the merged value does not parse as `T` or
    /// violates its invariants.
    pub fn apply<T>(&self, current: &T) -> CatalogResult<T>
    where
        T: Serialize + DeserializeOwned + Validate,
    {
        let mut merged = serde_json::to_value(current)
            .map_err(|e| CatalogError::validation(e.to_string()))?;

        if let Value::Object(target) = &mut merged {
            for (key, value) in &self.fields {
                target.insert(key.clone(), value.clone());
            }
        }

        let merged = serde_json::from_value::<T>(merged)
            .map_err(|e| CatalogError::validation(format!("invalid update: {e}")))?;
        merged.validate()?;

        Ok(merged)
    }

    /// Storage representation of the patched fields of `merged`.
    ///
    /// Keys the target type does not know are not part of the result.
    pub fn changed_fields<T: Serialize>(&self, merged: &T) -> CatalogResult<bson::Document> {
        let bson::Bson::Document(stored) = bson::ser::serialize_to_bson(merged)? else {
            return Err(CatalogError::validation("update target is not a document"));
        };

        Ok(stored
            .into_iter()
            .filter(|(key, _)| self.fields.contains_key(key))
            .collect())
    }
}
