//! Observed-State Indexer
//!
//! Observed objects come back from the caller exactly as the backing
//! controller reported them. Anything that cannot be keyed is treated as
//! not existing yet.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::composite::ObservedResource;
use crate::config::RendererConfig;
use crate::keys::LogicalKey;

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedEntry {
    pub external_name: Option<String>,
    pub ready: bool,
    /// `status.atProvider`, or `Value::Null` when the controller has not reported it.
    pub at_provider: Value,
}

impl ObservedEntry {
    /// Identifier for binding: the kind's own field, then external name, then `atProvider.id`.
    pub fn identifier(&self, field: Option<&str>) -> Option<String> {
        field
            .and_then(|f| self.at_provider.get(f))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.external_name.clone())
            .or_else(|| {
                self.at_provider
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservedIndex {
    entries: BTreeMap<LogicalKey, ObservedEntry>,
    skipped: usize,
}

impl ObservedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resources(resources: &[ObservedResource], config: &RendererConfig) -> Self {
        let mut index = Self::new();

        for resource in resources {
            let annotations = resource
                .pointer("/metadata/annotations")
                .and_then(Value::as_object);

            let key = annotations
                .and_then(|a| a.get(&config.naming_annotation))
                .and_then(Value::as_str)
                .and_then(LogicalKey::from_observed);

            let Some(key) = key else {
                index.skipped += 1;
                tracing::warn!(
                    annotation = %config.naming_annotation,
                    "Observed resource has no naming marker, treating as absent"
                );
                continue;
            };

            let external_name = annotations
                .and_then(|a| a.get(&config.external_name_annotation))
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string);

            let entry = ObservedEntry {
                external_name,
                ready: is_ready(resource),
                at_provider: resource
                    .pointer("/status/atProvider")
                    .cloned()
                    .unwrap_or(Value::Null),
            };

            if index.entries.insert(key.clone(), entry).is_some() {
                tracing::debug!(key = %key, "Duplicate observed key, keeping the last one");
            }
        }

        index
    }

    pub fn get(&self, key: &LogicalKey) -> Option<&ObservedEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of observed objects dropped for lacking a usable naming marker.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn is_ready(resource: &Value) -> bool {
    resource
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .map_or(false, |conditions| {
            conditions.iter().any(|c| {
                c.get("type").and_then(Value::as_str) == Some("Ready")
                    && c.get("status").and_then(Value::as_str) == Some("True")
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observed(key: &str, external: Option<&str>, ready: bool) -> Value {
        let mut annotations = json!({"crossplane.io/composition-resource-name": key});
        if let Some(name) = external {
            annotations["crossplane.io/external-name"] = json!(name);
        }
        json!({
            "metadata": {"annotations": annotations},
            "status": {
                "atProvider": {"groupId": "g-123"},
                "conditions": [{"type": "Ready", "status": if ready { "True" } else { "False" }}]
            }
        })
    }

    #[test]
    fn test_empty_list_yields_empty_index() {
        let index = ObservedIndex::from_resources(&[], &RendererConfig::default());
        assert!(index.is_empty());
        assert_eq!(index.skipped(), 0);
    }

    #[test]
    fn test_indexes_by_naming_marker() {
        let resources = vec![observed("identity-center-group-ops", Some("ext-1"), true)];
        let index = ObservedIndex::from_resources(&resources, &RendererConfig::default());

        let entry = index.get(&LogicalKey::group("ops")).unwrap();
        assert!(entry.ready);
        assert_eq!(entry.external_name.as_deref(), Some("ext-1"));
        assert_eq!(entry.identifier(Some("groupId")).as_deref(), Some("g-123"));
        assert_eq!(entry.identifier(None).as_deref(), Some("ext-1"));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let resources = vec![
            json!({"metadata": {}}),
            json!("not an object"),
            observed("   ", None, true),
            observed("permission-set-admin", None, false),
        ];
        let index = ObservedIndex::from_resources(&resources, &RendererConfig::default());

        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped(), 3);
        assert!(!index.get(&LogicalKey::permission_set("admin")).unwrap().ready);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let resources = vec![
            observed("identity-center-group-ops", Some("first"), false),
            observed("identity-center-group-ops", Some("second"), true),
        ];
        let index = ObservedIndex::from_resources(&resources, &RendererConfig::default());

        let entry = index.get(&LogicalKey::group("ops")).unwrap();
        assert_eq!(entry.external_name.as_deref(), Some("second"));
        assert!(entry.ready);
    }
}
