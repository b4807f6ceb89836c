//! Resource Drafts - The Pipeline's Output Items

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::composite::TagMap;
use crate::context::RenderContext;
use crate::keys::{LogicalKey, Reference, ResourceKind};
use crate::observed::ObservedIndex;
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfigName {
    pub name: String,
}

/// One desired managed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDraft {
    pub kind: ResourceKind,
    pub api_version: String,
    pub key: LogicalKey,
    pub for_provider: Map<String, Value>,
    #[serde(default)]
    pub references: BTreeMap<String, Reference>,
    pub management_policies: Vec<String>,
    pub provider_config_ref: ProviderConfigName,
    pub tags: TagMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
}

impl ResourceDraft {
    /// Start a draft carrying everything every managed resource must have.
    pub fn new(
        kind: ResourceKind,
        key: LogicalKey,
        ctx: &RenderContext<'_>,
        observed: &ObservedIndex,
        tags: TagMap,
    ) -> Self {
        let external_name = observed.get(&key).and_then(|entry| entry.external_name.clone());
        Self {
            kind,
            api_version: kind.api_version().to_string(),
            key,
            for_provider: Map::new(),
            references: BTreeMap::new(),
            management_policies: ctx.management_policies.clone(),
            provider_config_ref: ProviderConfigName {
                name: ctx.provider_config_name.clone(),
            },
            tags,
            external_name,
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.for_provider.insert(name.to_string(), value.into());
        self
    }

    /// Set only when present; absent optionals stay out of the manifest.
    pub fn optional_field(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    pub fn reference(mut self, name: &str, reference: Reference) -> Self {
        self.references.insert(name.to_string(), reference);
        self
    }
}

/// Ordered output list. A key may be drafted more than once only when every
/// draft under it is identical; each key remembers the declaration it came from.
#[derive(Debug, Default)]
pub struct DraftSet {
    drafts: Vec<ResourceDraft>,
    index: BTreeMap<LogicalKey, (usize, String)>,
}

impl DraftSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(false)` when an identical draft already holds the key.
    /// A different draft under a taken key is a configuration error naming
    /// both declarations.
    pub fn push(
        &mut self,
        draft: ResourceDraft,
        source: impl Into<String>,
    ) -> Result<bool, PipelineError> {
        let source = source.into();
        if let Some((position, existing)) = self.index.get(&draft.key) {
            if self.drafts[*position] == draft {
                tracing::debug!(key = %draft.key, source = %source, "Collapsing duplicate draft");
                return Ok(false);
            }
            return Err(PipelineError::Configuration(format!(
                "{} and {} both map to resource key '{}'",
                existing, source, draft.key
            )));
        }
        self.index
            .insert(draft.key.clone(), (self.drafts.len(), source));
        self.drafts.push(draft);
        Ok(true)
    }

    pub fn contains(&self, key: &LogicalKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDraft> {
        self.drafts.iter()
    }

    /// First in-pass reference whose target was never drafted, as `(from, to)`.
    pub fn dangling_reference(&self) -> Option<(&LogicalKey, &LogicalKey)> {
        self.drafts.iter().find_map(|draft| {
            draft
                .references
                .values()
                .filter_map(Reference::draft_key)
                .find(|target| !self.contains(target))
                .map(|target| (&draft.key, target))
        })
    }

    pub fn into_vec(self) -> Vec<ResourceDraft> {
        self.drafts
    }
}
