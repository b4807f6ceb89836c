//! Context Builder - One Defaulting Pass
//!
//! Every optional composite field gets a concrete value here so that no
//! render stage ever branches on presence.

use std::collections::BTreeMap;

use crate::composite::{CompositeSpec, TagMap};
use crate::config::RendererConfig;

/// Read-only values shared by every stage of one pass.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub spec: &'a CompositeSpec,
    pub composite_name: String,
    pub organization_name: String,
    pub management_policies: Vec<String>,
    pub provider_config_name: String,
    pub instance_arn: Option<String>,
    /// `None` means principals are not managed in this pass.
    pub identity_store_id: Option<String>,
    /// Base layer overwritten by the composite's own tags.
    pub tags: TagMap,
    pub default_session_duration: String,
}

impl<'a> RenderContext<'a> {
    pub fn build(composite_name: &str, spec: &'a CompositeSpec, config: &RendererConfig) -> Self {
        let organization_name = non_empty(spec.organization_name.as_deref())
            .unwrap_or(composite_name)
            .to_string();

        let management_policies = match &spec.management_policies {
            Some(policies) if !policies.is_empty() => policies.clone(),
            _ => config.default_management_policies.clone(),
        };

        let provider_config_name = non_empty(
            spec.provider_config_ref
                .as_ref()
                .and_then(|r| r.name.as_deref()),
        )
        .unwrap_or(composite_name)
        .to_string();

        let instance_arn = non_empty(
            spec.identity_center
                .as_ref()
                .and_then(|ic| ic.instance_arn.as_deref()),
        )
        .map(str::to_string);

        let identity_store_id = non_empty(
            spec.identity_store
                .as_ref()
                .and_then(|store| store.id.as_deref()),
        )
        .map(str::to_string);

        let mut base = config.base_tags.clone();
        base.insert("organization".to_string(), organization_name.clone());
        let tags = merge_tags(&base, &spec.tags);

        Self {
            spec,
            composite_name: composite_name.to_string(),
            organization_name,
            management_policies,
            provider_config_name,
            instance_arn,
            identity_store_id,
            tags,
            default_session_duration: config.default_session_duration.clone(),
        }
    }

    pub fn manages_principals(&self) -> bool {
        self.identity_store_id.is_some()
    }

    /// Composite tags overlaid with one resource's own overrides.
    pub fn tags_for(&self, overrides: &TagMap) -> TagMap {
        merge_tags(&self.tags, overrides)
    }

    pub fn group_declared(&self, name: &str) -> bool {
        self.spec.groups.iter().any(|g| g.name == name)
    }

    pub fn user_declared(&self, name: &str) -> bool {
        self.spec.users.iter().any(|u| u.name == name)
    }

    pub fn permission_set_declared(&self, name: &str) -> bool {
        self.spec.permission_sets.iter().any(|ps| ps.name == name)
    }
}

/// Overwrite-by-key; values are flat strings so there is nothing to deep-merge.
pub fn merge_tags(base: &TagMap, overrides: &TagMap) -> TagMap {
    let mut merged: BTreeMap<String, String> = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{IdentityStoreRef, ProviderConfigRef};

    #[test]
    fn test_defaults_come_from_composite_name() {
        let spec = CompositeSpec::default();
        let ctx = RenderContext::build("acme", &spec, &RendererConfig::default());

        assert_eq!(ctx.organization_name, "acme");
        assert_eq!(ctx.provider_config_name, "acme");
        assert_eq!(ctx.management_policies, vec!["*".to_string()]);
        assert!(!ctx.manages_principals());
        assert_eq!(ctx.tags.get("organization").map(String::as_str), Some("acme"));
        assert_eq!(ctx.tags.get("managed-by").map(String::as_str), Some("idc-render"));
    }

    #[test]
    fn test_explicit_values_win() {
        let spec = CompositeSpec {
            organization_name: Some("Acme Corp".into()),
            management_policies: Some(vec!["Observe".into()]),
            provider_config_ref: Some(ProviderConfigRef { name: Some("aws-prod".into()) }),
            identity_store: Some(IdentityStoreRef { id: Some("d-1234567890".into()) }),
            tags: TagMap::from([("managed-by".to_string(), "platform".to_string())]),
            ..Default::default()
        };
        let ctx = RenderContext::build("acme", &spec, &RendererConfig::default());

        assert_eq!(ctx.organization_name, "Acme Corp");
        assert_eq!(ctx.provider_config_name, "aws-prod");
        assert_eq!(ctx.management_policies, vec!["Observe".to_string()]);
        assert_eq!(ctx.identity_store_id.as_deref(), Some("d-1234567890"));
        assert_eq!(ctx.tags.get("managed-by").map(String::as_str), Some("platform"));
    }

    #[test]
    fn test_blank_identity_store_is_unmanaged() {
        let spec = CompositeSpec {
            identity_store: Some(IdentityStoreRef { id: Some("  ".into()) }),
            ..Default::default()
        };
        let ctx = RenderContext::build("acme", &spec, &RendererConfig::default());
        assert!(!ctx.manages_principals());
    }

    #[test]
    fn test_resource_overrides_take_precedence() {
        let spec = CompositeSpec {
            tags: TagMap::from([("env".to_string(), "prod".to_string())]),
            ..Default::default()
        };
        let ctx = RenderContext::build("acme", &spec, &RendererConfig::default());
        let tags = ctx.tags_for(&TagMap::from([("env".to_string(), "sandbox".to_string())]));

        assert_eq!(tags.get("env").map(String::as_str), Some("sandbox"));
        assert_eq!(tags.get("organization").map(String::as_str), Some("acme"));
    }
}
