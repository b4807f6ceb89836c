//! Principal Renderer - groups, users and their memberships

use serde_json::{json, Map, Value};

use super::{resolve_principal, RenderStage};
use crate::context::RenderContext;
use crate::draft::{DraftSet, ResourceDraft};
use crate::keys::{LogicalKey, PrincipalKind, Reference, ResourceKind};
use crate::observed::ObservedIndex;
use crate::pipeline::PipelineError;

pub struct PrincipalStage;

impl RenderStage for PrincipalStage {
    fn name(&self) -> &'static str {
        "principals"
    }

    fn render(
        &self,
        ctx: &RenderContext<'_>,
        observed: &ObservedIndex,
        out: &mut DraftSet,
    ) -> Result<(), PipelineError> {
        let Some(store_id) = ctx.identity_store_id.as_deref() else {
            tracing::debug!("No identity store configured, skipping principals");
            return Ok(());
        };

        for group in &ctx.spec.groups {
            let draft = ResourceDraft::new(
                ResourceKind::Group,
                LogicalKey::group(&group.name),
                ctx,
                observed,
                ctx.tags_for(&group.tags),
            )
            .field("identityStoreId", store_id)
            .field(
                "displayName",
                group.display_name.as_deref().unwrap_or(&group.name),
            )
            .optional_field("description", group.description.as_deref());
            out.push(draft, format!("group '{}'", group.name))?;
        }

        for user in &ctx.spec.users {
            let user_key = LogicalKey::user(&user.name);

            let mut name = Map::new();
            if let Some(given) = &user.given_name {
                name.insert("givenName".to_string(), Value::from(given.as_str()));
            }
            if let Some(family) = &user.family_name {
                name.insert("familyName".to_string(), Value::from(family.as_str()));
            }

            let mut draft = ResourceDraft::new(
                ResourceKind::User,
                user_key.clone(),
                ctx,
                observed,
                ctx.tags_for(&user.tags),
            )
            .field("identityStoreId", store_id)
            .field("userName", user.name.as_str())
            .field("displayName", display_name(user));
            if !name.is_empty() {
                draft = draft.field("name", Value::Object(name));
            }
            if let Some(email) = &user.email {
                draft = draft.field("emails", json!([{ "value": email, "primary": true }]));
            }
            out.push(draft, format!("user '{}'", user.name))?;

            for group_name in &user.groups {
                let group_ref = resolve_principal(ctx, PrincipalKind::Group, group_name)?;
                let membership = ResourceDraft::new(
                    ResourceKind::GroupMembership,
                    LogicalKey::membership(&user.name, group_name),
                    ctx,
                    observed,
                    ctx.tags.clone(),
                )
                .field("identityStoreId", store_id)
                .reference("groupId", group_ref)
                .reference("memberId", Reference::draft(user_key.clone(), "userId"));
                out.push(
                    membership,
                    format!("membership of user '{}' in group '{}'", user.name, group_name),
                )?;
            }
        }

        Ok(())
    }
}

fn display_name(user: &crate::composite::UserDecl) -> String {
    if let Some(display) = &user.display_name {
        return display.clone();
    }
    let parts: Vec<&str> = [user.given_name.as_deref(), user.family_name.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        user.name.clone()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{CompositeSpec, GroupDecl, IdentityStoreRef, UserDecl};
    use crate::config::RendererConfig;

    fn spec() -> CompositeSpec {
        CompositeSpec {
            identity_store: Some(IdentityStoreRef {
                id: Some("d-1234567890".into()),
            }),
            groups: vec![GroupDecl {
                name: "ops".into(),
                description: Some("Operators".into()),
                ..Default::default()
            }],
            users: vec![UserDecl {
                name: "jane".into(),
                given_name: Some("Jane".into()),
                family_name: Some("Doe".into()),
                email: Some("jane@example.com".into()),
                groups: vec!["ops".into(), "ops".into()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn render(spec: &CompositeSpec) -> Result<Vec<ResourceDraft>, PipelineError> {
        let ctx = RenderContext::build("acme", spec, &RendererConfig::default());
        let mut out = DraftSet::new();
        PrincipalStage.render(&ctx, &ObservedIndex::new(), &mut out)?;
        Ok(out.into_vec())
    }

    #[test]
    fn test_renders_group_user_and_single_membership() {
        let drafts = render(&spec()).unwrap();
        let kinds: Vec<_> = drafts.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Group,
                ResourceKind::User,
                ResourceKind::GroupMembership
            ]
        );

        let user = &drafts[1];
        assert_eq!(user.for_provider["displayName"], "Jane Doe");
        assert_eq!(user.for_provider["name"]["familyName"], "Doe");
        assert_eq!(user.for_provider["emails"][0]["value"], "jane@example.com");

        let membership = &drafts[2];
        assert_eq!(
            membership.references["groupId"],
            Reference::draft(LogicalKey::group("ops"), "groupId")
        );
        assert_eq!(
            membership.references["memberId"],
            Reference::draft(LogicalKey::user("jane"), "userId")
        );
    }

    #[test]
    fn test_skipped_without_identity_store() {
        let mut spec = spec();
        spec.identity_store = None;
        assert!(render(&spec).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_group_is_configuration_error() {
        let mut spec = spec();
        spec.users[0].groups = vec!["nobody".into()];
        let err = render(&spec).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_colliding_membership_keys_are_error() {
        let mut spec = spec();
        spec.groups.push(GroupDecl {
            name: "doe-ops".into(),
            ..Default::default()
        });
        spec.users = vec![
            UserDecl {
                name: "jane.doe".into(),
                groups: vec!["ops".into()],
                ..Default::default()
            },
            UserDecl {
                name: "jane".into(),
                groups: vec!["doe-ops".into()],
                ..Default::default()
            },
        ];

        match render(&spec).unwrap_err() {
            PipelineError::Configuration(message) => {
                assert!(message.contains("identity-center-group-membership-jane-doe-ops"));
                assert!(message.contains("user 'jane.doe' in group 'ops'"));
                assert!(message.contains("user 'jane' in group 'doe-ops'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
