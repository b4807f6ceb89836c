//! Assignment Renderer
//!
//! Permission sets expand `assignToAccounts x (assignToGroups + assignToUsers)`;
//! legacy tuples are taken as-is. A tuple repeated across both paths is
//! drafted once; two different tuples that slug to one key are an error.

use std::collections::BTreeMap;

use super::{require_instance_arn, resolve_permission_set, resolve_principal, RenderStage};
use crate::composite::{CompositeSpec, TagMap};
use crate::context::RenderContext;
use crate::draft::{DraftSet, ResourceDraft};
use crate::keys::{LogicalKey, PrincipalKind, ResourceKind};
use crate::observed::ObservedIndex;
use crate::pipeline::PipelineError;

static NO_TAGS: TagMap = BTreeMap::new();

/// A resolved (principal, permission set, account) binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub permission_set: &'a str,
    pub principal_kind: PrincipalKind,
    pub principal: &'a str,
    pub account_id: &'a str,
    /// Per-resource tag layer inherited from the permission set.
    pub tags: &'a TagMap,
}

impl Assignment<'_> {
    fn same_tuple(&self, other: &Assignment<'_>) -> bool {
        self.permission_set == other.permission_set
            && self.principal_kind == other.principal_kind
            && self.principal == other.principal
            && self.account_id == other.account_id
    }

    fn describe(&self) -> String {
        format!(
            "{} '{}' assigned '{}' on {}",
            self.principal_kind, self.principal, self.permission_set, self.account_id
        )
    }

    pub fn key(&self) -> LogicalKey {
        LogicalKey::assignment(
            self.permission_set,
            self.principal_kind,
            self.principal,
            self.account_id,
        )
    }
}

/// Every assignment the composite asks for, in declaration order, expansion first.
/// Duplicates are kept; callers collapse identical tuples.
pub fn expand_assignments(spec: &CompositeSpec) -> Vec<Assignment<'_>> {
    let mut assignments = vec![];

    for ps in &spec.permission_sets {
        let principals = ps
            .assign_to_groups
            .iter()
            .map(|g| (PrincipalKind::Group, g))
            .chain(ps.assign_to_users.iter().map(|u| (PrincipalKind::User, u)));

        for (principal_kind, principal) in principals {
            for account_id in &ps.assign_to_accounts {
                assignments.push(Assignment {
                    permission_set: &ps.name,
                    principal_kind,
                    principal,
                    account_id,
                    tags: &ps.tags,
                });
            }
        }
    }

    for tuple in &spec.assignments {
        let tags = spec
            .permission_sets
            .iter()
            .find(|ps| ps.name == tuple.permission_set_name)
            .map_or(&NO_TAGS, |ps| &ps.tags);

        assignments.push(Assignment {
            permission_set: &tuple.permission_set_name,
            principal_kind: tuple.principal_type,
            principal: &tuple.principal_name,
            account_id: &tuple.account_id,
            tags,
        });
    }

    assignments
}

pub struct AssignmentStage;

impl RenderStage for AssignmentStage {
    fn name(&self) -> &'static str {
        "assignments"
    }

    fn render(
        &self,
        ctx: &RenderContext<'_>,
        observed: &ObservedIndex,
        out: &mut DraftSet,
    ) -> Result<(), PipelineError> {
        let assignments = expand_assignments(ctx.spec);
        if assignments.is_empty() {
            return Ok(());
        }
        let instance_arn = require_instance_arn(ctx, "account assignments")?;

        let mut seen: BTreeMap<LogicalKey, &Assignment<'_>> = BTreeMap::new();
        for assignment in &assignments {
            let key = assignment.key();
            if let Some(previous) = seen.get(&key) {
                if previous.same_tuple(assignment) {
                    continue;
                }
                return Err(PipelineError::Configuration(format!(
                    "{} and {} both map to resource key '{}'",
                    previous.describe(),
                    assignment.describe(),
                    key
                )));
            }
            seen.insert(key.clone(), assignment);

            let principal_ref =
                resolve_principal(ctx, assignment.principal_kind, assignment.principal)?;
            let permission_set_ref = resolve_permission_set(ctx, assignment.permission_set)?;

            out.push(
                ResourceDraft::new(
                    ResourceKind::AccountAssignment,
                    key,
                    ctx,
                    observed,
                    ctx.tags_for(assignment.tags),
                )
                .field("instanceArn", instance_arn)
                .field("principalType", assignment.principal_kind.to_string())
                .field("targetId", assignment.account_id)
                .field("targetType", "AWS_ACCOUNT")
                .reference("principalId", principal_ref)
                .reference("permissionSetArn", permission_set_ref),
                assignment.describe(),
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{
        AssignmentTuple, GroupDecl, IdentityCenterRef, IdentityStoreRef, PermissionSetDecl,
    };
    use crate::config::RendererConfig;
    use crate::keys::Reference;

    fn spec() -> CompositeSpec {
        CompositeSpec {
            identity_center: Some(IdentityCenterRef {
                instance_arn: Some("arn:aws:sso:::instance/ssoins-1234567890abcdef".into()),
            }),
            identity_store: Some(IdentityStoreRef {
                id: Some("d-1234567890".into()),
            }),
            groups: vec![GroupDecl {
                name: "G".into(),
                ..Default::default()
            }],
            permission_sets: vec![PermissionSetDecl {
                name: "ReadOnly".into(),
                assign_to_accounts: vec!["111111111111".into(), "222222222222".into()],
                assign_to_groups: vec!["G".into()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn render(spec: &CompositeSpec) -> Result<Vec<ResourceDraft>, PipelineError> {
        let ctx = RenderContext::build("acme", spec, &RendererConfig::default());
        let mut out = DraftSet::new();
        AssignmentStage.render(&ctx, &ObservedIndex::new(), &mut out)?;
        Ok(out.into_vec())
    }

    #[test]
    fn test_cartesian_expansion() {
        let drafts = render(&spec()).unwrap();
        assert_eq!(drafts.len(), 2);

        let accounts: Vec<_> = drafts.iter().map(|d| d.for_provider["targetId"].clone()).collect();
        assert_eq!(accounts, vec!["111111111111", "222222222222"]);
        for draft in &drafts {
            assert_eq!(draft.for_provider["principalType"], "GROUP");
            assert_eq!(
                draft.references["principalId"],
                Reference::draft(LogicalKey::group("G"), "groupId")
            );
        }
    }

    #[test]
    fn test_legacy_overlap_is_collapsed() {
        let mut spec = spec();
        spec.assignments = vec![
            AssignmentTuple {
                principal_name: "G".into(),
                principal_type: PrincipalKind::Group,
                permission_set_name: "ReadOnly".into(),
                account_id: "111111111111".into(),
            },
            AssignmentTuple {
                principal_name: "G".into(),
                principal_type: PrincipalKind::Group,
                permission_set_name: "ReadOnly".into(),
                account_id: "333333333333".into(),
            },
        ];

        assert_eq!(expand_assignments(&spec).len(), 4);
        assert_eq!(render(&spec).unwrap().len(), 3);
    }

    #[test]
    fn test_colliding_assignment_tuples_are_error() {
        let mut spec = spec();
        spec.permission_sets.clear();
        spec.assignments = vec![
            AssignmentTuple {
                principal_name: "G".into(),
                principal_type: PrincipalKind::Group,
                permission_set_name:
                    "arn:aws:sso:::permissionSet/ssoins-1234567890abcdef/ps-1234567890abcdef".into(),
                account_id: "111111111111".into(),
            },
            AssignmentTuple {
                principal_name: "G".into(),
                principal_type: PrincipalKind::Group,
                permission_set_name:
                    "arn:aws:sso:::permissionSet/ssoins-1234567890abcdef/PS-1234567890ABCDEF".into(),
                account_id: "111111111111".into(),
            },
        ];

        match render(&spec).unwrap_err() {
            PipelineError::Configuration(message) => {
                assert!(message.contains("ps-1234567890abcdef' on 111111111111"));
                assert!(message.contains("PS-1234567890ABCDEF' on 111111111111"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_legacy_literal_permission_set() {
        let mut spec = spec();
        spec.permission_sets.clear();
        spec.assignments = vec![AssignmentTuple {
            principal_name: "0a1b2c3d-1111-2222-3333-444455556666".into(),
            principal_type: PrincipalKind::User,
            permission_set_name:
                "arn:aws:sso:::permissionSet/ssoins-1234567890abcdef/ps-1234567890abcdef".into(),
            account_id: "111111111111".into(),
        }];

        let drafts = render(&spec).unwrap();
        assert_eq!(drafts.len(), 1);
        assert!(matches!(
            drafts[0].references["permissionSetArn"],
            Reference::External { .. }
        ));
        assert!(matches!(
            drafts[0].references["principalId"],
            Reference::External { .. }
        ));
    }
}
