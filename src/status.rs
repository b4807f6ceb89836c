//! Status Aggregator
//!
//! Recomputes every logical key from the composite rather than from the drafts,
//! so "never observed" stays distinguishable from "observed, not ready".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::RenderContext;
use crate::keys::{LogicalKey, ResourceKind};
use crate::observed::ObservedIndex;
use crate::render::expand_assignments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Not observed yet.
    Pending,
    /// Observed, not yet reporting Ready.
    Provisioning,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub state: ResourceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ResourceStatus {
    pub fn pending() -> Self {
        Self {
            state: ResourceState::Pending,
            id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessCounts {
    pub ready: usize,
    pub provisioning: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub instance_arn: Option<String>,
    pub identity_store_id: Option<String>,
    pub management_policies: Vec<String>,
    pub principals: BTreeMap<LogicalKey, ResourceStatus>,
    pub permission_sets: BTreeMap<LogicalKey, ResourceStatus>,
    pub assignments: BTreeMap<LogicalKey, ResourceStatus>,
    pub counts: ReadinessCounts,
    /// At least one entry, and every entry ready.
    pub ready: bool,
}

pub struct StatusAggregator;

impl StatusAggregator {
    pub fn aggregate(ctx: &RenderContext<'_>, observed: &ObservedIndex) -> StatusSummary {
        let lookup = |kind: ResourceKind, key: LogicalKey| {
            let status = match observed.get(&key) {
                None => ResourceStatus::pending(),
                Some(entry) => ResourceStatus {
                    state: if entry.ready {
                        ResourceState::Ready
                    } else {
                        ResourceState::Provisioning
                    },
                    id: entry.identifier(kind.identifier_field()),
                },
            };
            (key, status)
        };

        let mut principals = BTreeMap::new();
        if ctx.manages_principals() {
            principals.extend(
                ctx.spec.groups.iter()
                    .map(|g| lookup(ResourceKind::Group, LogicalKey::group(&g.name))),
            );
            principals.extend(
                ctx.spec.users.iter()
                    .map(|u| lookup(ResourceKind::User, LogicalKey::user(&u.name))),
            );
        }

        let permission_sets: BTreeMap<_, _> = ctx
            .spec
            .permission_sets
            .iter()
            .map(|ps| lookup(ResourceKind::PermissionSet, LogicalKey::permission_set(&ps.name)))
            .collect();

        let assignments: BTreeMap<_, _> = expand_assignments(ctx.spec)
            .iter()
            .map(|a| lookup(ResourceKind::AccountAssignment, a.key()))
            .collect();

        let mut counts = ReadinessCounts::default();
        for status in principals.values().chain(permission_sets.values()).chain(assignments.values()) {
            match status.state {
                ResourceState::Ready => counts.ready += 1,
                ResourceState::Provisioning => counts.provisioning += 1,
                ResourceState::Pending => counts.pending += 1,
            }
        }
        let ready = counts.ready > 0 && counts.provisioning == 0 && counts.pending == 0;

        StatusSummary {
            instance_arn: ctx.instance_arn.clone(),
            identity_store_id: ctx.identity_store_id.clone(),
            management_policies: ctx.management_policies.clone(),
            principals,
            permission_sets,
            assignments,
            counts,
            ready,
        }
    }
}
