//! Composite Documents - What the Caller Hands In and Gets Back

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::draft::ResourceDraft;
use crate::keys::PrincipalKind;
use crate::status::StatusSummary;

pub type TagMap = BTreeMap<String, String>;

/// One render invocation's input: the composite plus what was observed last.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInput {
    #[serde(default)]
    pub metadata: CompositeMetadata,
    #[serde(default)]
    pub spec: CompositeSpec,
    #[serde(default)]
    pub observed: Vec<ObservedResource>,
    /// Oldest renderer able to honour this composite's naming.
    #[serde(default)]
    pub engine_min_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeMetadata {
    #[serde(default)]
    pub name: String,
}

/// Observed objects are opaque; only the naming marker, external name,
/// readiness condition and `status.atProvider` are ever read.
pub type ObservedResource = Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSpec {
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub management_policies: Option<Vec<String>>,
    #[serde(default)]
    pub provider_config_ref: Option<ProviderConfigRef>,
    #[serde(default)]
    pub identity_center: Option<IdentityCenterRef>,
    #[serde(default)]
    pub identity_store: Option<IdentityStoreRef>,
    #[serde(default)]
    pub groups: Vec<GroupDecl>,
    #[serde(default)]
    pub users: Vec<UserDecl>,
    #[serde(default)]
    pub permission_sets: Vec<PermissionSetDecl>,
    /// Legacy explicit tuples, drafted 1:1 without expansion.
    #[serde(default)]
    pub assignments: Vec<AssignmentTuple>,
    #[serde(default)]
    pub tags: TagMap,
    /// Reserved for identity-provider federation; not rendered.
    #[serde(default)]
    pub external_identity_provider: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfigRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCenterRef {
    #[serde(default)]
    pub instance_arn: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityStoreRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDecl {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: TagMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecl {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Group names (or literal group ids) this user belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub tags: TagMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSetDecl {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub session_duration: Option<String>,
    #[serde(default)]
    pub relay_state: Option<String>,
    /// Either a policy document object or its JSON text.
    #[serde(default)]
    pub inline_policy: Option<Value>,
    #[serde(default)]
    pub managed_policies: Vec<String>,
    #[serde(default)]
    pub customer_managed_policies: Vec<CustomerPolicyRef>,
    #[serde(default)]
    pub assign_to_accounts: Vec<String>,
    #[serde(default)]
    pub assign_to_groups: Vec<String>,
    #[serde(default)]
    pub assign_to_users: Vec<String>,
    #[serde(default)]
    pub tags: TagMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerPolicyRef {
    pub name: String,
    #[serde(default = "default_policy_path")]
    pub path: String,
}

fn default_policy_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentTuple {
    pub principal_name: String,
    pub principal_type: PrincipalKind,
    pub permission_set_name: String,
    pub account_id: String,
}

/// One invocation's complete output. Never produced partially.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub resources: Vec<ResourceDraft>,
    pub status: StatusSummary,
    /// SHA-256 of the canonical JSON of `resources`.
    pub digest: String,
}
