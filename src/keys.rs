//! Logical Keys - Deterministic Resource Identity
//!
//! Every drafted resource is identified by a key derived only from its kind
//! and the caller-chosen names involved. The same key is used to find the
//! observed counterpart on the next pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collapse a caller-chosen name into the key alphabet.
///
/// Lowercase ASCII letters and digits are kept; every run of anything else
/// becomes a single `-`. Leading and trailing delimiters are dropped.
///
/// Non-ASCII letters are removed, not transliterated: `José` becomes `jos`
/// and `Renée Smith` becomes `ren-e-smith`. A name written only in non-Latin
/// script slugs to the empty string, which validation rejects.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_delimiter = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_delimiter && !slug.is_empty() {
                slug.push('-');
            }
            pending_delimiter = false;
            slug.push(c);
        } else {
            pending_delimiter = true;
        }
    }

    slug
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Group,
    User,
    GroupMembership,
    PermissionSet,
    PermissionSetInlinePolicy,
    ManagedPolicyAttachment,
    CustomerManagedPolicyAttachment,
    AccountAssignment,
}

impl ResourceKind {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Group => "identity-center-group",
            ResourceKind::User => "identity-center-user",
            ResourceKind::GroupMembership => "identity-center-group-membership",
            ResourceKind::PermissionSet => "permission-set",
            ResourceKind::PermissionSetInlinePolicy => "permission-set-inline-policy",
            ResourceKind::ManagedPolicyAttachment => "permission-set-managed-policy",
            ResourceKind::CustomerManagedPolicyAttachment => "permission-set-customer-policy",
            ResourceKind::AccountAssignment => "account-assignment",
        }
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            ResourceKind::Group | ResourceKind::User | ResourceKind::GroupMembership => {
                "identitystore.aws.upbound.io/v1beta1"
            }
            _ => "ssoadmin.aws.upbound.io/v1beta1",
        }
    }

    /// The `atProvider` field holding the identifier other resources bind to.
    pub fn identifier_field(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Group => Some("groupId"),
            ResourceKind::User => Some("userId"),
            ResourceKind::PermissionSet => Some("arn"),
            _ => None,
        }
    }
}

/// Principal kinds as the assignment API spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrincipalKind {
    Group,
    User,
}

impl PrincipalKind {
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            PrincipalKind::Group => ResourceKind::Group,
            PrincipalKind::User => ResourceKind::User,
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            PrincipalKind::Group => "group",
            PrincipalKind::User => "user",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::Group => f.write_str("GROUP"),
            PrincipalKind::User => f.write_str("USER"),
        }
    }
}

/// Deterministic `<kind-prefix>-<slug>[-<slug>...]` identity of a draft.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    fn compose(kind: ResourceKind, parts: &[&str]) -> Self {
        let mut key = kind.key_prefix().to_string();
        for part in parts {
            let slug = slugify(part);
            if !slug.is_empty() {
                key.push('-');
                key.push_str(&slug);
            }
        }
        Self(key)
    }

    pub fn group(name: &str) -> Self {
        Self::compose(ResourceKind::Group, &[name])
    }

    pub fn user(name: &str) -> Self {
        Self::compose(ResourceKind::User, &[name])
    }

    pub fn principal(kind: PrincipalKind, name: &str) -> Self {
        match kind {
            PrincipalKind::Group => Self::group(name),
            PrincipalKind::User => Self::user(name),
        }
    }

    pub fn membership(user: &str, group: &str) -> Self {
        Self::compose(ResourceKind::GroupMembership, &[user, group])
    }

    pub fn permission_set(name: &str) -> Self {
        Self::compose(ResourceKind::PermissionSet, &[name])
    }

    pub fn inline_policy(permission_set: &str) -> Self {
        Self::compose(ResourceKind::PermissionSetInlinePolicy, &[permission_set])
    }

    /// Keyed by the ARN's policy path (`arn:aws:iam::aws:policy/job-function/X` -> `job-function-x`).
    pub fn managed_policy(permission_set: &str, policy_arn: &str) -> Self {
        let policy = policy_arn
            .split_once(":policy/")
            .map(|(_, tail)| tail)
            .unwrap_or(policy_arn);
        Self::compose(ResourceKind::ManagedPolicyAttachment, &[permission_set, policy])
    }

    pub fn customer_policy(permission_set: &str, path: &str, name: &str) -> Self {
        Self::compose(
            ResourceKind::CustomerManagedPolicyAttachment,
            &[permission_set, path, name],
        )
    }

    pub fn assignment(
        permission_set: &str,
        principal_kind: PrincipalKind,
        principal: &str,
        account_id: &str,
    ) -> Self {
        Self::compose(
            ResourceKind::AccountAssignment,
            &[permission_set, principal_kind.segment(), principal, account_id],
        )
    }

    /// Accept a key read back from an observed object's naming annotation.
    pub fn from_observed(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a draft field obtains a value it cannot know at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "lowercase")]
pub enum Reference {
    /// Resolved by the applier from another draft of the same pass.
    Draft { key: LogicalKey, field: String },
    /// Supplied verbatim by the caller.
    External { value: String },
}

impl Reference {
    pub fn draft(key: LogicalKey, field: &str) -> Self {
        Reference::Draft {
            key,
            field: field.to_string(),
        }
    }

    pub fn external(value: impl Into<String>) -> Self {
        Reference::External {
            value: value.into(),
        }
    }

    pub fn draft_key(&self) -> Option<&LogicalKey> {
        match self {
            Reference::Draft { key, .. } => Some(key),
            Reference::External { .. } => None,
        }
    }
}

/// Identity-store principal ids: an optional ten-hex-digit store prefix, then a UUID.
pub fn is_literal_principal_id(value: &str) -> bool {
    let uuid_part = match value.split_once('-') {
        Some((prefix, rest))
            if prefix.len() == 10 && prefix.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            rest
        }
        _ => value,
    };
    uuid_part.len() == 36 && uuid::Uuid::try_parse(uuid_part).is_ok()
}

pub fn is_literal_permission_set_arn(value: &str) -> bool {
    value.starts_with("arn:") && value.contains(":permissionSet/")
}
