//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations against the composite spec.
//! Any error-severity violation aborts the render pass; warnings are
//! reported and logged but never block.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::composite::CompositeSpec;
use crate::keys::{slugify, LogicalKey};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    /// The declaration the violation is about, when there is one.
    pub subject: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, spec: &CompositeSpec) -> Vec<ValidationViolation>;
}

fn error(rule: &str, subject: &str, message: String, remediation: &str) -> ValidationViolation {
    ValidationViolation {
        rule: rule.to_string(),
        severity: ViolationSeverity::Error,
        message,
        subject: Some(subject.to_string()),
        remediation: vec![remediation.to_string()],
    }
}

// --- Concrete Rules ---

/// Names that slug to nothing would produce a bare-prefix key.
pub struct NamesRule;

impl ValidationRule for NamesRule {
    fn name(&self) -> &'static str { "names" }

    fn validate(&self, spec: &CompositeSpec) -> Vec<ValidationViolation> {
        let names = spec.groups.iter().map(|g| ("group", &g.name))
            .chain(spec.users.iter().map(|u| ("user", &u.name)))
            .chain(spec.permission_sets.iter().map(|ps| ("permission set", &ps.name)));

        names
            .filter(|(_, name)| slugify(name).is_empty())
            .map(|(what, name)| error(
                self.name(),
                name,
                format!("{} name '{}' has no letters or digits", what, name),
                "Use a name containing at least one ASCII letter or digit",
            ))
            .collect()
    }
}

/// Two declarations landing on one logical key would silently replace each other.
pub struct UniqueNamesRule;

impl ValidationRule for UniqueNamesRule {
    fn name(&self) -> &'static str { "unique_names" }

    fn validate(&self, spec: &CompositeSpec) -> Vec<ValidationViolation> {
        let keys = spec.groups.iter().map(|g| (LogicalKey::group(&g.name), &g.name))
            .chain(spec.users.iter().map(|u| (LogicalKey::user(&u.name), &u.name)))
            .chain(spec.permission_sets.iter().map(|ps| (LogicalKey::permission_set(&ps.name), &ps.name)));

        let mut seen = BTreeSet::new();
        let mut violations = vec![];
        for (key, name) in keys {
            if !seen.insert(key.clone()) {
                violations.push(error(
                    self.name(),
                    name,
                    format!("'{}' collides with another declaration on key {}", name, key),
                    "Rename one of the declarations",
                ));
            }
        }
        violations
    }
}

pub struct AccountIdRule;

impl ValidationRule for AccountIdRule {
    fn name(&self) -> &'static str { "account_id" }

    fn validate(&self, spec: &CompositeSpec) -> Vec<ValidationViolation> {
        let accounts = spec.permission_sets.iter()
            .flat_map(|ps| ps.assign_to_accounts.iter())
            .chain(spec.assignments.iter().map(|a| &a.account_id));

        accounts
            .filter(|id| !(id.len() == 12 && id.chars().all(|c| c.is_ascii_digit())))
            .map(|id| error(
                self.name(),
                id,
                format!("'{}' is not a 12-digit AWS account id", id),
                "Quote account ids so leading zeros survive",
            ))
            .collect()
    }
}

pub struct InstanceArnRule;

impl ValidationRule for InstanceArnRule {
    fn name(&self) -> &'static str { "instance_arn" }

    fn validate(&self, spec: &CompositeSpec) -> Vec<ValidationViolation> {
        let has_instance = spec.identity_center.as_ref()
            .and_then(|ic| ic.instance_arn.as_deref())
            .map_or(false, |arn| !arn.trim().is_empty());

        if has_instance || (spec.permission_sets.is_empty() && spec.assignments.is_empty()) {
            return vec![];
        }

        vec![error(
            self.name(),
            "identityCenter.instanceArn",
            "permission sets and assignments need an Identity Center instance".to_string(),
            "Set identityCenter.instanceArn",
        )]
    }
}

/// The federation stage renders nothing yet; say so instead of failing.
pub struct ExternalIdentityProviderRule;

impl ValidationRule for ExternalIdentityProviderRule {
    fn name(&self) -> &'static str { "external_identity_provider" }

    fn validate(&self, spec: &CompositeSpec) -> Vec<ValidationViolation> {
        if spec.external_identity_provider.is_none() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Warning,
            message: "externalIdentityProvider is accepted but not rendered".to_string(),
            subject: Some("externalIdentityProvider".to_string()),
            remediation: vec![],
        }]
    }
}

/// Validator orchestrates rules
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(NamesRule),
                Box::new(UniqueNamesRule),
                Box::new(AccountIdRule),
                Box::new(InstanceArnRule),
                Box::new(ExternalIdentityProviderRule),
            ],
        }
    }

    pub fn validate(&self, spec: &CompositeSpec) -> ValidationResult {
        let mut all_violations = vec![];

        for rule in &self.rules {
            all_violations.extend(rule.validate(spec));
        }

        let has_errors = all_violations.iter()
            .any(|v| v.severity == ViolationSeverity::Error);

        ValidationResult {
            valid: !has_errors,
            violations: all_violations,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{AssignmentTuple, GroupDecl, IdentityCenterRef, PermissionSetDecl};
    use crate::keys::PrincipalKind;
    use serde_json::json;

    fn group(name: &str) -> GroupDecl {
        GroupDecl { name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn test_empty_spec_is_valid() {
        let result = Validator::new().validate(&CompositeSpec::default());
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_slug_collision_is_error() {
        let spec = CompositeSpec {
            groups: vec![group("Ops Team"), group("ops-team")],
            ..Default::default()
        };
        let result = Validator::new().validate(&spec);
        assert!(!result.valid);
        assert_eq!(result.errors().next().unwrap().rule, "unique_names");
    }

    #[test]
    fn test_group_and_user_may_share_a_name() {
        let spec = CompositeSpec {
            groups: vec![group("ops")],
            users: vec![crate::composite::UserDecl { name: "ops".into(), ..Default::default() }],
            ..Default::default()
        };
        assert!(Validator::new().validate(&spec).valid);
    }

    #[test]
    fn test_bad_account_and_missing_instance() {
        let spec = CompositeSpec {
            assignments: vec![AssignmentTuple {
                principal_name: "ops".into(),
                principal_type: PrincipalKind::Group,
                permission_set_name: "Admin".into(),
                account_id: "12345".into(),
            }],
            ..Default::default()
        };
        let result = Validator::new().validate(&spec);
        let rules: Vec<_> = result.errors().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["account_id", "instance_arn"]);
    }

    #[test]
    fn test_blank_name_is_error() {
        let spec = CompositeSpec {
            permission_sets: vec![PermissionSetDecl { name: " -- ".into(), ..Default::default() }],
            identity_center: Some(IdentityCenterRef { instance_arn: Some("arn:aws:sso:::instance/ssoins-1".into()) }),
            ..Default::default()
        };
        let result = Validator::new().validate(&spec);
        assert_eq!(result.errors().next().unwrap().rule, "names");
    }

    #[test]
    fn test_external_idp_is_warning_only() {
        let spec = CompositeSpec {
            external_identity_provider: Some(json!({"type": "saml"})),
            ..Default::default()
        };
        let result = Validator::new().validate(&spec);
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
    }
}
