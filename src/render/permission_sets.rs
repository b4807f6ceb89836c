//! Permission-Set Renderer
//!
//! Each attachment is its own sibling draft keyed under the permission set,
//! so a policy change diffs as one resource rather than one opaque blob.

use serde_json::{json, Value};

use super::{require_instance_arn, RenderStage};
use crate::composite::PermissionSetDecl;
use crate::context::RenderContext;
use crate::draft::{DraftSet, ResourceDraft};
use crate::hashing::canonical_json;
use crate::keys::{LogicalKey, Reference, ResourceKind};
use crate::observed::ObservedIndex;
use crate::pipeline::PipelineError;

pub struct PermissionSetStage;

impl RenderStage for PermissionSetStage {
    fn name(&self) -> &'static str {
        "permission_sets"
    }

    fn render(
        &self,
        ctx: &RenderContext<'_>,
        observed: &ObservedIndex,
        out: &mut DraftSet,
    ) -> Result<(), PipelineError> {
        if ctx.spec.permission_sets.is_empty() {
            return Ok(());
        }
        let instance_arn = require_instance_arn(ctx, "permission sets")?;

        for ps in &ctx.spec.permission_sets {
            let key = LogicalKey::permission_set(&ps.name);
            let tags = ctx.tags_for(&ps.tags);
            let arn_ref = || Reference::draft(key.clone(), "arn");

            out.push(
                ResourceDraft::new(ResourceKind::PermissionSet, key.clone(), ctx, observed, tags.clone())
                    .field("instanceArn", instance_arn)
                    .field("name", ps.name.as_str())
                    .field(
                        "sessionDuration",
                        ps.session_duration
                            .as_deref()
                            .unwrap_or(&ctx.default_session_duration),
                    )
                    .optional_field("description", ps.description.as_deref())
                    .optional_field("relayState", ps.relay_state.as_deref()),
                format!("permission set '{}'", ps.name),
            )?;

            if let Some(document) = inline_policy_text(ps)? {
                out.push(
                    ResourceDraft::new(
                        ResourceKind::PermissionSetInlinePolicy,
                        LogicalKey::inline_policy(&ps.name),
                        ctx,
                        observed,
                        tags.clone(),
                    )
                    .field("instanceArn", instance_arn)
                    .field("inlinePolicy", document)
                    .reference("permissionSetArn", arn_ref()),
                    format!("inline policy of permission set '{}'", ps.name),
                )?;
            }

            for policy_arn in &ps.managed_policies {
                out.push(
                    ResourceDraft::new(
                        ResourceKind::ManagedPolicyAttachment,
                        LogicalKey::managed_policy(&ps.name, policy_arn),
                        ctx,
                        observed,
                        tags.clone(),
                    )
                    .field("instanceArn", instance_arn)
                    .field("managedPolicyArn", policy_arn.as_str())
                    .reference("permissionSetArn", arn_ref()),
                    format!("managed policy '{}' on permission set '{}'", policy_arn, ps.name),
                )?;
            }

            for policy in &ps.customer_managed_policies {
                out.push(
                    ResourceDraft::new(
                        ResourceKind::CustomerManagedPolicyAttachment,
                        LogicalKey::customer_policy(&ps.name, &policy.path, &policy.name),
                        ctx,
                        observed,
                        tags.clone(),
                    )
                    .field("instanceArn", instance_arn)
                    .field(
                        "customerManagedPolicyReference",
                        json!({ "name": policy.name, "path": policy.path }),
                    )
                    .reference("permissionSetArn", arn_ref()),
                    format!(
                        "customer policy '{}{}' on permission set '{}'",
                        policy.path, policy.name, ps.name
                    ),
                )?;
            }
        }

        Ok(())
    }
}

/// Policy text as sent to the provider. Objects are serialized canonically
/// so key order in the caller's document never shows up as a diff.
fn inline_policy_text(ps: &PermissionSetDecl) -> Result<Option<String>, PipelineError> {
    match &ps.inline_policy {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(document) => Ok(Some(canonical_json(document)?)),
    }
}
