//! Render Stages
//!
//! Stages run in the order of [`default_stages`] against one shared context
//! and observed index, appending to a single draft list. Adding a stage is
//! a splice into that list.

pub mod assignments;
pub mod federation;
pub mod permission_sets;
pub mod principals;

use crate::context::RenderContext;
use crate::draft::DraftSet;
use crate::keys::{
    is_literal_permission_set_arn, is_literal_principal_id, LogicalKey, PrincipalKind, Reference,
};
use crate::observed::ObservedIndex;
use crate::pipeline::PipelineError;

pub use assignments::{expand_assignments, Assignment, AssignmentStage};
pub use federation::FederationStage;
pub use permission_sets::PermissionSetStage;
pub use principals::PrincipalStage;

pub trait RenderStage {
    fn name(&self) -> &'static str;

    fn render(
        &self,
        ctx: &RenderContext<'_>,
        observed: &ObservedIndex,
        out: &mut DraftSet,
    ) -> Result<(), PipelineError>;
}

pub fn default_stages() -> Vec<Box<dyn RenderStage>> {
    vec![
        Box::new(PrincipalStage),
        Box::new(PermissionSetStage),
        Box::new(AssignmentStage),
        Box::new(FederationStage::Identity),
    ]
}

/// In-pass reference when the principal is drafted this pass, otherwise the
/// caller's value must itself be a principal id.
pub fn resolve_principal(
    ctx: &RenderContext<'_>,
    kind: PrincipalKind,
    name: &str,
) -> Result<Reference, PipelineError> {
    let declared = match kind {
        PrincipalKind::Group => ctx.group_declared(name),
        PrincipalKind::User => ctx.user_declared(name),
    };

    if declared && ctx.manages_principals() {
        let field = kind.resource_kind().identifier_field().unwrap_or("id");
        return Ok(Reference::draft(LogicalKey::principal(kind, name), field));
    }

    if is_literal_principal_id(name) {
        return Ok(Reference::external(name));
    }

    let reason = if declared {
        "is declared but no identity store is configured"
    } else {
        "is not declared and is not a literal principal id"
    };
    Err(PipelineError::Configuration(format!(
        "{kind} principal '{name}' {reason}"
    )))
}

pub fn resolve_permission_set(
    ctx: &RenderContext<'_>,
    name: &str,
) -> Result<Reference, PipelineError> {
    if ctx.permission_set_declared(name) {
        Ok(Reference::draft(LogicalKey::permission_set(name), "arn"))
    } else if is_literal_permission_set_arn(name) {
        Ok(Reference::external(name))
    } else {
        Err(PipelineError::Configuration(format!(
            "permission set '{name}' is not declared and is not a permission set ARN"
        )))
    }
}

pub(crate) fn require_instance_arn<'c>(
    ctx: &'c RenderContext<'_>,
    what: &str,
) -> Result<&'c str, PipelineError> {
    ctx.instance_arn.as_deref().ok_or_else(|| {
        PipelineError::Configuration(format!(
            "{what} require identityCenter.instanceArn"
        ))
    })
}
