//! External identity-provider federation seam.

use super::RenderStage;
use crate::context::RenderContext;
use crate::draft::DraftSet;
use crate::observed::ObservedIndex;
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FederationStage {
    /// Renders nothing, whatever `externalIdentityProvider` holds.
    #[default]
    Identity,
}

impl RenderStage for FederationStage {
    fn name(&self) -> &'static str {
        "federation"
    }

    fn render(
        &self,
        ctx: &RenderContext<'_>,
        _observed: &ObservedIndex,
        _out: &mut DraftSet,
    ) -> Result<(), PipelineError> {
        match self {
            FederationStage::Identity => {
                if ctx.spec.external_identity_provider.is_some() {
                    tracing::debug!("External identity provider declared, federation not rendered");
                }
                Ok(())
            }
        }
    }
}
