//! Render Pipeline - Single Entry Point
//!
//! CRITICAL: render MUST call validate internally, and a pass either
//! returns every draft or an error. Never a truncated list.

use thiserror::Error;

use crate::composite::{RenderInput, RenderOutput};
use crate::config::RendererConfig;
use crate::context::RenderContext;
use crate::draft::DraftSet;
use crate::hashing::compute_digest;
use crate::keys::LogicalKey;
use crate::observed::ObservedIndex;
use crate::render::{default_stages, RenderStage};
use crate::status::{StatusAggregator, StatusSummary};
use crate::validation::{ValidationResult, Validator};
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unresolved reference: {from} points at {to}, which was not drafted")]
    UnresolvedReference { from: LogicalKey, to: LogicalKey },

    #[error("Composite requires engine >= {required}, current is {current}")]
    EngineVersionMismatch { required: String, current: String },

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The render pipeline - runs every stage over one composite
pub struct RenderPipeline {
    config: RendererConfig,
    validator: Validator,
    stages: Vec<Box<dyn RenderStage>>,
}

impl RenderPipeline {
    pub fn new(config: RendererConfig) -> Self {
        Self::with_stages(config, default_stages())
    }

    pub fn with_stages(config: RendererConfig, stages: Vec<Box<dyn RenderStage>>) -> Self {
        Self {
            config,
            validator: Validator::new(),
            stages,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Validate a composite without rendering it
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self, input: &RenderInput) -> Result<ValidationResult, PipelineError> {
        self.check_engine_version(input)?;

        let result = self.validator.validate(&input.spec);
        for warning in result.warnings() {
            tracing::warn!(rule = %warning.rule, "{}", warning.message);
        }
        Ok(result)
    }

    /// Render a composite into drafts and status
    ///
    /// CRITICAL: This ALWAYS calls validate internally. No bypass possible.
    pub fn render(&self, input: &RenderInput) -> Result<RenderOutput, PipelineError> {
        let validation = self.validate(input)?;
        if validation.has_errors() {
            let messages: Vec<_> = validation.errors()
                .map(|v| format!("{}: {}", v.rule, v.message))
                .collect();
            return Err(PipelineError::Configuration(messages.join("; ")));
        }

        let ctx = RenderContext::build(&input.metadata.name, &input.spec, &self.config);
        let observed = ObservedIndex::from_resources(&input.observed, &self.config);
        if observed.skipped() > 0 {
            tracing::warn!(skipped = observed.skipped(), "Ignored observed resources without naming marker");
        }

        let mut drafts = DraftSet::new();
        for stage in &self.stages {
            let before = drafts.len();
            stage.render(&ctx, &observed, &mut drafts)?;
            tracing::debug!(stage = stage.name(), drafted = drafts.len() - before, "Stage complete");
        }

        if let Some((from, to)) = drafts.dangling_reference() {
            return Err(PipelineError::UnresolvedReference {
                from: from.clone(),
                to: to.clone(),
            });
        }

        let status = StatusAggregator::aggregate(&ctx, &observed);
        let resources = drafts.into_vec();
        let digest = compute_digest(&resources)?;

        tracing::info!(
            composite = %ctx.composite_name,
            resources = resources.len(),
            digest = %digest,
            "Render complete"
        );

        Ok(RenderOutput {
            resources,
            status,
            digest,
        })
    }

    /// Status only, for inspection. Never fails.
    pub fn status(&self, input: &RenderInput) -> StatusSummary {
        let ctx = RenderContext::build(&input.metadata.name, &input.spec, &self.config);
        let observed = ObservedIndex::from_resources(&input.observed, &self.config);
        StatusAggregator::aggregate(&ctx, &observed)
    }

    fn check_engine_version(&self, input: &RenderInput) -> Result<(), PipelineError> {
        let Some(required) = input.engine_min_version.as_deref() else {
            return Ok(());
        };

        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|_| PipelineError::InvalidVersion(ENGINE_VERSION.to_string()))?;
        let min_ver = semver::Version::parse(required)
            .map_err(|_| PipelineError::InvalidVersion(required.to_string()))?;

        if engine_ver < min_ver {
            return Err(PipelineError::EngineVersionMismatch {
                required: required.to_string(),
                current: ENGINE_VERSION.to_string(),
            });
        }

        Ok(())
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}
