//! Identity Center Render Core - Declarative Access Topology Compiler
//!
//! # Guarantees
//! 1. Same input, same output, byte for byte
//! 2. Logical keys depend only on kind and caller-chosen names
//! 3. References resolve in-pass or to a caller-supplied literal, never neither
//! 4. Every draft carries management policies, provider config and merged tags
//! 5. A pass returns everything or an error, never a partial list

pub mod composite;
pub mod config;
pub mod context;
pub mod draft;
pub mod hashing;
pub mod keys;
pub mod observed;
pub mod pipeline;
pub mod render;
pub mod status;
pub mod validation;

pub use composite::{CompositeSpec, RenderInput, RenderOutput};
pub use config::{ConfigError, RendererConfig};
pub use context::RenderContext;
pub use draft::{DraftSet, ResourceDraft};
pub use hashing::{canonical_json, compute_digest};
pub use keys::{LogicalKey, PrincipalKind, Reference, ResourceKind};
pub use observed::ObservedIndex;
pub use pipeline::{PipelineError, RenderPipeline};
pub use render::{RenderStage, default_stages};
pub use status::{ResourceState, ResourceStatus, StatusAggregator, StatusSummary};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
