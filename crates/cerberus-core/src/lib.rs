pub mod config;
pub mod context;
pub mod error;
pub mod frameworks;
pub mod gate;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod render;
pub mod request;
pub mod template;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{CheckConfig, ConfigLayer, OutputFormat};
pub use context::platform::Platform;
pub use context::CiEnvironment;
pub use error::{ApiError, ConfigError, PipelineError, RenderError, RequestError};
pub use gate::{GateConfig, GateDecision};
pub use model::{ComplianceResult, Severity, Violation};
pub use pipeline::RunOutcome;
pub use providers::compliance_api::ComplianceClient;
pub use providers::{PlatformApi, PlatformClient};
pub use render::ReportFormat;
pub use request::{ComplianceRequest, Mode};
