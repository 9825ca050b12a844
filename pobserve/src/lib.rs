//! Production-friendly observability for the chat engine: tracing and metrics
//! layers for turns, tool calls, and provider attempts, plus panic-isolating
//! wrappers.
//!
//! ```rust
//! use pobserve::{MetricsObservabilityHooks, SafeProviderHooks, TracingObservabilityHooks};
//!
//! let _provider_hooks = SafeProviderHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeMiddleware, SafeProviderHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeMiddleware, SafeProviderHooks, TracingObservabilityHooks,
    };
}
