pub mod collector;
pub mod error;
pub mod sink;

pub use collector::MetricsCollector;
pub use error::MetricsError;
pub use sink::{NoopTelemetry, TelemetrySink, TrapOutcome};
