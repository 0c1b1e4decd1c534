pub mod http;
pub mod init;
pub mod metrics;

pub use http::instrument_router;
pub use init::{TelemetryGuard, init_telemetry};
