//! HTTP middleware shared by the services in this workspace.
//!
//! - Request-id propagation for log correlation
//! - Per-request metrics (count + latency)
//! - Security response headers

pub mod metrics;
pub mod security_headers;
pub mod tracing;
