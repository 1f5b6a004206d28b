//! HTTP handlers for functions-service.
//!
//! `admin` and `otp` carry the two callable functions; `health` serves the
//! infrastructure probes and the metrics scrape.

pub mod admin;
pub mod health;
pub mod otp;

pub use admin::set_admin_role;
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use otp::send_otp_email;
