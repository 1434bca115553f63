//! HTTP/JSON API for the diploma approval service.
//!
//! Provides endpoints for:
//! - Diploma templates
//! - Request creation, listing, signing and deletion
//! - Anchor requests, the anchoring callback and its payload
//! - KPIs
//! - Health and Prometheus metrics

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use extract::ApiJson;
pub use metrics::WorkflowMetrics;
pub use server::{build_router, ApiState, RpcServer};
