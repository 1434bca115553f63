//! Diploma approval service: configuration, logging and process wiring.
//!
//! [`DiplomaService`] opens the LMDB store, connects to the auth service,
//! builds the workflow with its observers and serves the HTTP API until a
//! shutdown signal arrives.

pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod shutdown;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::{init_logging, LogFormat};
pub use service::DiplomaService;
pub use shutdown::ShutdownController;
