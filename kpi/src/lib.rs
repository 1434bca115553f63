//! KPI aggregation over the request store.
//!
//! Each result is cached independently for a fixed TTL measured with an
//! injected [`diploma_types::Clock`]. Workflow events drop both cache entries
//! through [`KpiAggregator::listener`], so the TTL only bounds staleness for
//! writes that bypass the workflow.

pub mod aggregator;
pub mod error;

pub use aggregator::{GraduatedStudents, KpiAggregator, KpiMetrics, DEFAULT_TTL_SECS};
pub use error::KpiError;
