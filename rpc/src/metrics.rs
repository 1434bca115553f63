//! Prometheus metrics for the diploma workflow.
//!
//! [`WorkflowMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format. Request
//! counters and the pending gauge follow workflow events; signature outcomes
//! and durations are recorded by the handlers.

use std::sync::Arc;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use diploma_types::RequestStatus;
use diploma_workflow::WorkflowEvent;

pub struct WorkflowMetrics {
    registry: Registry,
    /// By lifecycle step: created, ready_for_anchor, rejected, anchor_requested, anchored, deleted.
    requests_total: IntCounterVec,
    /// Sign calls by outcome: success, failure.
    signatures_total: IntCounterVec,
    processing_duration: HistogramVec,
    pending_requests: IntGauge,
}

impl WorkflowMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("diploma_requests_total", "Total number of diploma requests"),
            &["status"],
        )?;
        let signatures_total = IntCounterVec::new(
            Opts::new("diploma_signatures_total", "Total number of diploma signatures"),
            &["status"],
        )?;
        let processing_duration = HistogramVec::new(
            HistogramOpts::new(
                "diploma_processing_duration_seconds",
                "Duration of diploma processing operations in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
            &["operation"],
        )?;
        let pending_requests = IntGauge::new(
            "diploma_pending_requests",
            "Number of pending diploma requests",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(signatures_total.clone()))?;
        registry.register(Box::new(processing_duration.clone()))?;
        registry.register(Box::new(pending_requests.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            signatures_total,
            processing_duration,
            pending_requests,
        })
    }

    pub fn observe(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::RequestCreated { .. } => {
                self.requests_total.with_label_values(&["created"]).inc();
                self.pending_requests.inc();
            }
            WorkflowEvent::StatusChanged { from, to, .. } => {
                self.requests_total.with_label_values(&[to.as_str()]).inc();
                if *from == RequestStatus::Pending {
                    self.pending_requests.dec();
                }
            }
            WorkflowEvent::AnchorRequested { .. } => {
                self.requests_total
                    .with_label_values(&["anchor_requested"])
                    .inc();
            }
            WorkflowEvent::RequestDeleted { .. } => {
                self.requests_total.with_label_values(&["deleted"]).inc();
                self.pending_requests.dec();
            }
            WorkflowEvent::TemplateCreated { .. } | WorkflowEvent::SignatureRecorded { .. } => {}
        }
    }

    /// Event listener feeding [`observe`](Self::observe).
    pub fn listener(self: &Arc<Self>) -> Box<dyn Fn(&WorkflowEvent) + Send + Sync> {
        let metrics = Arc::clone(self);
        Box::new(move |event: &WorkflowEvent| metrics.observe(event))
    }

    pub fn record_signature(&self, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.signatures_total.with_label_values(&[status]).inc();
    }

    pub fn observe_duration(&self, operation: &str, secs: f64) {
        self.processing_duration
            .with_label_values(&[operation])
            .observe(secs);
    }

    /// Seed the gauge from storage at startup.
    pub fn set_pending(&self, count: u64) {
        self.pending_requests.set(count as i64);
    }

    pub fn pending(&self) -> i64 {
        self.pending_requests.get()
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diploma_types::{Identity, RequestId};

    #[test]
    fn pending_gauge_follows_events() {
        let metrics = WorkflowMetrics::new().unwrap();
        metrics.set_pending(2);
        let request_id = RequestId::generate();
        metrics.observe(&WorkflowEvent::RequestCreated {
            request_id,
            created_by: Identity::new("c").unwrap(),
        });
        assert_eq!(metrics.pending(), 3);
        metrics.observe(&WorkflowEvent::StatusChanged {
            request_id,
            from: RequestStatus::Pending,
            to: RequestStatus::ReadyForAnchor,
        });
        metrics.observe(&WorkflowEvent::StatusChanged {
            request_id,
            from: RequestStatus::ReadyForAnchor,
            to: RequestStatus::Anchored,
        });
        metrics.observe(&WorkflowEvent::RequestDeleted { request_id });
        assert_eq!(metrics.pending(), 1);
    }

    #[test]
    fn encodes_text_exposition() {
        let metrics = WorkflowMetrics::new().unwrap();
        metrics.record_signature(true);
        metrics.observe_duration("sign", 0.2);
        metrics.observe(&WorkflowEvent::RequestCreated {
            request_id: RequestId::generate(),
            created_by: Identity::new("c").unwrap(),
        });
        let text = metrics.encode().unwrap();
        assert!(text.contains("diploma_signatures_total{status=\"success\"} 1"));
        assert!(text.contains("diploma_requests_total{status=\"created\"} 1"));
        assert!(text.contains("diploma_processing_duration_seconds_bucket"));
        assert!(text.contains("diploma_pending_requests 1"));
    }
}
