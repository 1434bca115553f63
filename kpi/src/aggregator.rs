//! Aggregated counts with a TTL cache.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use diploma_store::DiplomaStore;
use diploma_types::{Clock, RequestStatus, Timestamp};
use diploma_workflow::WorkflowEvent;

use crate::KpiError;

pub const DEFAULT_TTL_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetrics {
    /// Number of diploma templates.
    pub total_diplomas: u64,
    pub total_requests: u64,
    pub pending_requests: u64,
    /// Requests that may be locked for anchoring (approved or ready).
    pub ready_for_anchor: u64,
    pub anchored_requests: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduatedStudents {
    /// Distinct student ids across anchored requests.
    pub graduated_students: u64,
    pub anchored_requests: u64,
}

struct Cached<T> {
    value: T,
    computed_at: Timestamp,
}

/// Computes KPIs from storage and caches each result for `ttl_secs`.
pub struct KpiAggregator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl_secs: u64,
    metrics: Mutex<Option<Cached<KpiMetrics>>>,
    graduates: Mutex<Option<Cached<GraduatedStudents>>>,
}

/// Return the cached value if it is still fresh at `now`.
fn fresh<T: Copy>(slot: &Mutex<Option<Cached<T>>>, ttl_secs: u64, now: Timestamp) -> Option<T> {
    let guard = slot.lock().ok()?;
    guard
        .as_ref()
        .filter(|c| !c.computed_at.has_expired(ttl_secs, now))
        .map(|c| c.value)
}

fn store_in<T>(slot: &Mutex<Option<Cached<T>>>, value: T, now: Timestamp) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(Cached {
            value,
            computed_at: now,
        });
    }
}

fn clear<T>(slot: &Mutex<Option<Cached<T>>>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = None;
    }
}

impl<S: DiplomaStore + 'static> KpiAggregator<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            store,
            clock,
            ttl_secs,
            metrics: Mutex::new(None),
            graduates: Mutex::new(None),
        }
    }

    /// Template and request counts.
    ///
    /// The five counts are independent queries and need not come from one
    /// snapshot.
    pub fn get_metrics(&self) -> Result<KpiMetrics, KpiError> {
        let now = self.clock.now();
        if let Some(value) = fresh(&self.metrics, self.ttl_secs, now) {
            tracing::trace!("kpi metrics served from cache");
            return Ok(value);
        }

        let store = &self.store;
        let value = KpiMetrics {
            total_diplomas: store.template_count()?,
            total_requests: store.request_count()?,
            pending_requests: store.count_by_status(RequestStatus::Pending)?,
            ready_for_anchor: store.count_by_status(RequestStatus::ReadyForAnchor)?
                + store.count_by_status(RequestStatus::Approved)?,
            anchored_requests: store.count_by_status(RequestStatus::Anchored)?,
        };
        tracing::debug!(?value, "kpi metrics recomputed");
        store_in(&self.metrics, value, now);
        Ok(value)
    }

    /// Distinct students across anchored requests.
    pub fn count_graduated_students(&self) -> Result<GraduatedStudents, KpiError> {
        let now = self.clock.now();
        if let Some(value) = fresh(&self.graduates, self.ttl_secs, now) {
            tracing::trace!("graduated students served from cache");
            return Ok(value);
        }

        let anchored = self.store.iter_by_status(RequestStatus::Anchored)?;
        let students: HashSet<&str> = anchored
            .iter()
            .flat_map(|r| r.student_ids.iter().map(String::as_str))
            .collect();
        let value = GraduatedStudents {
            graduated_students: students.len() as u64,
            anchored_requests: anchored.len() as u64,
        };
        tracing::debug!(?value, "graduated students recomputed");
        store_in(&self.graduates, value, now);
        Ok(value)
    }

    /// Drop both cache entries.
    pub fn invalidate(&self) {
        clear(&self.metrics);
        clear(&self.graduates);
    }

    /// Event listener that invalidates the cache on every workflow event.
    pub fn listener(self: &Arc<Self>) -> Box<dyn Fn(&WorkflowEvent) + Send + Sync> {
        let aggregator = Arc::clone(self);
        Box::new(move |event: &WorkflowEvent| {
            tracing::trace!(?event, "kpi cache invalidated");
            aggregator.invalidate();
        })
    }
}
