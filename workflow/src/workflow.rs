//! The workflow service: store, clock and event bus wired together.

use std::sync::Arc;

use diploma_store::DiplomaStore;
use diploma_types::{Clock, Timestamp};

use crate::event::{EventBus, WorkflowEvent};

/// Entry point for every template, request and anchoring operation.
///
/// Operations are implemented in [`crate::templates`], [`crate::requests`] and
/// [`crate::anchor`]. Subscribe listeners before sharing the workflow.
pub struct DiplomaWorkflow<S> {
    pub(crate) store: Arc<S>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl<S: DiplomaStore> DiplomaWorkflow<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&WorkflowEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn emit(&self, event: WorkflowEvent) {
        self.events.emit(&event);
    }
}
