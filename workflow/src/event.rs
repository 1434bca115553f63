//! Events emitted after a workflow mutation commits.

use diploma_types::{Identity, RequestId, RequestStatus, TemplateId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowEvent {
    TemplateCreated {
        template_id: TemplateId,
    },
    RequestCreated {
        request_id: RequestId,
        created_by: Identity,
    },
    /// A required signer approved or declined.
    SignatureRecorded {
        request_id: RequestId,
        signer: Identity,
        approve: bool,
    },
    StatusChanged {
        request_id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
    },
    AnchorRequested {
        request_id: RequestId,
        batch_id: String,
    },
    /// Only `Pending` requests can be deleted.
    RequestDeleted {
        request_id: RequestId,
    },
}

/// Synchronous fan-out event bus for workflow events.
///
/// Listeners are invoked inline on the emitting thread after the store write
/// has committed; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&WorkflowEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&WorkflowEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &WorkflowEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
