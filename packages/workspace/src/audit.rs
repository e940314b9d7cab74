//! Audit events written to the remote `auditLogs` collection

use crate::records::format_timestamp;
use crate::remote::{paths, Fields, RemoteStore};
use serde_json::json;
use slidedeck_editor::{AuditEvent, AuditSink};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// Fire-and-forget sink: each event is written on a spawned task and
/// failures are only logged
pub struct RemoteAuditSink {
    store: Arc<dyn RemoteStore>,
    handle: Handle,
}

impl RemoteAuditSink {
    pub fn new(store: Arc<dyn RemoteStore>, handle: Handle) -> Self {
        Self { store, handle }
    }
}

pub(crate) fn event_fields(event: &AuditEvent) -> Fields {
    match json!({
        "action": event.action.as_str(),
        "actorId": event.actor,
        "presentationId": event.presentation_id,
        "targetIds": event.target_ids,
        "timestamp": format_timestamp(event.at),
    }) {
        serde_json::Value::Object(map) => map,
        _ => Fields::new(),
    }
}

impl AuditSink for RemoteAuditSink {
    fn record(&self, event: AuditEvent) {
        let store = Arc::clone(&self.store);
        let fields = event_fields(&event);
        self.handle.spawn(async move {
            if let Err(e) = store.add(paths::AUDIT_LOGS, fields).await {
                debug!(action = event.action.as_str(), error = %e, "audit write dropped");
            }
        });
    }
}
