use serde_json::Value;
use skill_core::{LogKind, LogSink, OrchestrationContext};
use std::sync::Arc;
use tracing::debug;

/// Hand a record to the sink without waiting for it. Failures are dropped.
pub(crate) fn spawn_record(
    sink: Option<&Arc<dyn LogSink>>,
    kind: LogKind,
    payload: Value,
    context: &OrchestrationContext,
) {
    let Some(sink) = sink else {
        return;
    };
    let sink = Arc::clone(sink);
    let context = context.clone();
    tokio::spawn(async move {
        if let Err(e) = sink.record(kind, payload, &context).await {
            debug!(kind = kind.as_str(), error = %e, "Log sink rejected record");
        }
    });
}
