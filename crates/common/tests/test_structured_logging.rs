use common::{JsonFormatter, LoggingConfig, StructuredLogEntry};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

/// Collects the entries the JSON formatter would write
struct Capture {
    formatter: JsonFormatter,
    entries: Arc<Mutex<Vec<StructuredLogEntry>>>,
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let entry = self.formatter.entry_for(event);
        self.entries.lock().expect("capture lock").push(entry);
    }
}

fn capture<F: FnOnce()>(include_context: bool, f: F) -> Vec<StructuredLogEntry> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(Capture {
        formatter: JsonFormatter::new(include_context),
        entries: Arc::clone(&entries),
    });
    tracing::subscriber::with_default(subscriber, f);
    let captured = entries.lock().expect("capture lock").clone();
    captured
}

#[test]
fn test_fields_are_lifted_into_entry() {
    let entries = capture(false, || {
        tracing::info!(
            skill_id = "weather",
            confidence = 0.66,
            duration_ms = 42u64,
            "Skill execution completed"
        );
    });

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.level, "INFO");
    assert_eq!(entry.message, "Skill execution completed");
    assert_eq!(entry.fields["skill_id"], "weather");
    assert_eq!(entry.fields["confidence"], 0.66);
    assert!(entry.context.is_none());

    let performance = entry.performance.as_ref().expect("timing block");
    assert_eq!(performance.duration_ms, Some(42));
    assert!(!entry.fields.contains_key("duration_ms"));
}

#[test]
fn test_entry_without_timing_has_no_performance_block() {
    let entries = capture(true, || {
        tracing::warn!(skill_id = "general_inquiry", "Overwriting registered skill");
    });

    let entry = &entries[0];
    assert_eq!(entry.level, "WARN");
    assert!(entry.performance.is_none());
    let context = entry.context.as_ref().expect("process context");
    assert_eq!(context.service, "skillmesh");
    assert!(context.pid > 0);

    let line = serde_json::to_string(entry).expect("serialize entry");
    assert!(line.contains("\"skill_id\":\"general_inquiry\""));
}

#[test]
fn test_logging_config_defaults() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, Level::INFO);
    assert!(!config.json_output);

    let json = LoggingConfig::from_settings("debug", true);
    assert_eq!(json.level, Level::DEBUG);
    assert!(json.json_output);
}
