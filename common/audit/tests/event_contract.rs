use common_audit::{EventPublisher, EventVerb, NoopEventSink, RecordingEventSink, UserEvent};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn verb_serializes_lowercase() {
	let v = serde_json::to_string(&EventVerb::Updated).unwrap();
	assert_eq!(v, "\"updated\"");
}

#[test]
fn display_and_parse_agree() {
	for ev in [UserEvent::created(1), UserEvent::updated(i64::MAX), UserEvent::deleted(0)] {
		assert_eq!(UserEvent::parse(&ev.to_string()), Some(ev));
	}
}

#[tokio::test]
async fn noop_sink_accepts_everything() {
	let publisher = EventPublisher::new(Arc::new(NoopEventSink), "user-events");
	assert!(publisher.publish(UserEvent::updated(5)).await.unwrap().is_ok());
}

#[tokio::test]
async fn detached_publish_is_observable_through_recording_sink() {
	let sink = Arc::new(RecordingEventSink::new());
	let publisher = EventPublisher::new(sink.clone(), "user-events");
	drop(publisher.publish(UserEvent::created(9)));
	assert!(sink.wait_for(1, Duration::from_secs(1)).await);
	assert_eq!(sink.payloads().await, vec!["User created: 9".to_string()]);
}
