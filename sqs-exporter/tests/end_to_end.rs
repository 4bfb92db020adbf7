use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqs_exporter::collector_core::QueueService;
use sqs_exporter::mock::{FakeQueues, FakeStatistics};
use sqs_exporter::refresh::refresh_once;
use sqs_exporter::{Coordinator, ExportedTag, ExporterError, MetricsSink, PrometheusSink, Queue};

const A: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/queue-a";
const B: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/queue-b";
const C: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/queue-c";

/// Wraps a fake fleet and fails discovery or one queue's attribute call.
struct Broken {
    inner: FakeQueues,
    list: bool,
    attributes_of: Option<&'static str>,
}

impl Broken {
    fn list() -> Self {
        Self { inner: fleet(), list: true, attributes_of: None }
    }

    fn attributes_of(url: &'static str) -> Self {
        Self { inner: fleet(), list: false, attributes_of: Some(url) }
    }
}

#[async_trait]
impl QueueService for Broken {
    async fn list_queue_urls(&self) -> sqs_exporter::Result<Vec<String>> {
        if self.list {
            return Err(ExporterError::list_queues("connection reset"));
        }
        self.inner.list_queue_urls().await
    }

    async fn list_queue_tags(&self, queue_url: &str) -> sqs_exporter::Result<HashMap<String, String>> {
        self.inner.list_queue_tags(queue_url).await
    }

    async fn get_queue_attributes(
        &self,
        queue: &Queue,
        attribute_names: &[&'static str],
    ) -> sqs_exporter::Result<HashMap<String, String>> {
        if self.attributes_of == Some(queue.url.as_str()) {
            return Err(ExporterError::queue_attributes(&queue.name, "throttled"));
        }
        self.inner.get_queue_attributes(queue, attribute_names).await
    }
}

fn fleet() -> FakeQueues {
    FakeQueues::new()
        .with_queue(A, 5, 2)
        .with_tag(A, "Owner", "team-x")
        .with_queue(B, 0, 0)
        .with_queue(C, 1, 0)
}

#[tokio::test]
async fn one_broken_queue_blanks_the_cycle() {
    let tags = ExportedTag::parse_list("Owner");
    let sink = PrometheusSink::new(&tags).unwrap();
    let cw = Arc::new(FakeStatistics::new().with_age("queue-a", 42.0));
    let coordinator = Coordinator::new(Arc::new(Broken::attributes_of(C)), cw, tags);

    let err = coordinator.collect().await.unwrap_err();
    assert!(matches!(err, ExporterError::QueueAttributes { .. }));

    assert!(!refresh_once(&coordinator, &sink).await);
    let text = sink.encode().unwrap();
    assert!(!text.contains("queue-a"));
    assert!(!text.contains("queue-b"));
}

#[tokio::test]
async fn healthy_cycle_publishes_consistent_labels() {
    let tags = ExportedTag::parse_list("Owner");
    let sink = PrometheusSink::new(&tags).unwrap();
    let cw = Arc::new(
        FakeStatistics::new()
            .with_age("queue-a", 42.0)
            .with_age("queue-b", 900.0),
    );
    let coordinator = Coordinator::new(Arc::new(fleet()), cw.clone(), tags);

    assert!(refresh_once(&coordinator, &sink).await);
    // queue-b is empty, so only a and c hit CloudWatch
    assert_eq!(cw.calls(), 2);

    let text = sink.encode().unwrap();
    for line in [
        r#"sqs_queue_messages{owner="team-x",queue_name="queue-a"} 5"#,
        r#"sqs_queue_messages_in_flight{owner="team-x",queue_name="queue-a"} 2"#,
        r#"sqs_queue_oldest_message_age{owner="team-x",queue_name="queue-a"} 42"#,
        r#"sqs_queue_messages_total{owner="team-x",queue_name="queue-a"} 7"#,
        r#"sqs_queue_messages{owner="",queue_name="queue-b"} 0"#,
        r#"sqs_queue_oldest_message_age{owner="",queue_name="queue-b"} 0"#,
        r#"sqs_queue_oldest_message_age{owner="",queue_name="queue-c"} 0"#,
    ] {
        assert!(text.contains(line), "missing {line}\n{text}");
    }
}

#[tokio::test]
async fn failed_cycle_keeps_previous_snapshot() {
    let tags = ExportedTag::parse_list("Owner");
    let sink = PrometheusSink::new(&tags).unwrap();
    sink.publish(Vec::new());

    let ok = Coordinator::new(Arc::new(fleet()), Arc::new(FakeStatistics::new()), tags.clone());
    assert!(refresh_once(&ok, &sink).await);
    let before = sink.encode().unwrap();

    let broken = Coordinator::new(
        Arc::new(Broken::list()),
        Arc::new(FakeStatistics::new()),
        tags,
    );
    assert!(!refresh_once(&broken, &sink).await);

    assert_eq!(sink.encode().unwrap(), before);
    assert!(before.contains(r#"queue_name="queue-c""#));
}
