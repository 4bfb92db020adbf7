use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::coordinator::Coordinator;
use crate::sink::MetricsSink;

/// Runs one cycle and publishes it. On failure the previously published
/// snapshot stays in place.
pub async fn refresh_once(coordinator: &Coordinator, sink: &dyn MetricsSink) -> bool {
    match coordinator.collect().await {
        Ok(metrics) => {
            sink.publish(metrics);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "sqs metrics refresh failed");
            false
        }
    }
}

/// Refreshes immediately, then every `period`, until `shutdown` flips to true.
///
/// Cycles never overlap: a slow cycle delays the next tick.
pub async fn run_refresh_loop(
    coordinator: Coordinator,
    sink: &dyn MetricsSink,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh_once(&coordinator, sink).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("refresh loop stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector_core::QueueMetric;
    use crate::mock::{FakeQueues, FakeStatistics};
    use crate::tags::ExportedTag;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Vec<QueueMetric>>>,
    }

    impl MetricsSink for RecordingSink {
        fn publish(&self, metrics: Vec<QueueMetric>) {
            self.published.lock().push(metrics);
        }
    }

    fn coordinator(sqs: FakeQueues) -> Coordinator {
        Coordinator::new(
            Arc::new(sqs),
            Arc::new(FakeStatistics::new()),
            ExportedTag::parse_list(""),
        )
    }

    #[tokio::test]
    async fn failed_cycle_publishes_nothing() {
        let sink = RecordingSink::default();
        let c = coordinator(FakeQueues::new().failing_list());

        assert!(!refresh_once(&c, &sink).await);
        assert!(sink.published.lock().is_empty());
    }

    #[tokio::test]
    async fn successful_cycle_publishes_snapshot() {
        let sink = RecordingSink::default();
        let c = coordinator(FakeQueues::new().with_queue("https://sqs.local/1/a", 0, 0));

        assert!(refresh_once(&c, &sink).await);
        let published = sink.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0][0].queue_name, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn first_refresh_is_immediate_then_periodic() {
        let sink = Arc::new(RecordingSink::default());
        let c = coordinator(FakeQueues::new().with_queue("https://sqs.local/1/a", 0, 0));
        let (tx, rx) = watch::channel(false);

        let task = {
            let sink = sink.clone();
            tokio::spawn(async move {
                run_refresh_loop(c, sink.as_ref(), Duration::from_secs(60), rx).await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.published.lock().len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sink.published.lock().len(), 2);

        tx.send(true).unwrap();
        task.await.unwrap();
    }
}
