//! Publishing of collected snapshots.
//!
//! Each successful cycle hands its full `QueueMetric` set to a [`MetricsSink`].
//! The Prometheus sink keeps that set as its only state and renders the gauges
//! from it at scrape time, so a scrape sees exactly one cycle and queues that
//! vanished from the latest cycle vanish from the output.

use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::collector_core::QueueMetric;
use crate::error::Result;
use crate::tags::ExportedTag;

pub const QUEUE_NAME_LABEL: &str = "queue_name";

pub trait MetricsSink: Send + Sync {
    /// Replaces whatever the previous cycle published.
    fn publish(&self, metrics: Vec<QueueMetric>);
}

struct QueueGauges {
    messages: GaugeVec,
    in_flight: GaugeVec,
    oldest_message_age: GaugeVec,
    total: GaugeVec,
    snapshot: Vec<QueueMetric>,
}

impl QueueGauges {
    fn vecs(&self) -> [&GaugeVec; 4] {
        [
            &self.messages,
            &self.in_flight,
            &self.oldest_message_age,
            &self.total,
        ]
    }
}

#[derive(Clone)]
struct QueueCollector {
    descs: Arc<Vec<Desc>>,
    exported_tags: Arc<Vec<ExportedTag>>,
    state: Arc<Mutex<QueueGauges>>,
}

impl QueueCollector {
    fn new(exported_tags: &[ExportedTag]) -> Result<Self> {
        let mut label_names = vec![QUEUE_NAME_LABEL];
        label_names.extend(exported_tags.iter().map(|t| t.normalized.as_str()));

        let gauge = |name: &str, help: &str| GaugeVec::new(Opts::new(name, help), &label_names);

        let state = QueueGauges {
            messages: gauge("sqs_queue_messages", "Sqs message queue size.")?,
            in_flight: gauge("sqs_queue_messages_in_flight", "Sqs in flight messages.")?,
            oldest_message_age: gauge(
                "sqs_queue_oldest_message_age",
                "Sqs queue age of oldest message in seconds.",
            )?,
            total: gauge(
                "sqs_queue_messages_total",
                "Total sqs queue messages both queued and in-flight.",
            )?,
            snapshot: Vec::new(),
        };

        let descs = state
            .vecs()
            .iter()
            .flat_map(|v| v.desc())
            .cloned()
            .collect();

        Ok(Self {
            descs: Arc::new(descs),
            exported_tags: Arc::new(exported_tags.to_vec()),
            state: Arc::new(Mutex::new(state)),
        })
    }

    fn label_values<'a>(&self, metric: &'a QueueMetric) -> Vec<&'a str> {
        let mut values = Vec::with_capacity(self.exported_tags.len() + 1);
        values.push(metric.queue_name.as_str());
        for tag in self.exported_tags.iter() {
            values.push(metric.tags.get(&tag.original).map(String::as_str).unwrap_or(""));
        }
        values
    }
}

impl Collector for QueueCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let state = self.state.lock();
        for v in state.vecs() {
            v.reset();
        }

        for metric in &state.snapshot {
            let labels = self.label_values(metric);
            state
                .messages
                .with_label_values(&labels)
                .set(metric.messages as f64);
            state
                .in_flight
                .with_label_values(&labels)
                .set(metric.messages_in_flight as f64);
            state
                .oldest_message_age
                .with_label_values(&labels)
                .set(metric.age_of_oldest_message_seconds as f64);
            state
                .total
                .with_label_values(&labels)
                .set(metric.messages_total() as f64);
        }

        state.vecs().iter().flat_map(|v| v.collect()).collect()
    }
}

/// Prometheus registry holding the four queue gauges.
///
/// Label names are `queue_name` followed by the normalized exported tags and
/// never change after construction.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    collector: QueueCollector,
}

impl PrometheusSink {
    pub fn new(exported_tags: &[ExportedTag]) -> Result<Self> {
        let registry = Registry::new();
        let collector = QueueCollector::new(exported_tags)?;
        registry.register(Box::new(collector.clone()))?;

        tracing::info!(
            exported_tags = ?exported_tags.iter().map(|t| &t.normalized).collect::<Vec<_>>(),
            "sqs gauges registered"
        );
        Ok(Self { registry, collector })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics are not valid utf-8: {e}")).into())
    }
}

impl MetricsSink for PrometheusSink {
    fn publish(&self, metrics: Vec<QueueMetric>) {
        tracing::debug!(queues = metrics.len(), "publishing snapshot");
        self.collector.state.lock().snapshot = metrics;
    }
}
