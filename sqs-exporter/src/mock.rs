//! In-memory stand-ins for SQS and CloudWatch.
//!
//! Used by the test suites and by `--mock`, which serves a small demo fleet
//! without touching AWS. Failure injection only exists in unit-test builds.

use std::collections::HashMap;
#[cfg(test)]
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::collector_core::{MetricStatistics, Queue, QueueService, StatisticsQuery};
use crate::enricher::{ATTR_MESSAGES, ATTR_MESSAGES_NOT_VISIBLE};
#[cfg(test)]
use crate::error::ExporterError;
use crate::error::Result;

#[derive(Default)]
pub struct FakeQueues {
    urls: Vec<String>,
    attributes: HashMap<String, HashMap<String, String>>,
    tags: HashMap<String, HashMap<String, String>>,
    tag_calls: AtomicUsize,
    attribute_calls: AtomicUsize,
    #[cfg(test)]
    faults: Faults,
}

/// Failure injection and a concurrency high-water mark for unit tests.
#[cfg(test)]
#[derive(Default)]
struct Faults {
    list: bool,
    tags: HashSet<String>,
    attributes: HashSet<String>,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

#[cfg(test)]
impl Faults {
    async fn attribute_call(&self, queue: &Queue) -> Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.attributes.contains(&queue.url) {
            return Err(ExporterError::queue_attributes(
                &queue.name,
                "injected attribute failure",
            ));
        }
        Ok(())
    }
}

impl FakeQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(self, url: &str, messages: u64, in_flight: u64) -> Self {
        let attrs = HashMap::from([
            (ATTR_MESSAGES.to_string(), messages.to_string()),
            (ATTR_MESSAGES_NOT_VISIBLE.to_string(), in_flight.to_string()),
        ]);
        self.with_attributes(url, attrs)
    }

    /// Registers a queue whose attribute map is returned verbatim.
    pub fn with_attributes(mut self, url: &str, attributes: HashMap<String, String>) -> Self {
        if !self.urls.iter().any(|u| u == url) {
            self.urls.push(url.to_string());
        }
        self.attributes.insert(url.to_string(), attributes);
        self
    }

    pub fn with_tag(mut self, url: &str, key: &str, value: &str) -> Self {
        self.tags
            .entry(url.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }

    pub fn attribute_calls(&self) -> usize {
        self.attribute_calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl FakeQueues {
    pub fn failing_list(mut self) -> Self {
        self.faults.list = true;
        self
    }

    pub fn failing_tags(mut self, url: &str) -> Self {
        self.faults.tags.insert(url.to_string());
        self
    }

    pub fn failing_attributes(mut self, url: &str) -> Self {
        self.faults.attributes.insert(url.to_string());
        self
    }

    /// Every attribute call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.faults.delay = Some(delay);
        self
    }

    /// Highest number of attribute calls observed running at the same time.
    pub fn max_concurrent_attribute_calls(&self) -> usize {
        self.faults.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueService for FakeQueues {
    async fn list_queue_urls(&self) -> Result<Vec<String>> {
        #[cfg(test)]
        if self.faults.list {
            return Err(ExporterError::list_queues("injected list failure"));
        }
        Ok(self.urls.clone())
    }

    async fn list_queue_tags(&self, queue_url: &str) -> Result<HashMap<String, String>> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        #[cfg(test)]
        if self.faults.tags.contains(queue_url) {
            return Err(ExporterError::list_queue_tags(queue_url, "injected tag failure"));
        }
        Ok(self.tags.get(queue_url).cloned().unwrap_or_default())
    }

    async fn get_queue_attributes(
        &self,
        queue: &Queue,
        attribute_names: &[&'static str],
    ) -> Result<HashMap<String, String>> {
        self.attribute_calls.fetch_add(1, Ordering::SeqCst);
        #[cfg(test)]
        self.faults.attribute_call(queue).await?;

        let attrs = self.attributes.get(&queue.url).cloned().unwrap_or_default();
        Ok(attrs
            .into_iter()
            .filter(|(k, _)| attribute_names.contains(&k.as_str()))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeStatistics {
    maxima: HashMap<String, Vec<f64>>,
    #[cfg(test)]
    failing: HashSet<String>,
    queries: Mutex<Vec<StatisticsQuery>>,
}

impl FakeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one data point for the queue.
    pub fn with_age(mut self, queue_name: &str, maximum: f64) -> Self {
        self.maxima
            .entry(queue_name.to_string())
            .or_default()
            .push(maximum);
        self
    }

    #[cfg(test)]
    pub fn failing(mut self, queue_name: &str) -> Self {
        self.failing.insert(queue_name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn queries(&self) -> Vec<StatisticsQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl MetricStatistics for FakeStatistics {
    async fn maximum(&self, query: &StatisticsQuery) -> Result<Vec<f64>> {
        self.queries.lock().push(query.clone());
        #[cfg(test)]
        if self.failing.contains(&query.dimension_value) {
            return Err(ExporterError::statistics(
                &query.dimension_value,
                "injected statistics failure",
            ));
        }
        Ok(self
            .maxima
            .get(&query.dimension_value)
            .cloned()
            .unwrap_or_default())
    }
}

/// Demo fleet served by `--mock`.
pub fn demo() -> (FakeQueues, FakeStatistics) {
    let base = "https://sqs.eu-west-1.amazonaws.com/123456789012";
    let orders = format!("{base}/orders");
    let payments = format!("{base}/payments");
    let orders_dlq = format!("{base}/orders-dlq");

    let queues = FakeQueues::new()
        .with_queue(&orders, 128, 12)
        .with_tag(&orders, "Owner", "team-orders")
        .with_tag(&orders, "env", "dev")
        .with_queue(&payments, 0, 3)
        .with_tag(&payments, "Owner", "team-payments")
        .with_queue(&orders_dlq, 4, 0)
        .with_tag(&orders_dlq, "env", "dev");

    let stats = FakeStatistics::new()
        .with_age("orders", 37.0)
        .with_age("orders-dlq", 5400.0);

    (queues, stats)
}
