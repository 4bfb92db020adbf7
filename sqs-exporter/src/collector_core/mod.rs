use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::Result;

/// A queue found during discovery. Lives for one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    pub name: String,
    pub url: String,
    pub tags: HashMap<String, String>,
}

impl Queue {
    pub fn from_url(url: impl Into<String>, tags: HashMap<String, String>) -> Self {
        let url = url.into();
        Self {
            name: queue_name_from_url(&url).to_string(),
            url,
            tags,
        }
    }
}

/// Name is the last path segment of the queue URL.
pub fn queue_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Point-in-time values for one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMetric {
    pub queue_name: String,
    pub tags: HashMap<String, String>,
    pub messages: u64,
    pub messages_in_flight: u64,
    pub age_of_oldest_message_seconds: u64,
}

impl QueueMetric {
    pub fn messages_total(&self) -> u64 {
        self.messages.saturating_add(self.messages_in_flight)
    }
}

/// Read-only view of the queueing service.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// First page of queue URLs.
    async fn list_queue_urls(&self) -> Result<Vec<String>>;

    async fn list_queue_tags(&self, queue_url: &str) -> Result<HashMap<String, String>>;

    /// Returns the requested attributes keyed by attribute name. Attributes the
    /// service did not return are absent from the map.
    async fn get_queue_attributes(
        &self,
        queue: &Queue,
        attribute_names: &[&'static str],
    ) -> Result<HashMap<String, String>>;
}

/// A single-dimension `Maximum` statistics query.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsQuery {
    pub namespace: &'static str,
    pub metric_name: &'static str,
    pub dimension_name: &'static str,
    pub dimension_value: String,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub period_seconds: i32,
}

/// Read-only view of the monitoring service.
#[async_trait]
pub trait MetricStatistics: Send + Sync {
    /// Maximum values of every data point in the window, in any order.
    /// Empty when the service has no sample for the window.
    async fn maximum(&self, query: &StatisticsQuery) -> Result<Vec<f64>>;
}
