use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;

use crate::collector_core::{MetricStatistics, QueueMetric, QueueService};
use crate::directory::list_queues;
use crate::enricher::enrich;
use crate::error::Result;
use crate::tags::ExportedTag;

pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Runs one discovery + enrichment cycle.
pub struct Coordinator {
    queues: Arc<dyn QueueService>,
    statistics: Arc<dyn MetricStatistics>,
    exported_tags: Vec<ExportedTag>,
    max_concurrency: usize,
}

impl Coordinator {
    pub fn new(
        queues: Arc<dyn QueueService>,
        statistics: Arc<dyn MetricStatistics>,
        exported_tags: Vec<ExportedTag>,
    ) -> Self {
        Self {
            queues,
            statistics,
            exported_tags,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Collects metrics for every discovered queue.
    ///
    /// All-or-nothing: every started enrichment runs to completion, then the
    /// first failure (in completion order) is returned and the successful
    /// results of the cycle are dropped.
    pub async fn collect(&self) -> Result<Vec<QueueMetric>> {
        let queues = list_queues(self.queues.as_ref(), !self.exported_tags.is_empty()).await?;

        tracing::info!("fetching metrics for {} queues", queues.len());
        let begin = Instant::now();

        let results: Vec<Result<QueueMetric>> = futures::stream::iter(queues)
            .map(|queue| enrich(self.queues.as_ref(), self.statistics.as_ref(), queue))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut metrics = Vec::with_capacity(results.len());
        let mut first_error = None;
        let mut failed = 0usize;
        for result in results {
            match result {
                Ok(m) => metrics.push(m),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(error = %e, "queue enrichment failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            tracing::warn!(
                failed,
                succeeded = metrics.len(),
                "discarding cycle after enrichment failures"
            );
            return Err(e);
        }

        tracing::info!(
            "metrics scraping completed for {} queues, duration: {} ms",
            metrics.len(),
            begin.elapsed().as_millis()
        );
        Ok(metrics)
    }
}
