use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use crate::collector_core::{MetricStatistics, Queue, QueueMetric, QueueService, StatisticsQuery};
use crate::error::{ExporterError, Result};

pub const ATTR_MESSAGES: &str = "ApproximateNumberOfMessages";
pub const ATTR_MESSAGES_NOT_VISIBLE: &str = "ApproximateNumberOfMessagesNotVisible";

const AGE_NAMESPACE: &str = "AWS/SQS";
const AGE_METRIC_NAME: &str = "ApproximateAgeOfOldestMessage";
const AGE_DIMENSION: &str = "QueueName";
// one bucket over the whole window, so at most one data point comes back
const AGE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Builds the metric for one queue.
///
/// The oldest-message lookup is a separate CloudWatch request and only runs
/// when the queue has visible messages; an empty queue reports age 0.
pub async fn enrich(
    queues: &dyn QueueService,
    statistics: &dyn MetricStatistics,
    queue: Queue,
) -> Result<QueueMetric> {
    let attrs = queues
        .get_queue_attributes(&queue, &[ATTR_MESSAGES, ATTR_MESSAGES_NOT_VISIBLE])
        .await?;

    let messages = parse_attribute(&queue, &attrs, ATTR_MESSAGES)?;
    let messages_in_flight = parse_attribute(&queue, &attrs, ATTR_MESSAGES_NOT_VISIBLE)?;

    let age_of_oldest_message_seconds = if messages > 0 {
        oldest_message_age(statistics, &queue.name, SystemTime::now()).await?
    } else {
        0
    };

    Ok(QueueMetric {
        queue_name: queue.name,
        tags: queue.tags,
        messages,
        messages_in_flight,
        age_of_oldest_message_seconds,
    })
}

fn parse_attribute(
    queue: &Queue,
    attrs: &HashMap<String, String>,
    attribute: &'static str,
) -> Result<u64> {
    let value = attrs
        .get(attribute)
        .ok_or_else(|| ExporterError::MissingAttribute {
            queue: queue.name.clone(),
            attribute,
        })?;

    value
        .trim()
        .parse::<u64>()
        .map_err(|source| ExporterError::InvalidAttribute {
            queue: queue.name.clone(),
            attribute,
            value: value.clone(),
            source,
        })
}

/// Maximum `ApproximateAgeOfOldestMessage` over the trailing ten minutes.
pub async fn oldest_message_age(
    statistics: &dyn MetricStatistics,
    queue_name: &str,
    now: SystemTime,
) -> Result<u64> {
    let query = StatisticsQuery {
        namespace: AGE_NAMESPACE,
        metric_name: AGE_METRIC_NAME,
        dimension_name: AGE_DIMENSION,
        dimension_value: queue_name.to_string(),
        start_time: now - AGE_WINDOW,
        end_time: now,
        period_seconds: AGE_WINDOW.as_secs() as i32,
    };

    let maxima = statistics.maximum(&query).await?;

    match maxima.into_iter().reduce(f64::max) {
        Some(max) => Ok(max.max(0.0) as u64),
        None => {
            tracing::debug!(queue = queue_name, "no {AGE_METRIC_NAME} data point found");
            Ok(0)
        }
    }
}
