use std::collections::HashMap;

use crate::collector_core::{Queue, QueueService};
use crate::error::Result;

/// Lists every queue reachable with the current credentials.
///
/// Tags are only fetched when `include_tags` is set; that call is one request
/// per queue. Any failure aborts the whole listing.
pub async fn list_queues(service: &dyn QueueService, include_tags: bool) -> Result<Vec<Queue>> {
    let urls = service.list_queue_urls().await?;

    let mut queues = Vec::with_capacity(urls.len());
    for url in urls {
        let tags = if include_tags {
            service.list_queue_tags(&url).await?
        } else {
            HashMap::new()
        };
        queues.push(Queue::from_url(url, tags));
    }

    tracing::debug!(count = queues.len(), include_tags, "queues discovered");
    Ok(queues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeQueues;

    #[tokio::test]
    async fn skips_tag_calls_when_not_requested() {
        let fake = FakeQueues::new()
            .with_queue("https://sqs.local/1/a", 1, 0)
            .with_tag("https://sqs.local/1/a", "Owner", "team-x")
            .with_queue("https://sqs.local/1/b", 0, 0);

        let queues = list_queues(&fake, false).await.unwrap();

        assert_eq!(queues.len(), 2);
        assert!(queues.iter().all(|q| q.tags.is_empty()));
        assert_eq!(fake.tag_calls(), 0);
    }

    #[tokio::test]
    async fn loads_tags_per_queue_when_requested() {
        let fake = FakeQueues::new()
            .with_queue("https://sqs.local/1/a", 1, 0)
            .with_tag("https://sqs.local/1/a", "Owner", "team-x")
            .with_queue("https://sqs.local/1/b", 0, 0);

        let queues = list_queues(&fake, true).await.unwrap();

        assert_eq!(fake.tag_calls(), 2);
        let a = queues.iter().find(|q| q.name == "a").unwrap();
        assert_eq!(a.tags.get("Owner").map(String::as_str), Some("team-x"));
        let b = queues.iter().find(|q| q.name == "b").unwrap();
        assert!(b.tags.is_empty());
    }

    #[tokio::test]
    async fn tag_failure_aborts_listing() {
        let fake = FakeQueues::new()
            .with_queue("https://sqs.local/1/a", 1, 0)
            .with_queue("https://sqs.local/1/b", 0, 0)
            .failing_tags("https://sqs.local/1/b");

        let err = list_queues(&fake, true).await.unwrap_err();
        assert!(matches!(err, crate::error::ExporterError::ListQueueTags { .. }));
    }

    #[tokio::test]
    async fn list_failure_is_propagated() {
        let fake = FakeQueues::new().failing_list();

        let err = list_queues(&fake, false).await.unwrap_err();
        assert!(matches!(err, crate::error::ExporterError::ListQueues { .. }));
    }
}
