use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_sqs as sqs;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;

use crate::collector_core::{Queue, QueueService};
use crate::error::{ExporterError, Result};

pub struct SqsQueues {
    client: sqs::Client,
}

impl SqsQueues {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self {
            client: sqs::Client::new(conf),
        }
    }
}

#[async_trait]
impl QueueService for SqsQueues {
    async fn list_queue_urls(&self) -> Result<Vec<String>> {
        // first page only
        let list = self
            .client
            .list_queues()
            .send()
            .await
            .map_err(|e| ExporterError::list_queues(DisplayErrorContext(&e).to_string()))?;
        Ok(list.queue_urls().to_vec())
    }

    async fn list_queue_tags(&self, queue_url: &str) -> Result<HashMap<String, String>> {
        let res = self
            .client
            .list_queue_tags()
            .queue_url(queue_url)
            .send()
            .await
            .map_err(|e| {
                ExporterError::list_queue_tags(queue_url, DisplayErrorContext(&e).to_string())
            })?;
        Ok(res.tags().cloned().unwrap_or_default())
    }

    async fn get_queue_attributes(
        &self,
        queue: &Queue,
        attribute_names: &[&'static str],
    ) -> Result<HashMap<String, String>> {
        let mut req = self.client.get_queue_attributes().queue_url(&queue.url);
        for name in attribute_names {
            req = req.attribute_names(QueueAttributeName::from(*name));
        }

        let res = req.send().await.map_err(|e| {
            ExporterError::queue_attributes(&queue.name, DisplayErrorContext(&e).to_string())
        })?;

        let mut attrs = HashMap::new();
        if let Some(a) = res.attributes() {
            for (k, v) in a.iter() {
                attrs.insert(k.as_str().to_string(), v.clone());
            }
        }
        Ok(attrs)
    }
}
