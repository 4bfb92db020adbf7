pub mod cloudwatch;
pub mod sqs;

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};

use crate::collector_core::{MetricStatistics, QueueService};

pub use cloudwatch::CloudWatchStatistics;
pub use sqs::SqsQueues;

/// Remote API clients sharing one credential/region configuration.
pub struct AwsClients {
    pub queues: Arc<dyn QueueService>,
    pub statistics: Arc<dyn MetricStatistics>,
}

impl AwsClients {
    /// Credentials come from the default provider chain. `region` overrides the
    /// chain's region when set.
    pub async fn load(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(r) = region {
            loader = loader.region(Region::new(r));
        }
        let conf = loader.load().await;

        tracing::info!(
            region = conf.region().map(|r| r.as_ref()).unwrap_or("unknown"),
            "aws clients configured"
        );

        Self {
            queues: Arc::new(SqsQueues::new(&conf)),
            statistics: Arc::new(CloudWatchStatistics::new(&conf)),
        }
    }
}
