use async_trait::async_trait;
use aws_sdk_cloudwatch as cloudwatch;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, Statistic};

use crate::collector_core::{MetricStatistics, StatisticsQuery};
use crate::error::{ExporterError, Result};

pub struct CloudWatchStatistics {
    client: cloudwatch::Client,
}

impl CloudWatchStatistics {
    pub fn new(conf: &aws_config::SdkConfig) -> Self {
        Self {
            client: cloudwatch::Client::new(conf),
        }
    }
}

#[async_trait]
impl MetricStatistics for CloudWatchStatistics {
    async fn maximum(&self, query: &StatisticsQuery) -> Result<Vec<f64>> {
        let dimension = Dimension::builder()
            .name(query.dimension_name)
            .value(&query.dimension_value)
            .build();

        let out = self
            .client
            .get_metric_statistics()
            .namespace(query.namespace)
            .metric_name(query.metric_name)
            .dimensions(dimension)
            .start_time(DateTime::from(query.start_time))
            .end_time(DateTime::from(query.end_time))
            .period(query.period_seconds)
            .statistics(Statistic::Maximum)
            .send()
            .await
            .map_err(|e| {
                ExporterError::statistics(&query.dimension_value, DisplayErrorContext(&e).to_string())
            })?;

        Ok(out.datapoints().iter().filter_map(|d| d.maximum()).collect())
    }
}
