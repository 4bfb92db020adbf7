use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = ExporterError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to list queues: {source}")]
    ListQueues { source: BoxError },

    #[error("failed to list tags for queue {queue_url}: {source}")]
    ListQueueTags { queue_url: String, source: BoxError },

    #[error("failed to get attributes for queue {queue}: {source}")]
    QueueAttributes { queue: String, source: BoxError },

    #[error("queue {queue} is missing attribute {attribute}")]
    MissingAttribute { queue: String, attribute: &'static str },

    #[error("queue {queue} attribute {attribute} is not an integer: {value:?}")]
    InvalidAttribute {
        queue: String,
        attribute: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to get oldest message age for queue {queue}: {source}")]
    Statistics { queue: String, source: BoxError },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Metrics(#[from] prometheus::Error),
}

impl ExporterError {
    pub fn list_queues(source: impl Into<BoxError>) -> Self {
        Self::ListQueues { source: source.into() }
    }

    pub fn list_queue_tags(queue_url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ListQueueTags {
            queue_url: queue_url.into(),
            source: source.into(),
        }
    }

    pub fn queue_attributes(queue: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::QueueAttributes {
            queue: queue.into(),
            source: source.into(),
        }
    }

    pub fn statistics(queue: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Statistics {
            queue: queue.into(),
            source: source.into(),
        }
    }
}
