pub mod collector_core;
pub mod collectors;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod enricher;
pub mod error;
pub mod logging;
pub mod mock;
pub mod out;
pub mod refresh;
pub mod sink;
pub mod tags;

pub use collector_core::{Queue, QueueMetric};
pub use coordinator::Coordinator;
pub use error::{ExporterError, Result};
pub use sink::{MetricsSink, PrometheusSink};
pub use tags::{normalize_tag, ExportedTag};
