use std::collections::HashSet;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::coordinator::DEFAULT_MAX_CONCURRENCY;
use crate::error::{ExporterError, Result};
use crate::out::http::HEALTH_PATH;
use crate::sink::QUEUE_NAME_LABEL;
use crate::tags::ExportedTag;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Prometheus exporter for AWS SQS queues
#[derive(Parser, Debug, Clone)]
#[command(name = "sqs-exporter", version, about)]
pub struct ExporterConfig {
    /// Web server bind address
    #[arg(long, env = "SQS_EXPORTER_ADDR", default_value = "0.0.0.0")]
    pub addr: String,

    /// Web server port
    #[arg(long, env = "SQS_EXPORTER_PORT", default_value_t = 9999)]
    pub port: u16,

    /// Exporter metrics path
    #[arg(long, env = "SQS_EXPORTER_PATH", default_value = "/metrics")]
    pub path: String,

    /// Refresh delay in seconds
    #[arg(long, env = "SQS_EXPORTER_REFRESH", default_value_t = 60)]
    pub refresh: u64,

    /// Comma-separated queue tags to export as labels
    #[arg(long, env = "SQS_EXPORTER_TAGS", default_value = "")]
    pub tags: String,

    /// Maximum number of queues enriched at the same time
    #[arg(long, env = "SQS_EXPORTER_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// AWS region, defaults to the SDK provider chain
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    #[arg(long, env = "SQS_EXPORTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Serve a built-in demo fleet instead of calling AWS
    #[arg(long)]
    pub mock: bool,
}

impl ExporterConfig {
    pub fn exported_tags(&self) -> Vec<ExportedTag> {
        ExportedTag::parse_list(&self.tags)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh)
    }

    /// Host part of the bind address. May be a hostname, resolved when the
    /// listener binds; IPv6 brackets are stripped.
    pub fn bind_host(&self) -> &str {
        let addr = self.addr.trim();
        addr.strip_prefix('[')
            .and_then(|a| a.strip_suffix(']'))
            .unwrap_or(addr)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh == 0 {
            return Err(ExporterError::Config("refresh must be at least 1 second".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ExporterError::Config("max-concurrency must be at least 1".into()));
        }
        if !self.path.starts_with('/') {
            return Err(ExporterError::Config(format!(
                "metrics path {:?} must start with '/'",
                self.path
            )));
        }
        if self.path == HEALTH_PATH {
            return Err(ExporterError::Config(format!(
                "metrics path {HEALTH_PATH:?} is reserved for the health check"
            )));
        }
        if self.bind_host().is_empty() {
            return Err(ExporterError::Config("bind address must not be empty".into()));
        }
        validate_exported_tags(&self.exported_tags())
    }
}

/// Normalized names become label names, so they have to be valid and unique.
pub fn validate_exported_tags(tags: &[ExportedTag]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::from([QUEUE_NAME_LABEL]);
    for tag in tags {
        let label = tag.normalized.as_str();
        if label.is_empty() || label == "_" {
            return Err(ExporterError::Config(format!(
                "tag {:?} normalizes to an empty label name",
                tag.original
            )));
        }
        if label.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ExporterError::Config(format!(
                "tag {:?} normalizes to {label:?}, which starts with a digit",
                tag.original
            )));
        }
        if !seen.insert(label) {
            return Err(ExporterError::Config(format!(
                "tag {:?} normalizes to {label:?}, which is already in use",
                tag.original
            )));
        }
    }
    Ok(())
}
