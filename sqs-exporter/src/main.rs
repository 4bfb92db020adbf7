use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;

use sqs_exporter::collector_core::{MetricStatistics, QueueService};
use sqs_exporter::collectors::AwsClients;
use sqs_exporter::config::ExporterConfig;
use sqs_exporter::logging::init_logging;
use sqs_exporter::out::http;
use sqs_exporter::refresh::run_refresh_loop;
use sqs_exporter::{mock, Coordinator, PrometheusSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ExporterConfig::parse();
    init_logging(config.log_format);
    config.validate()?;

    let exported_tags = config.exported_tags();
    let sink = Arc::new(PrometheusSink::new(&exported_tags)?);

    let (queues, statistics): (Arc<dyn QueueService>, Arc<dyn MetricStatistics>) = if config.mock {
        tracing::warn!("serving built-in demo queues, aws is not contacted");
        let (q, s) = mock::demo();
        (Arc::new(q), Arc::new(s))
    } else {
        let clients = AwsClients::load(config.region.clone()).await;
        (clients.queues, clients.statistics)
    };

    let coordinator = Coordinator::new(queues, statistics, exported_tags)
        .with_max_concurrency(config.max_concurrency);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresh = {
        let sink = sink.clone();
        let period = config.refresh_interval();
        tokio::spawn(async move {
            run_refresh_loop(coordinator, sink.as_ref(), period, shutdown_rx).await
        })
    };

    let served = http::serve(config.bind_host(), config.port, &config.path, sink, async {
        shutdown_signal().await;
        tracing::info!("shutting down");
    })
    .await;

    let _ = shutdown_tx.send(true);
    refresh.await?;
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for sigterm");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
