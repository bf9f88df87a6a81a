use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use qdepth_broker::{Broker, QueueDepthSource, QueueStat};
use qdepth_http::{ExporterConfigBuilder, ExporterState, serve};
use qdepth_observability::init_tracing;
use tracing::{error, info};

mod cli;
mod error;

use cli::Cli;
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "qdepth exited with an error");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    init_tracing(cli.verbose, cli.log_format)?;

    let config = ExporterConfigBuilder::from_env()?
        .addr(cli.addr.clone())
        .queues(cli.queue_names())
        .build()?;

    let broker = Broker::connect(&cli.broker, cli.broker_options()?).await?;
    info!(backend = %broker.kind(), queues = ?config.queues, "Broker ready");

    // Fail fast on a broker that cannot answer before serving scrapes
    let stats = startup_poll(&broker, &config.queues, config.scrape_timeout).await?;
    info!("Current queues: {}", format_stats(&stats));

    let state = ExporterState::new(Arc::new(broker), &config)?;
    serve(&config, state).await?;

    info!("Shutting down");
    Ok(())
}

/// Poll once, bounded by the same timeout as a scrape
async fn startup_poll(
    source: &dyn QueueDepthSource,
    queues: &[String],
    timeout: Duration,
) -> Result<Vec<QueueStat>, CliError> {
    match tokio::time::timeout(timeout, source.queues(queues)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CliError::StartupTimeout(timeout)),
    }
}

fn format_stats(stats: &[QueueStat]) -> String {
    let entries: Vec<String> = stats
        .iter()
        .map(|stat| format!("{}: {}", stat.name, stat.depth))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qdepth_broker::{BrokerKind, BrokerResult};

    struct StalledSource;

    #[async_trait]
    impl QueueDepthSource for StalledSource {
        async fn queues(&self, _names: &[String]) -> BrokerResult<Vec<QueueStat>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        fn kind(&self) -> BrokerKind {
            BrokerKind::ManagementApi
        }
    }

    struct FixedSource;

    #[async_trait]
    impl QueueDepthSource for FixedSource {
        async fn queues(&self, names: &[String]) -> BrokerResult<Vec<QueueStat>> {
            Ok(names.iter().map(|name| QueueStat::new(name.as_str(), 7)).collect())
        }

        fn kind(&self) -> BrokerKind {
            BrokerKind::Keyspace
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_poll_times_out_on_stalled_broker() {
        let result = startup_poll(
            &StalledSource,
            &["celery".to_string()],
            Duration::from_secs(10),
        )
        .await;

        assert!(matches!(
            result,
            Err(CliError::StartupTimeout(timeout)) if timeout == Duration::from_secs(10)
        ));
    }

    #[tokio::test]
    async fn test_startup_poll_returns_stats() {
        let stats = startup_poll(&FixedSource, &["celery".to_string()], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(stats, vec![QueueStat::new("celery", 7)]);
    }

    #[test]
    fn test_format_stats() {
        let stats = vec![QueueStat::new("celery", 3), QueueStat::new("emails", 0)];
        assert_eq!(format_stats(&stats), "{celery: 3, emails: 0}");
        assert_eq!(format_stats(&[]), "{}");
    }
}
