use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use tj_modbot::config;
use tj_modbot::coordinator::Coordinator;
use tj_modbot::model::{Entity, Job, JobKind};
use tj_modbot::notify::NotificationClient;
use tj_modbot::pool::{PoolDeps, TaskPool};
use tj_modbot::predict::PredictionClient;
use tj_modbot::sink::{EntitySink, TracingErrorSink};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

/// One line of the stdin intake. The HTTP gateway is an external
/// collaborator; newline-delimited JSON stands in for it here.
#[derive(Debug, serde::Deserialize)]
struct SubmitRequest {
    credential: String,
    job_kind: JobKind,
    entity: Entity,
}

/// Stand-in for the external persistence service: accepted entities are
/// logged instead of written, since the relational layer lives outside
/// this process.
struct LoggingSink;

#[async_trait]
impl EntitySink for LoggingSink {
    async fn create(&self, entity: &Entity) -> Result<i64> {
        info!(kind = entity.kind_str(), user_id = entity.user_id(), "create accepted entity");
        Ok(0)
    }

    async fn update(&self, entity: &Entity) -> Result<()> {
        info!(kind = entity.kind_str(), user_id = entity.user_id(), "update accepted entity");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let poll_interval = Duration::from_secs(cfg.app.poll_interval_secs);
    let toxicity = PredictionClient::new(&cfg.prediction.toxicity_url, poll_interval)?;
    let country = PredictionClient::new(&cfg.prediction.country_url, poll_interval)?;
    let notifier = NotificationClient::new(&cfg.notification.url, cfg.notification.api_key.clone())?;

    let (pool, completions) = TaskPool::spawn(
        cfg.app.workers,
        PoolDeps {
            toxicity: Arc::new(toxicity),
            country: Arc::new(country),
            toxicity_threshold: cfg.app.toxicity_threshold,
        },
    );

    let coordinator = Coordinator::new(
        Arc::new(LoggingSink),
        Arc::new(notifier),
        Arc::new(TracingErrorSink),
    );
    let coordinator_handle = tokio::spawn(coordinator.run(completions));

    info!("moderation pipeline ready; reading jobs from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SubmitRequest>(&line) {
            Ok(req) => {
                let job = Job::new(req.credential, req.job_kind, req.entity);
                info!(job_id = %job.job_id, "job accepted, pending moderation");
                pool.submit(job)?;
            }
            Err(err) => error!(?err, "malformed job submission"),
        }
    }

    // EOF: drain in-flight jobs, then let the coordinator finish.
    pool.shutdown().await;
    coordinator_handle.await?;
    Ok(())
}
