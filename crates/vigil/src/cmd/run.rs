//! Run command - Start the agent
//!
//! Without kernel capture attached, `--replay` feeds recorded spans (one
//! JSON object per line) to the capture topic. The agent stops once the
//! replay is fully processed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_agent::Instrumenter;
use vigil_config::Config;
use vigil_pipeline::Topic;
use vigil_protocol::{Span, SpanBatch};

/// Spans per replayed batch
const REPLAY_BATCH_SIZE: usize = 64;

/// Run command arguments
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Newline-delimited JSON spans to feed instead of kernel capture
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

/// Run the agent until a shutdown signal (or the end of the replay)
pub async fn run(config: Config, args: RunArgs) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "Vigil starting"
    );

    config.validate().context("invalid configuration")?;
    let agent = Instrumenter::new(Arc::new(config)).context("failed to build agent")?;
    info!(transformers = ?agent.transformers(), "pipeline assembled");

    let cancel = CancellationToken::new();

    let replay_task = args.replay.map(|path| {
        let capture = agent.capture_topic();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = replay(&path, &capture, &cancel).await;
            // ends the pipeline once the transform stage drains
            capture.close();
            result
        })
    });

    let mut agent_task = tokio::spawn(agent.run(cancel.clone()));

    let joined = tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping agent...");
            cancel.cancel();
            (&mut agent_task).await
        }
        joined = &mut agent_task => joined,
    };
    cancel.cancel();

    if let Some(task) = replay_task {
        match task.await {
            Ok(Ok(spans)) => info!(spans, "replay finished"),
            Ok(Err(e)) => error!(error = %e, "replay failed"),
            Err(e) => warn!(error = %e, "replay task panicked"),
        }
    }

    joined
        .context("agent task panicked")?
        .context("agent failed")?;

    info!("Vigil shutdown complete");
    Ok(())
}

/// Send the spans of an NDJSON file in batches; returns the span count
pub async fn replay(
    path: &Path,
    capture: &Topic<SpanBatch>,
    cancel: &CancellationToken,
) -> Result<u64> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open replay file {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let mut batch = Vec::with_capacity(REPLAY_BATCH_SIZE);
    let mut sent = 0u64;
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let span: Span = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid span", path.display(), line_no))?;
        batch.push(span);

        if batch.len() >= REPLAY_BATCH_SIZE {
            sent += flush(capture, &mut batch, cancel).await?;
        }
    }
    sent += flush(capture, &mut batch, cancel).await?;
    Ok(sent)
}

async fn flush(
    capture: &Topic<SpanBatch>,
    batch: &mut SpanBatch,
    cancel: &CancellationToken,
) -> Result<u64> {
    if batch.is_empty() {
        return Ok(0);
    }
    let spans = batch.len() as u64;
    let batch = std::mem::replace(batch, Vec::with_capacity(REPLAY_BATCH_SIZE));
    tokio::select! {
        biased;
        _ = cancel.cancelled() => anyhow::bail!("replay cancelled"),
        sent = capture.send(batch) => sent.context("capture topic closed")?,
    }
    Ok(spans)
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
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
