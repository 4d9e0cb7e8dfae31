// ABOUTME: Command-line runner for the thumbnail download pipeline.
// ABOUTME: Layers flags over an optional JSON config file and prints the final report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ratepipe::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "ratepipe", version, about = "Rate-governed thumbnail download pipeline")]
struct Cli {
    /// JSON config file. Flags override its values.
    #[arg(short, long, env = "RATEPIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of URLs waiting in the queue
    #[arg(long)]
    capacity: Option<usize>,

    /// Target production rate in items per minute
    #[arg(short, long)]
    rate: Option<f64>,

    /// Number of producer tasks
    #[arg(short, long)]
    producers: Option<usize>,

    /// Number of consumer tasks
    #[arg(short = 'n', long)]
    consumers: Option<usize>,

    /// Maximum number of successful downloads
    #[arg(short, long)]
    limit: Option<usize>,

    /// Items produced before throttling starts
    #[arg(long)]
    warmup: Option<u64>,

    /// Initial producer sleep in milliseconds
    #[arg(long)]
    initial_sleep_ms: Option<u64>,

    /// Controller tick in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Give up on a single download after this many milliseconds
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,

    /// Write 64x64 PNG thumbnails here. Without it thumbnails are made and discarded.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip network access and count items instead of downloading them
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config = config.queue_capacity(capacity);
        }
        if let Some(rate) = self.rate {
            config = config.target_rate(rate);
        }
        if let Some(producers) = self.producers {
            config = config.producers(producers);
        }
        if let Some(consumers) = self.consumers {
            config = config.consumers(consumers);
        }
        if let Some(limit) = self.limit {
            config = config.admission_limit(limit);
        }
        if let Some(warmup) = self.warmup {
            config = config.warmup_threshold(warmup);
        }
        if let Some(ms) = self.initial_sleep_ms {
            config = config.initial_sleep(Duration::from_millis(ms));
        }
        if let Some(ms) = self.tick_ms {
            config = config.tick(Duration::from_millis(ms));
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config = config.fetch_timeout(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }

    fn saver(&self, config: &PipelineConfig) -> Result<Arc<dyn Saver<String>>> {
        if self.dry_run {
            return Ok(Arc::new(NullSaver::new()));
        }
        let mut saver = FetchSaver::new().with_timeout(config.fetch_timeout_duration());
        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            saver = saver.with_output_dir(dir);
        }
        Ok(Arc::new(saver))
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "ratepipe=info",
        1 => "ratepipe=debug",
        _ => "ratepipe=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.pipeline_config()?;
    let saver = cli.saver(&config)?;
    let pipeline = Pipeline::new(config, Arc::new(ThumbnailUrlSource::new()), saver)?;

    let report = pipeline
        .run_with_cancel(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, shutting down");
            }
        })
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    if !report.is_consistent() {
        tracing::warn!("report counters do not add up");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "ratepipe",
            "--capacity",
            "5",
            "--rate",
            "600",
            "-p",
            "2",
            "-n",
            "3",
            "--limit",
            "20",
            "--tick-ms",
            "5",
            "--fetch-timeout-ms",
            "2500",
        ]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.target_rate, 600.0);
        assert_eq!(config.producers, 2);
        assert_eq!(config.consumers, 3);
        assert_eq!(config.admission_limit, 20);
        assert_eq!(config.tick_duration(), Duration::from_millis(5));
        assert_eq!(config.warmup_threshold, 5);
        assert_eq!(config.fetch_timeout_duration(), Duration::from_millis(2500));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"queue_capacity": 7, "consumers": 9}"#).unwrap();

        let cli = Cli::parse_from([
            "ratepipe",
            "--config",
            path.to_str().unwrap(),
            "--consumers",
            "2",
        ]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.queue_capacity, 7);
        assert_eq!(config.consumers, 2);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = Cli::parse_from(["ratepipe", "--limit", "0"]);
        assert!(cli.pipeline_config().is_err());
    }
}
