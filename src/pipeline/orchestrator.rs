// ABOUTME: Pipeline orchestrator - builds shared state, spawns workers, and shuts them down in order.
// ABOUTME: Shutdown drains the channel before stopping producers so none stay blocked on a full queue.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{info, warn};

use super::PipelineReport;
use crate::channel::BoundedChannel;
use crate::config::PipelineConfig;
use crate::controller::RateController;
use crate::error::PipelineError;
use crate::guard::ResourceGuard;
use crate::saver::Saver;
use crate::source::ItemSource;
use crate::worker::{Consumer, Producer};

/// A configured, not yet started pipeline.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ratepipe::prelude::*;
///
/// # async fn example() -> Result<(), PipelineError> {
/// let config = PipelineConfig::new()
///     .queue_capacity(5)
///     .target_rate(600.0)
///     .admission_limit(20);
///
/// let pipeline = Pipeline::new(
///     config,
///     Arc::new(ThumbnailUrlSource::new()),
///     Arc::new(NullSaver::new()),
/// )?;
/// let report = pipeline.run().await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<T> {
    config: PipelineConfig,
    source: Arc<dyn ItemSource<T>>,
    saver: Arc<dyn Saver<T>>,
}

impl<T: Send + Sync + 'static> Pipeline<T> {
    /// Validate `config` and prepare a pipeline. Nothing is spawned yet.
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn ItemSource<T>>,
        saver: Arc<dyn Saver<T>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            saver,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run until every consumer has been denied admission.
    pub async fn run(self) -> Result<PipelineReport, PipelineError> {
        self.run_with_cancel(std::future::pending::<()>()).await
    }

    /// Run until every consumer has been denied admission, or until `cancel`
    /// completes, in which case consumers are stopped early. Either way the
    /// full shutdown sequence runs before returning.
    pub async fn run_with_cancel<F>(self, cancel: F) -> Result<PipelineReport, PipelineError>
    where
        F: Future<Output = ()>,
    {
        let config = self.config;
        let started = Instant::now();

        let channel = Arc::new(BoundedChannel::new(config.queue_capacity)?);
        let guard = Arc::new(ResourceGuard::new(config.admission_limit)?);
        let controller = Arc::new(RateController::from_config(&config)?);

        info!(
            capacity = config.queue_capacity,
            target_rate = config.target_rate,
            producers = config.producers,
            consumers = config.consumers,
            limit = config.admission_limit,
            "starting pipeline"
        );

        let controller_task = controller.spawn();

        let mut producer_stops = Vec::with_capacity(config.producers);
        let mut producer_tasks = Vec::with_capacity(config.producers);
        for _ in 0..config.producers {
            let producer = Producer::new(
                channel.clone(),
                controller.clone(),
                self.source.clone(),
                config.initial_sleep_duration(),
            );
            producer_stops.push(producer.stop_signal());
            producer_tasks.push(tokio::spawn(producer.run()));
        }

        let mut consumer_stops = Vec::with_capacity(config.consumers);
        let mut consumer_tasks = Vec::with_capacity(config.consumers);
        for _ in 0..config.consumers {
            let consumer = Consumer::new(channel.clone(), guard.clone(), self.saver.clone());
            consumer_stops.push(consumer.stop_signal());
            consumer_tasks.push(tokio::spawn(consumer.run()));
        }

        let consumers_done = join_all(consumer_tasks);
        tokio::pin!(consumers_done);
        tokio::pin!(cancel);

        let consumer_results = tokio::select! {
            results = &mut consumers_done => results,
            () = &mut cancel => {
                warn!("pipeline cancelled, stopping consumers");
                for stop in &consumer_stops {
                    stop.stop();
                }
                consumers_done.await
            }
        };
        info!("all consumers finished");

        // Unblock producers stuck on a full queue before stopping anything
        let mut drained = channel.try_drain_all() as u64;

        controller.stop();
        let controller_result = controller_task.await;

        for stop in &producer_stops {
            stop.stop();
        }
        channel.close();
        let producer_results = join_all(producer_tasks).await;

        drained += channel.try_drain_all() as u64;

        controller_result?;
        let consumers = collect(consumer_results)?;
        let producers = collect(producer_results)?;

        let stats = guard.stats();
        let report = PipelineReport {
            produced: controller.produced(),
            admitted: stats.admitted,
            denied: stats.denied,
            released: stats.released,
            saved: stats.saved(),
            drained,
            remaining: channel.len(),
            limit: guard.limit(),
            target_rate: controller.target_rate(),
            final_rate: controller.current_rate(),
            elapsed: started.elapsed(),
            producers,
            consumers,
        };

        info!(
            produced = report.produced,
            admitted = report.admitted,
            denied = report.denied,
            drained = report.drained,
            "pipeline finished"
        );

        Ok(report)
    }
}

fn collect<S>(results: Vec<Result<S, JoinError>>) -> Result<Vec<S>, PipelineError> {
    Ok(results.into_iter().collect::<Result<Vec<_>, _>>()?)
}
