// THEORY:
// Estimating density is CPU-bound and independent per photograph, so a backlog of
// uploads can be spread across cores. The `ParallelDensityPipeline` owns a small
// worker pool: one dispatcher hands tasks round-robin to N workers, and each worker
// runs the estimate on tokio's blocking pool so the async scheduler is never stalled.
//
// Every task carries its own oneshot reply channel, so results come back in the
// order they were submitted regardless of which worker finished first. Workers drop
// the photo bytes and the decoded buffer as soon as the density is known.
//
// The pool spawns tasks on construction and therefore must be created inside a tokio
// runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use log::{debug, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::core_modules::density::DensityEstimator;
use crate::core_modules::growth::{
    DensitySample, DensitySeries, SeriesGrowth, compute_series_growth,
};
use crate::error::{ConfigError, PipelineError};
use crate::pipeline::PlantPhoto;

type DensityResult = Result<DensitySample, PipelineError>;

pub struct DensityTask {
    pub photo: PlantPhoto,
    pub result_sender: oneshot::Sender<DensityResult>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<DensityTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(estimator: Arc<DensityEstimator>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<DensityTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<DensityTask>())
            .unzip();

        // Single dispatcher distributing tasks round-robin.
        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                // A closed worker drops the task, which the caller sees as WorkerUnavailable.
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker_estimator = Arc::clone(&estimator);
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = Self::process_photo_worker(&worker_estimator, task.photo).await;
                    let _ = task.result_sender.send(result);
                }
                debug!("density worker {} stopped", worker_id);
            });
            workers.push(worker);
        }

        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    async fn process_photo_worker(
        estimator: &Arc<DensityEstimator>,
        photo: PlantPhoto,
    ) -> DensityResult {
        let estimator = Arc::clone(estimator);
        let PlantPhoto { timestamp, bytes } = photo;
        let density = tokio::task::spawn_blocking(move || estimator.estimate_bytes(&bytes))
            .await
            .map_err(|_| PipelineError::WorkerUnavailable)??;
        Ok(DensitySample::new(timestamp, density))
    }

    pub async fn process_photo(&self, photo: PlantPhoto) -> DensityResult {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(DensityTask {
                photo,
                result_sender,
            })
            .map_err(|_| PipelineError::WorkerUnavailable)?;

        result_receiver
            .await
            .map_err(|_| PipelineError::WorkerUnavailable)?
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting tasks and waits for in-flight ones to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

pub struct ParallelDensityPipeline {
    config: PipelineConfig,
    worker_pool: WorkerPool,
    photos_processed: AtomicU64,
}

impl ParallelDensityPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let estimator = DensityEstimator::new(config.threshold);
        Ok(Self::with_estimator(config, estimator))
    }

    pub fn with_estimator(config: PipelineConfig, estimator: DensityEstimator) -> Self {
        let worker_pool = WorkerPool::new(Arc::new(estimator), config.effective_worker_count());
        info!(
            "parallel density pipeline started with {} workers",
            worker_pool.worker_count()
        );
        Self {
            config,
            worker_pool,
            photos_processed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    pub fn photos_processed(&self) -> u64 {
        self.photos_processed.load(Ordering::Relaxed)
    }

    pub async fn estimate(&self, photo: PlantPhoto) -> DensityResult {
        let result = self.worker_pool.process_photo(photo).await;
        self.photos_processed.fetch_add(1, Ordering::Relaxed);
        result
    }

    /// One result per photo, in submission order.
    pub async fn estimate_all(&self, photos: Vec<PlantPhoto>) -> Vec<DensityResult> {
        join_all(photos.into_iter().map(|photo| self.estimate(photo))).await
    }

    pub async fn build_series(&self, photos: Vec<PlantPhoto>) -> Result<DensitySeries, PipelineError> {
        self.estimate_all(photos).await.into_iter().collect()
    }

    pub async fn generate_report(&self, photos: Vec<PlantPhoto>) -> Result<SeriesGrowth, PipelineError> {
        let series = self.build_series(photos).await?;
        Ok(compute_series_growth(&series)?)
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
