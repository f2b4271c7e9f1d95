/// Load testing simulator implementation.
use crate::error::AppError;
use crate::http::client::ShopApi;
use crate::simulator::config::SimulatorConfig;
use crate::simulator::registry::UsernameRegistry;
use crate::simulator::session::{Endpoint, RequestSample, UserSession};
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Shared counters feeding the progress bar during a run.
#[derive(Default)]
struct RunCounters {
    completed: AtomicUsize,
    successful: AtomicUsize,
    failed: AtomicUsize,
    total_latency: AtomicU64,
}

impl RunCounters {
    /// Note one finished iteration. `sample` is None when a guarded task
    /// skipped without issuing a request; the iteration still advances the
    /// progress bar.
    fn record(&self, sample: Option<&RequestSample>, progress: Option<&ProgressBar>, started: Instant) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(sample) = sample {
            if sample.success {
                self.successful.fetch_add(1, Ordering::Relaxed);
                self.total_latency
                    .fetch_add(sample.latency_ms, Ordering::Relaxed);
            } else {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Some(pb) = progress {
            let success_count = self.successful.load(Ordering::Relaxed);
            let fail_count = self.failed.load(Ordering::Relaxed);
            let total_latency = self.total_latency.load(Ordering::Relaxed);
            let avg_latency = if success_count > 0 {
                total_latency / success_count as u64
            } else {
                0
            };

            let elapsed = started.elapsed().as_secs_f64();
            let throughput = if elapsed > 0.0 {
                completed as f64 / elapsed
            } else {
                0.0
            };

            pb.set_message(format!(
                "Success: {} | Failed: {} | Avg Latency: {}ms | Throughput: {:.1} req/s",
                success_count, fail_count, avg_latency, throughput
            ));
            pb.set_position(completed as u64);
        }
    }
}

/// Load testing simulator.
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Create a new simulator.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Run the load test.
    pub async fn run<C: ShopApi + 'static>(
        &self,
        client: Arc<C>,
    ) -> Result<Vec<RequestSample>, AppError> {
        self.run_with_progress(client, None).await
    }

    /// Run the load test with an optional progress bar.
    ///
    /// Spawns one tokio task per simulated user. Each user logs in once,
    /// then runs the configured number of weighted tasks with the configured
    /// wait between them.
    pub async fn run_with_progress<C: ShopApi + 'static>(
        &self,
        client: Arc<C>,
        progress_bar: Option<Arc<ProgressBar>>,
    ) -> Result<Vec<RequestSample>, AppError> {
        let registry = Arc::new(UsernameRegistry::new());
        let counters = Arc::new(RunCounters::default());
        let start_time = Instant::now();

        let mut handles = Vec::with_capacity(self.config.users);
        for _ in 0..self.config.users {
            let client = client.clone();
            let config = self.config.clone();
            let registry = registry.clone();
            let counters = counters.clone();
            let progress = progress_bar.clone();

            handles.push(tokio::spawn(async move {
                let mut session = UserSession::new(client, config.clone(), registry);
                let mut samples = Vec::with_capacity(config.iterations + 1);

                let auth = session.start().await;
                counters.record(Some(&auth), progress.as_deref(), start_time);
                samples.push(auth);

                for _ in 0..config.iterations {
                    let sample = session.run_task().await;
                    counters.record(sample.as_ref(), progress.as_deref(), start_time);
                    if let Some(sample) = sample {
                        samples.push(sample);
                    }

                    if let Some(wait) = config.wait_time {
                        let delay_ms = if wait.min_ms == wait.max_ms {
                            wait.min_ms
                        } else {
                            fastrand::u64(wait.min_ms..=wait.max_ms)
                        };
                        sleep(Duration::from_millis(delay_ms)).await;
                    }
                }

                samples
            }));
        }

        let mut collected = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(samples) => collected.extend(samples),
                Err(e) => collected.push(RequestSample {
                    endpoint: Endpoint::Auth,
                    success: false,
                    status: None,
                    latency_ms: 0,
                    error: Some(format!("session task join error: {}", e)),
                }),
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.finish_with_message("Load test completed");
        }

        Ok(collected)
    }
}
