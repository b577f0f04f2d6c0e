use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use strikebot_core::ScheduleConfig;
use strikebot_engine::Engine;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Wires the recurring maintenance jobs onto a shared engine:
/// the forced close before session end, the periodic session-hours
/// refresh, and the stale pending-order sweep.
pub struct JobRunner {
    config: ScheduleConfig,
    engine: Arc<Engine>,
}

impl JobRunner {
    #[must_use]
    pub fn new(config: ScheduleConfig, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }

    /// Registers all jobs and starts the scheduler.
    ///
    /// # Errors
    /// Returns an error if the scheduler fails to start or a cron
    /// expression fails to parse.
    pub async fn start(self) -> Result<JobScheduler> {
        info!(
            forced_close_cron = %self.config.forced_close_cron,
            session_refresh_cron = %self.config.session_refresh_cron,
            sweep_interval_secs = self.config.sweep_interval_secs,
            "Starting job runner"
        );

        let scheduler = JobScheduler::new().await?;

        let engine = self.engine.clone();
        let forced_close = Job::new_async(
            self.config.forced_close_cron.as_str(),
            move |_uuid, _lock| {
                let engine = engine.clone();
                Box::pin(async move {
                    if let Err(e) = engine.forced_close(Utc::now()).await {
                        error!("Forced close failed: {}", e);
                    }
                })
            },
        )?;
        scheduler.add(forced_close).await?;

        let engine = self.engine.clone();
        let session_refresh = Job::new_async(
            self.config.session_refresh_cron.as_str(),
            move |_uuid, _lock| {
                let engine = engine.clone();
                Box::pin(async move {
                    engine.refresh_session_hours(Utc::now()).await;
                })
            },
        )?;
        scheduler.add(session_refresh).await?;

        let engine = self.engine.clone();
        let sweep = Job::new_repeated_async(
            Duration::from_secs(self.config.sweep_interval_secs),
            move |_uuid, _lock| {
                let engine = engine.clone();
                Box::pin(async move {
                    let canceled = engine.sweep_pending(Utc::now()).await;
                    if canceled > 0 {
                        info!(canceled, "Swept stale pending orders");
                    }
                })
            },
        )?;
        scheduler.add(sweep).await?;

        scheduler.start().await?;
        info!("Job runner started");

        Ok(scheduler)
    }
}
