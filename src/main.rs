use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use cas_client::{AgendaWatcher, ClientConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    info!(
        "Starting CAS agenda watcher against {} ({})",
        config.api_url, config.environment
    );

    let watcher = AgendaWatcher::new(&config)?;

    if !watcher.client().api().check_health().await {
        warn!("Backend health check failed, continuing anyway");
    }

    // Run once immediately
    if let Err(e) = watcher.run_checks().await {
        error!("Error during initial check: {}", e);
    }

    let sched = JobScheduler::new().await?;

    let job_watcher = watcher.clone();
    sched
        .add(Job::new_async(config.watch_schedule.as_str(), move |_uuid, _l| {
            let watcher = job_watcher.clone();
            Box::pin(async move {
                if let Err(e) = watcher.run_checks().await {
                    error!("Error checking agenda: {}", e);
                }
            })
        })?)
        .await?;

    info!("Scheduler started with schedule '{}'", config.watch_schedule);
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}
