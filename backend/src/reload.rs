// src/reload.rs
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::question_store::{QuestionStore, ReloadSummary};

/// Rebuilds on a blocking thread so the runtime keeps serving while files are read.
pub async fn reload_blocking(store: Arc<QuestionStore>) -> Option<ReloadSummary> {
    match tokio::task::spawn_blocking(move || store.reload()).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            error!("Reload task failed: {}", e);
            None
        }
    }
}

/// Reloads `store` every `every` until `shutdown` flips to `true` or its
/// sender is dropped. A reload already running when shutdown arrives is
/// allowed to finish.
pub fn spawn_periodic_reload(
    store: Arc<QuestionStore>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Scheduled rebuild every {:?}", every);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("Started scheduled rebuild");
                    reload_blocking(store.clone()).await;
                    if *shutdown.borrow() {
                        break;
                    }
                    info!("Next scheduled rebuild in {:?}", every);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Stopped scheduled rebuilds");
    })
}
