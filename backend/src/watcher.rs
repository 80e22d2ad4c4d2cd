// src/watcher.rs
use log::{info, warn};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::question_store::QuestionStore;
use crate::reload::reload_blocking;

/// Reloads the store whenever something under its roots is created, changed
/// or removed. Bursts of events collapse into a single reload.
pub async fn start_watcher(
    store: Arc<QuestionStore>,
    mut shutdown: watch::Receiver<bool>,
) -> notify::Result<()> {
    let (tx, mut rx) = mpsc::channel(64);
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        },
        Config::default(),
    )?;

    let mode = if store.options().recursive() {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };

    for path in store.options().paths() {
        if let Err(e) = watcher.watch(path, mode) {
            warn!("Could not watch {}: {}", path.display(), e);
        }
    }

    loop {
        let event: notify::Event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = shutdown.changed() => break,
        };

        if !matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Create(_)
        ) {
            continue;
        }

        info!("File system change detected: {:?}. Reloading questions.", event.paths);
        while rx.try_recv().is_ok() {}
        reload_blocking(store.clone()).await;
    }

    Ok(())
}
