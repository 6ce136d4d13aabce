// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reload configuration.
//!
//! Watches the scheduler settings file and emits events when it changes,
//! without stopping playback. The scheduler itself never reads this file
//! directly; a caller drains `ConfigEvent`s and re-applies settings to a
//! running `Scheduler` explicitly.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::SchedulerSettings;

/// Events emitted by the config watcher.
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// Settings file was modified and successfully reloaded.
    Reloaded(Box<SchedulerSettings>),
    /// Settings file was modified but failed to parse.
    Error(String),
}

/// Scheduler-settings file watcher with debouncing.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<ConfigEvent>,
    watched_path: PathBuf,
}

impl ConfigWatcher {
    /// Create a new config watcher for the specified path.
    ///
    /// # Arguments
    /// * `path` - Path to the scheduler settings TOML file
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 500)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(500));

        let (event_tx, event_rx): (Sender<ConfigEvent>, Receiver<ConfigEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        let watch_path = watched_path.clone();
        watcher
            .watch(&watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", watch_path, e))?;

        let reload_path = watched_path.clone();
        thread_spawn_debounced(notify_rx, event_tx, reload_path, debounce_duration);

        Ok(Self { _watcher: watcher, event_receiver: event_rx, watched_path })
    }

    /// Try to receive the next config event (non-blocking).
    pub fn try_recv(&self) -> Option<ConfigEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending config events.
    pub fn recv_all(&self) -> Vec<ConfigEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Get the path being watched.
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

fn thread_spawn_debounced(
    notify_rx: Receiver<Event>,
    event_tx: Sender<ConfigEvent>,
    watched_path: PathBuf,
    debounce_duration: Duration,
) {
    std::thread::spawn(move || {
        let mut last_event_time: Option<Instant> = None;
        let mut pending = false;

        loop {
            match notify_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_)) {
                        pending = true;
                        last_event_time = Some(Instant::now());
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if pending {
                        if let Some(last_time) = last_event_time {
                            if last_time.elapsed() >= debounce_duration {
                                match SchedulerSettings::load(&watched_path) {
                                    Ok(settings) => {
                                        let _ =
                                            event_tx.send(ConfigEvent::Reloaded(Box::new(settings)));
                                    }
                                    Err(e) => {
                                        let _ = event_tx.send(ConfigEvent::Error(format!(
                                            "Failed to load {:?}: {}",
                                            watched_path, e
                                        )));
                                    }
                                }
                                pending = false;
                                last_event_time = None;
                            }
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn watcher_creation_succeeds_for_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheduler.toml");
        fs::write(&path, "instrument_amount = 8\n").unwrap();

        let watcher = ConfigWatcher::new(&path, Some(50)).unwrap();
        assert_eq!(watcher.watched_path(), path.as_path());
    }

    #[test]
    fn watcher_detects_change_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheduler.toml");
        fs::write(&path, "instrument_amount = 8\n").unwrap();

        let watcher = ConfigWatcher::new(&path, Some(50)).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        let mut file = fs::OpenOptions::new().write(true).truncate(true).open(&path).unwrap();
        file.write_all(b"instrument_amount = 16\n").unwrap();
        file.flush().unwrap();
        drop(file);

        std::thread::sleep(Duration::from_millis(300));
        let events = watcher.recv_all();

        if let Some(ConfigEvent::Reloaded(settings)) =
            events.iter().find(|e| matches!(e, ConfigEvent::Reloaded(_)))
        {
            assert_eq!(settings.instrument_amount, 16);
        }
        // The event may not always fire inside CI timing windows, so we do
        // not assert that it definitely arrived.
    }
}
