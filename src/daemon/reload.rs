// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reload coordinator
//!
//! Watches the configuration directory and its `match/` subdirectory.
//! Bursts of change notifications (editors often write, rename and chmod
//! in quick succession) collapse into one reload once the directory has
//! been quiet for the settle period. A successful load is delivered to
//! the daemon as an ordinary queued message; a failed load is logged and
//! the active rules stay in force.

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::{DaemonError, Message};
use crate::config::{is_yaml_file, load_rule_set, log_validation, MATCH_DIR};

/// Quiet period before a reload fires
pub const SETTLE_PERIOD: Duration = Duration::from_millis(500);

/// Collapses bursts of changes into a single deadline
///
/// Pure state machine; callers supply the clock.
#[derive(Debug)]
pub struct Debouncer {
    settle: Duration,
    last_change: Option<Instant>,
}

impl Debouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            last_change: None,
        }
    }

    /// Records a relevant change, pushing the deadline back.
    pub fn record(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    /// When the pending reload should fire, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.last_change.map(|t| t + self.settle)
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// Returns true (once) when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_change = None;
                true
            }
            _ => false,
        }
    }
}

/// Creates, modifies or removes a `.yml`/`.yaml` file
pub fn is_relevant_change(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| is_yaml_file(p))
}

/// Background watcher feeding reloaded rule sets into the daemon queue
pub struct ReloadCoordinator {
    // Dropping the watcher disconnects the worker's channel
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

impl ReloadCoordinator {
    /// Starts watching `config_dir`.
    ///
    /// Directories that cannot be watched (e.g. a missing `match/`) are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Fails if the OS watcher or the worker thread cannot be created.
    pub fn spawn(config_dir: PathBuf, settle: Duration, sender: Sender<Message>) -> Result<Self, DaemonError> {
        let (change_tx, change_rx) = unbounded();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = change_tx.send(res);
            },
            Config::default(),
        )?;

        for dir in [config_dir.clone(), config_dir.join(MATCH_DIR)] {
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => debug!("Watching {}", dir.display()),
                Err(e) => warn!("Cannot watch {}: {} (changes there will not reload)", dir.display(), e),
            }
        }

        let worker = thread::Builder::new()
            .name("texpand-reload".to_string())
            .spawn(move || {
                let mut debouncer = Debouncer::new(settle);
                loop {
                    let received = match debouncer.deadline() {
                        Some(deadline) => change_rx.recv_deadline(deadline),
                        None => change_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };

                    match received {
                        Ok(Ok(event)) => {
                            if is_relevant_change(&event) {
                                debug!("Config change: {:?} {:?}", event.kind, event.paths);
                                debouncer.record(Instant::now());
                            }
                        }
                        Ok(Err(e)) => warn!("File watcher error: {}", e),
                        Err(RecvTimeoutError::Timeout) => {
                            if debouncer.fire(Instant::now()) && !reload(&config_dir, &sender) {
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Reload coordinator stopped");
            })
            .map_err(|source| DaemonError::Thread {
                name: "reload",
                source,
            })?;

        Ok(Self {
            watcher: Some(watcher),
            worker: Some(worker),
        })
    }

    /// Stops watching and waits for the worker to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.watcher.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Reload worker panicked");
            }
        }
    }
}

impl Drop for ReloadCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Loads and queues a new rule set. Returns false once the daemon is gone.
fn reload(config_dir: &Path, sender: &Sender<Message>) -> bool {
    match load_rule_set(config_dir) {
        Ok(rules) => {
            info!("Configuration changed, {} rules loaded", rules.len());
            log_validation(&rules);
            sender.send(Message::Reload(Arc::new(rules))).is_ok()
        }
        Err(e) => {
            error!("Reload failed, keeping previous rules: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_debouncer_collapses_bursts() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        assert!(!debouncer.fire(start));

        debouncer.record(start);
        debouncer.record(start + Duration::from_millis(300));

        // The deadline moved with the second change
        assert!(!debouncer.fire(start + Duration::from_millis(600)));
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(800)));

        assert!(debouncer.fire(start + Duration::from_millis(800)));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_relevant_changes() {
        assert!(is_relevant_change(&event(
            EventKind::Modify(ModifyKind::Any),
            "/c/match/base.yml"
        )));
        assert!(is_relevant_change(&event(
            EventKind::Create(CreateKind::File),
            "/c/config.yaml"
        )));
        assert!(!is_relevant_change(&event(
            EventKind::Create(CreateKind::File),
            "/c/match/.base.yml.swp"
        )));
        assert!(!is_relevant_change(&event(
            EventKind::Access(AccessKind::Any),
            "/c/match/base.yml"
        )));
    }
}
