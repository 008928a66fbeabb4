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

//! Device event multiplexer
//!
//! One worker thread per keyboard reads its blocking feed and forwards
//! events into a shared bounded queue. Each worker preserves its own
//! device's event order; the interleaving between devices is whatever
//! the scheduler produces.
//!
//! A feed that fails or ends is dropped quietly. The queue stays open
//! while any other sender (another feed, the reload coordinator) is
//! alive.

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use super::{DeviceSource, InputError};
use crate::core::KeyEvent;

/// Capacity of the shared event queue
pub const QUEUE_CAPACITY: usize = 64;

/// Creates the bounded queue shared by all producers.
pub fn queue<T>() -> (Sender<T>, Receiver<T>) {
    bounded(QUEUE_CAPACITY)
}

/// Running set of keyboard workers
pub struct Multiplexer {
    stop: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
    device_names: Vec<String>,
}

impl Multiplexer {
    /// Starts one worker per source.
    ///
    /// Events are converted with `T::from`, so the queue can carry a
    /// wider message type than bare key events.
    ///
    /// # Errors
    ///
    /// `InputError::NoKeyboards` if `sources` is empty, or
    /// `InputError::Spawn` if a worker thread cannot be created (workers
    /// already started are told to stop).
    pub fn spawn<T>(sources: Vec<Box<dyn DeviceSource>>, sender: Sender<T>) -> Result<Self, InputError>
    where
        T: From<KeyEvent> + Send + 'static,
    {
        if sources.is_empty() {
            return Err(InputError::NoKeyboards);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let live = Arc::new(AtomicUsize::new(0));
        let mut mux = Self {
            stop: Arc::clone(&stop),
            live: Arc::clone(&live),
            workers: Vec::with_capacity(sources.len()),
            device_names: sources.iter().map(|s| s.name().to_string()).collect(),
        };

        for (index, source) in sources.into_iter().enumerate() {
            let feed = Feed {
                source,
                sender: sender.clone(),
                stop: Arc::clone(&stop),
                live: Arc::clone(&live),
            };

            live.fetch_add(1, Ordering::SeqCst);
            let spawned = thread::Builder::new()
                .name(format!("texpand-input-{index}"))
                .spawn(move || feed.run());

            match spawned {
                Ok(handle) => mux.workers.push(handle),
                Err(e) => {
                    live.fetch_sub(1, Ordering::SeqCst);
                    mux.stop();
                    return Err(InputError::Spawn(e));
                }
            }
        }

        info!("Listening on {} keyboard(s)", mux.workers.len());
        Ok(mux)
    }

    /// Names of the devices being read, in spawn order
    pub fn device_names(&self) -> &[String] {
        &self.device_names
    }

    /// Number of feeds that have not ended yet
    pub fn live_feeds(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Asks every worker to finish after its current read.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Waits for all workers to exit.
    ///
    /// Blocks while any worker is still waiting on its device, so call
    /// [`stop`](Self::stop) first and keep the queue drained.
    pub fn join(self) {
        for worker in self.workers {
            let name = worker.thread().name().unwrap_or("input").to_string();
            if worker.join().is_err() {
                warn!("Input worker {} panicked", name);
            }
        }
    }
}

/// State moved into one worker thread
struct Feed<T> {
    source: Box<dyn DeviceSource>,
    sender: Sender<T>,
    stop: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
}

impl<T: From<KeyEvent>> Feed<T> {
    fn run(mut self) {
        loop {
            match self.source.next_event() {
                Ok(Some(event)) => {
                    if self.stop.load(Ordering::SeqCst) {
                        break;
                    }
                    if self.sender.send(T::from(event)).is_err() {
                        debug!("Queue closed, stopping feed {}", self.source.name());
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Feed {} ended", self.source.name());
                    break;
                }
                Err(e) => {
                    debug!("Feed {} failed: {}", self.source.name(), e);
                    break;
                }
            }
        }

        self.source.close();
        if self.live.fetch_sub(1, Ordering::SeqCst) == 1 && !self.stop.load(Ordering::SeqCst) {
            warn!("All keyboard feeds have ended; no further expansions will fire");
        }
    }
}
