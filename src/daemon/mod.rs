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

//! The expansion daemon
//!
//! Everything that touches typing state runs on one thread, inside
//! [`Daemon::run`]. Keyboard workers and the reload coordinator only send
//! [`Message`]s into a single bounded queue:
//!
//! ```text
//! keyboard 0 ─┐
//! keyboard 1 ─┼─► queue ─► Daemon::run ─► MatchingEngine ─► ActionEmitter
//! reloader  ──┘               ▲
//! SIGINT/SIGTERM ─► shutdown ─┘
//! ```
//!
//! Because reloads travel through the same queue as key events, a new
//! rule set applies to exactly the events queued after it. An expansion
//! is emitted before the next message is taken, so two corrections never
//! interleave.

pub mod reload;
pub mod signals;
pub mod wayland;

pub use reload::{Debouncer, ReloadCoordinator, SETTLE_PERIOD};

use crossbeam_channel::{never, select, Receiver, TryRecvError};
use log::{debug, error, info, warn};
use std::{io, path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;

use crate::config::{load_rule_set, log_validation, ConfigError};
use crate::core::{Expansion, KeyEvent, MatchingEngine, RuleSet};
use crate::input::{self, find_keyboards, DeviceSource, InputError, Multiplexer};
use crate::output::{
    ActionEmitter, Clipboard, Delays, KeyboardSink, OutputError, UinputKeyboard, WaylandClipboard,
};

#[cfg(test)]
mod tests;

/// Work item for the daemon loop
#[derive(Debug)]
pub enum Message {
    /// A key event from one of the keyboards
    Key(KeyEvent),
    /// A freshly loaded rule set replacing the active one
    Reload(Arc<RuleSet>),
}

impl From<KeyEvent> for Message {
    fn from(event: KeyEvent) -> Self {
        Message::Key(event)
    }
}

/// Errors that prevent the daemon from starting
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Output(#[from] OutputError),

    /// The configuration watcher could not be created
    #[error("Failed to watch configuration: {0}")]
    Watch(#[from] notify::Error),

    /// SIGINT/SIGTERM handlers could not be installed
    #[error("Failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("Failed to start {name} thread: {source}")]
    Thread {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Counters reported when the loop ends
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DaemonStats {
    pub events: u64,
    pub expansions: u64,
    pub failed_expansions: u64,
    pub reloads: u64,
}

/// Why [`Daemon::run`] returned
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// A termination signal arrived
    Shutdown,
    /// Every producer hung up
    QueueClosed,
}

enum Step {
    Process(Message),
    Stop(StopReason),
    ShutdownLost,
}

/// Single consumer of the event queue
pub struct Daemon<K, C> {
    engine: MatchingEngine,
    emitter: ActionEmitter<K, C>,
    messages: Receiver<Message>,
    shutdown: Receiver<()>,
    stats: DaemonStats,
}

impl<K: KeyboardSink, C: Clipboard> Daemon<K, C> {
    pub fn new(
        rules: Arc<RuleSet>,
        emitter: ActionEmitter<K, C>,
        messages: Receiver<Message>,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            engine: MatchingEngine::new(rules),
            emitter,
            messages,
            shutdown,
            stats: DaemonStats::default(),
        }
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    pub fn emitter(&self) -> &ActionEmitter<K, C> {
        &self.emitter
    }

    pub fn stats(&self) -> DaemonStats {
        self.stats
    }

    /// Processes messages until shutdown or until the queue closes.
    ///
    /// A pending shutdown always wins over queued messages.
    pub fn run(&mut self) -> StopReason {
        loop {
            match self.shutdown.try_recv() {
                Ok(()) => return StopReason::Shutdown,
                Err(TryRecvError::Disconnected) => self.shutdown = never(),
                Err(TryRecvError::Empty) => {}
            }

            let step = select! {
                recv(self.shutdown) -> signal => match signal {
                    Ok(()) => Step::Stop(StopReason::Shutdown),
                    Err(_) => Step::ShutdownLost,
                },
                recv(self.messages) -> message => match message {
                    Ok(message) => Step::Process(message),
                    Err(_) => Step::Stop(StopReason::QueueClosed),
                },
            };

            match step {
                Step::Process(message) => self.process(message),
                Step::Stop(reason) => return reason,
                Step::ShutdownLost => self.shutdown = never(),
            }
        }
    }

    fn process(&mut self, message: Message) {
        match message {
            Message::Key(event) => {
                self.stats.events += 1;
                if let Some(expansion) = self.engine.handle_event(&event) {
                    self.deliver(&expansion);
                }
            }
            Message::Reload(rules) => {
                info!("Applying new rule set ({} rules)", rules.len());
                self.engine.replace_rules(rules);
                self.stats.reloads += 1;
            }
        }
    }

    fn deliver(&mut self, expansion: &Expansion) {
        match self.emitter.emit(expansion) {
            Ok(plan) => {
                self.stats.expansions += 1;
                debug!("Expanded '{}' ({} chars pasted)", expansion.trigger, plan.text.chars().count());
            }
            Err(e) => {
                self.stats.failed_expansions += 1;
                error!("Expansion of '{}' failed: {}", expansion.trigger, e);
            }
        }
    }
}

/// Settings for a daemon run
#[derive(Clone, Debug)]
pub struct DaemonOptions {
    pub config_dir: PathBuf,
    /// Quiet period before a config change is reloaded
    pub settle: Duration,
    pub delays: Delays,
}

impl DaemonOptions {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            settle: SETTLE_PERIOD,
            delays: Delays::default(),
        }
    }
}

/// Starts every component and runs the event loop until shutdown.
///
/// # Errors
///
/// Only startup failures are returned: unreadable configuration, no
/// keyboards, no uinput access, or a watcher/signal setup failure.
/// Everything after startup is logged and contained.
pub fn run(options: DaemonOptions) -> Result<DaemonStats, DaemonError> {
    wayland::ensure_wayland_display();

    let rules = Arc::new(load_rule_set(&options.config_dir)?);
    log_validation(&rules);
    let shutdown = signals::spawn_listener()?;

    // Keyboards are enumerated before the virtual device exists
    let sources: Vec<Box<dyn DeviceSource>> = find_keyboards()
        .into_iter()
        .map(|keyboard| Box::new(keyboard) as Box<dyn DeviceSource>)
        .collect();

    let (sender, receiver) = input::queue::<Message>();
    let multiplexer = Multiplexer::spawn(sources, sender.clone())?;

    let keyboard = match UinputKeyboard::create() {
        Ok(keyboard) => keyboard,
        Err(e) => {
            multiplexer.stop();
            return Err(e.into());
        }
    };
    let emitter = ActionEmitter::new(keyboard, WaylandClipboard::new(), options.delays);

    let reloader = ReloadCoordinator::spawn(options.config_dir.clone(), options.settle, sender)?;

    info!(
        "texpand running: {} rules, trigger mode {}, keyboards: {}",
        rules.len(),
        rules.trigger_mode(),
        multiplexer.device_names().join(", ")
    );

    let mut daemon = Daemon::new(rules, emitter, receiver, shutdown);
    let reason = daemon.run();
    let stats = daemon.stats();
    debug!("Event loop ended: {:?}", reason);

    multiplexer.stop();
    // The queue receiver goes first so a reload blocked on a full queue
    // sees the disconnect and lets the worker exit
    drop(daemon);
    reloader.shutdown();
    // Workers blocked on a device read exit when the process does
    if multiplexer.live_feeds() > 0 {
        debug!("{} keyboard feed(s) still blocked on read", multiplexer.live_feeds());
    }

    if reason == StopReason::QueueClosed {
        warn!("Event queue closed unexpectedly");
    }
    info!(
        "Stopped after {} expansion(s), {} reload(s)",
        stats.expansions, stats.reloads
    );
    Ok(stats)
}
