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

//! Termination signals
//!
//! SIGINT and SIGTERM are turned into a message on a shutdown channel
//! so the event loop can finish its current emission before exiting. A
//! second signal exits immediately.

use crossbeam_channel::{bounded, Receiver};
use log::{info, warn};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{process, thread};

use super::DaemonError;

/// Exit status used when a second signal forces exit
const FORCED_EXIT_CODE: i32 = 130;

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        _ => "signal",
    }
}

/// Installs the handlers and returns the shutdown channel.
pub fn spawn_listener() -> Result<Receiver<()>, DaemonError> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(DaemonError::Signals)?;
    let (tx, rx) = bounded(1);

    thread::Builder::new()
        .name("texpand-signals".to_string())
        .spawn(move || {
            let mut received = 0;
            for signal in signals.forever() {
                received += 1;
                if received == 1 {
                    info!("Received {}, shutting down", signal_name(signal));
                    let _ = tx.try_send(());
                } else {
                    warn!("Received {} again, exiting immediately", signal_name(signal));
                    process::exit(FORCED_EXIT_CODE);
                }
            }
        })
        .map_err(|source| DaemonError::Thread {
            name: "signal",
            source,
        })?;

    Ok(rx)
}
