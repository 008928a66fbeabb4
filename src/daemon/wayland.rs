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

//! Wayland session discovery
//!
//! `wl-copy` and `wl-paste` need `WAYLAND_DISPLAY`. A daemon started from
//! a systemd user unit or a TTY often lacks it, so the compositor socket
//! is looked up in the runtime directory instead.

use log::{debug, info, warn};
use std::{
    env, fs,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};

/// Sets `WAYLAND_DISPLAY` from the runtime directory if it is missing.
pub fn ensure_wayland_display() {
    if env::var_os("WAYLAND_DISPLAY").is_some_and(|v| !v.is_empty()) {
        return;
    }

    let xdg_runtime = env::var_os("XDG_RUNTIME_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let have_xdg = xdg_runtime.is_some();

    let Some(runtime_dir) = xdg_runtime.or_else(fallback_runtime_dir) else {
        warn!("WAYLAND_DISPLAY is not set and no runtime directory was found; clipboard access will fail");
        return;
    };

    match find_wayland_socket(&runtime_dir) {
        Some(name) => {
            // Without XDG_RUNTIME_DIR, clients only find the socket by absolute path
            let display = if have_xdg {
                name
            } else {
                runtime_dir.join(name).to_string_lossy().into_owned()
            };
            info!("WAYLAND_DISPLAY not set, using {}", display);
            env::set_var("WAYLAND_DISPLAY", display);
        }
        None => warn!(
            "WAYLAND_DISPLAY is not set and no Wayland socket was found in {}; clipboard access will fail",
            runtime_dir.display()
        ),
    }
}

/// `/run/user/<uid>`, with the uid taken from `/proc/self`
fn fallback_runtime_dir() -> Option<PathBuf> {
    let uid = fs::metadata("/proc/self").ok()?.uid();
    let dir = PathBuf::from(format!("/run/user/{uid}"));
    debug!("XDG_RUNTIME_DIR not set, trying {}", dir.display());
    dir.is_dir().then_some(dir)
}

/// Lowest-numbered `wayland-*` socket name in `dir` (lock files excluded)
pub fn find_wayland_socket(dir: &Path) -> Option<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("wayland-") && !name.ends_with(".lock"))
        .collect();
    names.sort();
    names.into_iter().next()
}
