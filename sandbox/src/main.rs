// Copyright 2025 eraflo
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

//! A headless end-to-end run of the platform services layer.
//!
//! Boots the dispatcher on the null backend, feeds a synthetic input batch
//! through the translation layer, runs a few watchdog-bracketed ticks with
//! telemetry, offloads a blocking save through the derived-job queue, and
//! flushes the telemetry reports.

use dsys_core::platform::{FileMode, WindowDesc};
use dsys_core::report::PERF_TIER_ENV;
use dsys_core::trace::hash_events;
use dsys_guard::{tag, DerivedJobQueue, GuardConfig, StallWatchdog, ThreadTagFlags};
use dsys_platform::{CaptureBatch, Platform, PlatformConfig, RawInput};
use dsys_telemetry::{FlushDesc, Lane, Metric, PerfTelemetry};
use std::path::Path;

const TICKS: u64 = 8;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let guard = GuardConfig {
        enabled: true,
        fatal: false,
        run_root: None,
    };
    let mut platform = Platform::init(PlatformConfig {
        backend: None,
        guard: guard.clone(),
    });
    log::info!("running sandbox on backend '{}'", platform.backend_name());

    let window = platform.window_create(&WindowDesc {
        title: "dsys sandbox".to_string(),
        width: 640,
        height: 360,
        ..WindowDesc::default()
    })?;

    // Synthetic input, translated and canonicalized like any backend pump.
    let mut batch = CaptureBatch::new();
    for raw in [
        RawInput::MouseMove { x: 10, y: 20 },
        RawInput::Key {
            scancode: 4,
            pressed: true,
        },
        RawInput::Key {
            scancode: 4,
            pressed: false,
        },
        RawInput::CloseRequest,
    ] {
        batch.push_raw(&raw);
    }
    batch.flush_into(&mut platform);

    let mut watchdog = StallWatchdog::new(guard);
    watchdog.set_threshold_us(50_000);
    let mut perf = PerfTelemetry::new();
    let jobs = DerivedJobQueue::new();

    tag::tag_current(ThreadTagFlags::NO_BLOCK, "main")
        .map_err(|error| anyhow::anyhow!("tagging failed: {error}"))?;

    let mut drained = Vec::new();
    for tick in 0..TICKS {
        let act_time = tick as f64 * 0.1;
        perf.tick_begin(act_time, tick);
        watchdog.frame_begin("sandbox_tick");

        let timer = perf.timer_begin(Lane::Local, Metric::TickTotalUs);
        while let Some(event) = platform.poll_event() {
            perf.add(Lane::Local, Metric::EventsPolled, 1);
            drained.push(event);
        }
        perf.set(
            Lane::Local,
            Metric::EventQueueDepth,
            platform.event_queue_depth() as u64,
        );

        // Blocking work is scheduled, never performed, on this thread.
        if tick == 0 {
            jobs.submit("write_session_marker", || {
                log::info!("derived job running off the no-block thread");
            });
        }

        perf.timer_end(timer);
        watchdog.frame_end();
        perf.tick_end();
    }

    tag::clear_current();

    // Drain deferred work now that blocking is acceptable again.
    while jobs.run_next() {}

    // The batch hash is what a determinism harness would compare across
    // backends.
    log::info!(
        "drained {} events, batch hash {:#018x}",
        drained.len(),
        hash_events(&drained)
    );

    // A blocking save is fine here: the thread is no longer tagged.
    let save = platform.file_open(Path::new("user/session.bin"), FileMode::Write, None)?;
    platform.file_write(save, b"session")?;
    platform.file_close(save)?;

    if watchdog.was_triggered() {
        log::warn!(
            "sandbox ticks stalled {} time(s), longest {}us",
            watchdog.stall_count(),
            watchdog.longest_us()
        );
    }

    let mut desc = FlushDesc::new("sandbox");
    desc.tier = std::env::var(PERF_TIER_ENV).ok();
    let output = perf.flush(&desc)?;
    if let Some(path) = output.budget_path {
        log::info!("budget report at {}", path.display());
    }

    platform.window_destroy(window)?;
    platform.shutdown();
    Ok(())
}
