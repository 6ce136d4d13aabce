// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clock driver: the scheduler's tick source.
//!
//! Runs on a dedicated thread so the scheduler's lookahead loop is never
//! bound to a rendering cadence. The driver holds no musical state; it only
//! posts `tick` notifications onto a channel the scheduler drains from its
//! own execution context. Tick coalescing is acceptable — a missed tick is
//! caught up by the lookahead on the next `collect` pass.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

/// A tick notification. Carries no payload — the scheduler reads its own
/// `currentTime` from the Audio Sink when it services the tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick;

enum DriverCommand {
    Stop,
}

/// Background-thread interval ticker.
///
/// `interval_ms` is derived by the caller from `scheduleAheadTime` as
/// `scheduleAheadTime * 1000 / 4`, so roughly four ticks fit inside one
/// schedule horizon and the horizon is refilled before it can drain.
pub struct ClockDriver {
    tick_rx: Receiver<Tick>,
    command_tx: Sender<DriverCommand>,
    handle: Option<JoinHandle<()>>,
}

impl ClockDriver {
    /// Start firing ticks at the given period immediately.
    pub fn start(interval_ms: u64) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let interval = Duration::from_millis(interval_ms);

        let handle = thread::spawn(move || run(interval, tick_tx, command_rx));

        info!(interval_ms, "clock driver started");
        Self { tick_rx, command_tx, handle: Some(handle) }
    }

    /// Stop firing ticks and join the background thread.
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(DriverCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        debug!("clock driver stopped");
    }

    /// Non-blocking: drain and return the number of ticks received since
    /// the last call. Coalesces multiple pending ticks into one count.
    pub fn drain_ticks(&self) -> usize {
        let mut count = 0;
        loop {
            match self.tick_rx.try_recv() {
                Ok(Tick) => count += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        count
    }

    /// Block until the next tick arrives, or the driver stops.
    pub fn wait_for_tick(&self) -> bool {
        self.tick_rx.recv().is_ok()
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(interval: Duration, tick_tx: Sender<Tick>, command_rx: Receiver<DriverCommand>) {
    loop {
        match command_rx.recv_timeout(interval) {
            Ok(DriverCommand::Stop) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if tick_tx.send(Tick).is_err() {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Interval derivation from `scheduleAheadTime`, per the schedule-ahead/tick
/// ratio (roughly four ticks per horizon).
pub fn interval_ms_for_schedule_ahead(schedule_ahead_time: f64) -> u64 {
    ((schedule_ahead_time * 1000.0) / 4.0).max(1.0) as u64
}
