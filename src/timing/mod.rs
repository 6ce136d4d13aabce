// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module: the scheduler's independent tick source.

pub mod clock;

pub use clock::{interval_ms_for_schedule_ahead, ClockDriver, Tick};
