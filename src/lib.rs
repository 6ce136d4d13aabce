// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time playback scheduler for a multi-timbral step-sequencer.
//!
//! The `sequencer` module is the scheduler subsystem proper (song data,
//! voice queue, transport, and the lookahead scheduler core). `timing` and
//! `config` are the ambient services a host process wires around it; `midi`
//! is a demo `AudioSink` used by `main.rs` to make the crate runnable.

pub mod config;
pub mod midi;
pub mod sequencer;
pub mod timing;

pub use sequencer::{
    Action, AudioSink, Channel, Event, EventSeq, Metronome, ModuleParam, Pattern, Position,
    QueuedVoice, Scheduler, SchedulerConfig, Song, TransportState, VoiceQueue,
    METRONOME_SUBDIVISION,
};
pub use timing::{interval_ms_for_schedule_ahead, ClockDriver, Tick};
