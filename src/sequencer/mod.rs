// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core: the real-time playback scheduler.
//!
//! - `song`: the read-only-to-the-scheduler data model (Song/Pattern/
//!   Channel/Event) plus the pattern step-count resampling algorithm.
//! - `voice_queue`: per-channel monophonic FIFO of sounding voices.
//! - `transport`: the mutable musical-time cursor.
//! - `scheduler`: the lookahead `collect`/`step` loop and transport
//!   commands, tying the above together.

pub mod scheduler;
pub mod song;
pub mod transport;
pub mod voice_queue;

pub use scheduler::{AudioSink, Metronome, Scheduler, SchedulerConfig, METRONOME_SUBDIVISION};
pub use song::{Action, Channel, Event, EventSeq, ModuleParam, Pattern, Song};
pub use transport::{Position, TransportState};
pub use voice_queue::{QueuedVoice, VoiceQueue};
