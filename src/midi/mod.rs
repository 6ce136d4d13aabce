// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Demo MIDI output sink.
//!
//! Outside the scheduler subsystem proper: a thin `AudioSink` implementation
//! over `midir` so the crate has something runnable to drive from `main.rs`.
//! The scheduler core never depends on this module.

use midir::{MidiOutput as MidirOutput, MidiOutputConnection, MidiOutputPort};
use thiserror::Error;
use tracing::warn;

use crate::sequencer::{AudioSink, Event};

/// MIDI channel-voice message status bytes (upper nibble; lower nibble is
/// the channel, 0-15).
pub mod messages {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const PITCH_BEND: u8 = 0xE0;
}

/// Errors raised opening or writing to a MIDI output port.
#[derive(Debug, Error)]
pub enum MidiSinkError {
    #[error("failed to initialize MIDI output: {0}")]
    Init(#[source] midir::InitError),
    #[error("no MIDI output port at index {0}")]
    NoSuchPort(usize),
    #[error("failed to connect to MIDI output port: {0}")]
    Connect(#[source] midir::ConnectError<MidirOutput>),
    #[error("failed to send MIDI message: {0}")]
    Send(#[source] midir::SendError),
}

/// List the names of the available MIDI output ports.
pub fn list_output_ports() -> Result<Vec<String>, MidiSinkError> {
    let output = MidirOutput::new("stepseq-list").map_err(MidiSinkError::Init)?;
    Ok(output
        .ports()
        .iter()
        .map(|port| output.port_name(port).unwrap_or_else(|_| "unknown".to_string()))
        .collect())
}

fn note_number_for(instrument: u32) -> u8 {
    (instrument % 128) as u8
}

fn channel_for(instrument: u32) -> u8 {
    (instrument % 16) as u8
}

/// `AudioSink` backed by a real MIDI output port.
///
/// `instrument` doubles as both the outgoing MIDI channel and (mod 128) the
/// note number, since the scheduler carries no separate pitch field —
/// `instrument_for` is the identity mapping here; everything past channel
/// selection is an external collaborator concern.
pub struct MidiAudioSink {
    connection: MidiOutputConnection,
    velocity: u8,
    clock: std::time::Instant,
}

impl MidiAudioSink {
    /// Open the output port at `port_index`, as reported by
    /// [`list_output_ports`].
    pub fn open(port_index: usize, client_name: &str) -> Result<Self, MidiSinkError> {
        let output = MidirOutput::new(client_name).map_err(MidiSinkError::Init)?;
        let ports = output.ports();
        let port: &MidiOutputPort =
            ports.get(port_index).ok_or(MidiSinkError::NoSuchPort(port_index))?;
        let connection = output.connect(port, "stepseq-out").map_err(MidiSinkError::Connect)?;
        Ok(Self { connection, velocity: 100, clock: std::time::Instant::now() })
    }

    /// Fixed velocity used for every outgoing Note On (0-127).
    pub fn set_velocity(&mut self, velocity: u8) {
        self.velocity = velocity.min(127);
    }

    fn send(&mut self, message: &[u8]) {
        if let Err(e) = self.connection.send(message) {
            warn!(error = %e, "failed to send MIDI message");
        }
    }
}

impl AudioSink for MidiAudioSink {
    fn current_time(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    fn is_recording(&self) -> bool {
        false
    }

    fn note_on(&mut self, event: &Event, instrument: u32, _at_time: f64) {
        let channel = channel_for(instrument);
        let note = note_number_for(event.instrument);
        self.send(&[messages::NOTE_ON | channel, note, self.velocity]);
    }

    fn note_off(&mut self, event: &Event, _at_time: f64) {
        let channel = channel_for(event.instrument);
        let note = note_number_for(event.instrument);
        self.send(&[messages::NOTE_OFF | channel, note, 0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_number_wraps_into_midi_range() {
        assert_eq!(note_number_for(200), 200 % 128);
        assert_eq!(note_number_for(60), 60);
    }

    #[test]
    fn channel_wraps_into_midi_range() {
        assert_eq!(channel_for(20), 4);
        assert_eq!(channel_for(3), 3);
    }

    #[test]
    fn message_status_bytes_match_midi_spec() {
        assert_eq!(messages::NOTE_ON, 0x90);
        assert_eq!(messages::NOTE_OFF, 0x80);
    }
}
