// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scheduler core: the lookahead loop plus step advancement.
//!
//! The scheduler does not maintain its own index into the pattern; every
//! `collect` pass rescans the active pattern from scratch because its
//! contents and step count may mutate live from the editor, and the same
//! scan also clears stale `seq.playing` flags on range exit.

use tracing::{debug, info, trace};

use super::song::{Action, Event, Song};
use super::transport::{Position, TransportState};
use super::voice_queue::{QueuedVoice, VoiceQueue};

/// Fixed accent-pattern constant passed to `Metronome::play`.
pub const METRONOME_SUBDIVISION: u8 = 2;

/// External audio rendering backend. Consumed, never owned beyond the
/// scheduler's lifetime.
pub trait AudioSink {
    fn current_time(&self) -> f64;
    fn is_recording(&self) -> bool;
    fn note_on(&mut self, event: &Event, instrument: u32, at_time: f64);
    fn note_off(&mut self, event: &Event, at_time: f64);
}

/// External metronome collaborator.
pub trait Metronome {
    fn play(&mut self, subdivision: u8, current_step: usize, step_precision: usize, at_time: f64);
}

/// Construction-time tunables (mirrors `SchedulerSettings`' engine fields).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub instrument_amount: usize,
    pub schedule_ahead_time: f64,
    pub step_precision: usize,
    pub beat_amount: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            instrument_amount: 8,
            schedule_ahead_time: 0.2,
            step_precision: 64,
            beat_amount: 4.0,
        }
    }
}

/// Owns the song, the transport cursor, and one voice queue per instrument
/// slot. The only execution context permitted to mutate any of these.
pub struct Scheduler<A: AudioSink, M: Metronome> {
    song: Song,
    transport: TransportState,
    voice_queues: Vec<VoiceQueue>,
    audio_sink: A,
    metronome: M,
}

impl<A: AudioSink, M: Metronome> Scheduler<A, M> {
    pub fn new(song: Song, config: SchedulerConfig, audio_sink: A, metronome: M) -> Self {
        let mut transport = TransportState::new(
            config.step_precision,
            config.beat_amount,
            config.schedule_ahead_time,
        );
        if let Some(pattern) = song.patterns.first() {
            transport.step_precision = pattern.steps;
        }
        Self {
            song,
            transport,
            voice_queues: (0..config.instrument_amount).map(|_| VoiceQueue::new()).collect(),
            audio_sink,
            metronome,
        }
    }

    // ---- Outbound observations --------------------------------------

    pub fn is_playing(&self) -> bool {
        self.transport.playing
    }

    pub fn is_looping(&self) -> bool {
        self.transport.looping
    }

    pub fn is_recording(&self) -> bool {
        self.transport.recording
    }

    pub fn is_metronome_enabled(&self) -> bool {
        self.transport.metronome_enabled
    }

    pub fn amount_of_steps(&self) -> usize {
        self.song
            .pattern(self.transport.active_pattern)
            .map(|p| p.steps)
            .unwrap_or(0)
    }

    pub fn position(&self) -> Position {
        self.transport.position()
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn song_mut(&mut self) -> &mut Song {
        &mut self.song
    }

    /// Current length of every channel's voice queue, in channel order.
    /// Exposed for tests and diagnostics; not part of the spec's external
    /// interface.
    pub fn voice_queue_lengths(&self) -> Vec<usize> {
        self.voice_queues.iter().map(VoiceQueue::len).collect()
    }

    // ---- Transport commands -------------------------------------------

    /// `start`: begin playback. When recording with count-in requested,
    /// arms the count-in and forces the metronome on.
    pub fn start(&mut self) {
        self.transport.current_step = 0;
        if self.transport.recording && self.transport.count_in_enabled {
            self.transport.count_in_complete = false;
            self.transport.metronome_enabled_before_count_in = self.transport.metronome_enabled;
            self.transport.metronome_enabled = true;
        }
        let now = self.audio_sink.current_time();
        self.transport.next_note_time = now;
        self.transport.measure_start_time = now;
        self.transport.first_measure_start_time = now;
        self.transport.playing = true;
        info!(pattern = self.transport.active_pattern, "scheduler started");
    }

    /// `stop`: halt playback and flush every voice queue without emitting
    /// `noteOff` — the audio sink is expected to silence itself.
    pub fn stop(&mut self) {
        self.transport.playing = false;
        for queue in &mut self.voice_queues {
            queue.flush();
        }
        info!("scheduler stopped");
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.transport.set_looping(looping);
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.transport.set_recording(recording);
    }

    pub fn set_metronome_enabled(&mut self, enabled: bool) {
        self.transport.set_metronome_enabled(enabled);
    }

    pub fn set_count_in_enabled(&mut self, enabled: bool) {
        self.transport.count_in_enabled = enabled;
    }

    pub fn goto_previous_pattern(&mut self) {
        let pattern = self.transport.active_pattern.saturating_sub(1);
        if pattern == self.transport.active_pattern {
            return;
        }
        self.set_active_pattern(pattern);
    }

    pub fn goto_next_pattern(&mut self) {
        let max_pattern = self.song.patterns.len().saturating_sub(1);
        let pattern = (self.transport.active_pattern + 1).min(max_pattern);
        if pattern == self.transport.active_pattern {
            return;
        }
        self.set_active_pattern(pattern);
    }

    pub fn set_active_pattern(&mut self, pattern: usize) {
        let current_time = self.transport.next_note_time;
        self.set_position(pattern, Some(current_time));
    }

    pub fn set_current_step(&mut self, step: usize) {
        self.transport.current_step = step.min(self.transport.step_precision.saturating_sub(1));
    }

    /// Resize a pattern's channels to a new step count, replacing each
    /// channel as a whole value per §4.4's sampling rule.
    pub fn set_pattern_steps(&mut self, pattern_index: usize, steps: usize) {
        if let Some(pattern) = self.song.pattern_mut(pattern_index) {
            pattern.set_steps(steps);
            debug!(pattern_index, steps, "pattern step count changed");
            if pattern_index == self.transport.active_pattern {
                self.transport.step_precision = steps;
            }
        }
    }

    /// `setPosition(pattern, currentTime?)`.
    pub fn set_position(&mut self, pattern: usize, current_time: Option<f64>) {
        let max_pattern = self.song.patterns.len().saturating_sub(1);
        let pattern = pattern.min(max_pattern);

        if pattern != self.transport.active_pattern {
            self.transport.current_step = 0;
        }

        let current_time = current_time.unwrap_or_else(|| self.audio_sink.current_time());
        let tempo = self.song.tempo;
        let beat_amount = self.transport.beat_amount;

        self.transport.active_pattern = pattern;
        self.transport.next_note_time = current_time;
        self.transport.measure_start_time = current_time;
        self.transport.first_measure_start_time =
            current_time - pattern as f64 * ((60.0 / tempo) * beat_amount);

        if let Some(p) = self.song.pattern(pattern) {
            self.transport.step_precision = p.steps;
        }

        if pattern == 0 {
            let Scheduler {
                song,
                voice_queues,
                audio_sink,
                ..
            } = self;
            for queue in voice_queues.iter_mut() {
                queue.drain_with(|voice| {
                    audio_sink.note_off(&voice.event, current_time);
                    clear_playing(song, &voice);
                });
            }
        }
    }

    // ---- Scheduler core -------------------------------------------------

    /// Invoked on each Clock tick while playing. Fills the lookahead
    /// horizon, emitting commands to the Audio Sink and Metronome.
    pub fn collect(&mut self) {
        if !self.transport.playing {
            return;
        }

        let now = self.audio_sink.current_time();
        let horizon = now + self.transport.schedule_ahead_time;

        while self.transport.next_note_time < horizon {
            let sequence_events = !(self.transport.recording
                && self.transport.count_in_enabled
                && !self.transport.count_in_complete);

            if sequence_events {
                self.scan_active_pattern();
            }

            if self.transport.metronome_enabled {
                let at_time = self.transport.next_note_time;
                let current_step = self.transport.current_step;
                let step_precision = self.transport.step_precision;
                self.metronome
                    .play(METRONOME_SUBDIVISION, current_step, step_precision, at_time);
            }

            self.step();

            if !self.transport.playing {
                break;
            }
        }
    }

    /// Rescan every channel of the active pattern: enqueue events newly
    /// entering range, clear `seq.playing` on events exiting range.
    fn scan_active_pattern(&mut self) {
        let active_pattern = self.transport.active_pattern;
        let compare_time = self.transport.next_note_time - self.transport.measure_start_time;
        let next_note_time = self.transport.next_note_time;
        let tempo = self.song.tempo;
        let beat_amount = self.transport.beat_amount;

        let Scheduler {
            song,
            voice_queues,
            audio_sink,
            ..
        } = self;

        let Some(pattern) = song.patterns.get_mut(active_pattern) else {
            return;
        };
        let pattern_steps = pattern.steps;
        let pattern_duration = (60.0 / tempo) * beat_amount;
        let mp_length = if pattern_steps > 0 {
            pattern_duration / pattern_steps as f64
        } else {
            0.0
        };

        for (channel_index, channel) in pattern.channels.iter_mut().enumerate() {
            for (step_index, slot) in channel.iter_mut().enumerate() {
                let Some(event) = slot.as_mut() else {
                    continue;
                };
                if event.recording || event.seq.start_measure != active_pattern {
                    continue;
                }

                let in_range = compare_time >= event.seq.start_measure_offset
                    && compare_time < event.seq.start_measure_offset + event.seq.length;

                if in_range {
                    if !event.seq.playing {
                        enqueue_event(
                            event,
                            active_pattern,
                            channel_index,
                            step_index,
                            next_note_time,
                            mp_length,
                            voice_queues,
                            audio_sink,
                        );
                    }
                } else {
                    event.seq.playing = false;
                }
            }
        }
    }

    /// Advance `nextNoteTime` and `currentStep`; at pattern end, advance
    /// (or wrap) the active pattern and commit the new position.
    fn step(&mut self) {
        let tempo = self.song.tempo;
        let subdivision = self.transport.subdivision(tempo);
        self.transport.next_note_time += subdivision;
        self.transport.current_step += 1;

        if self.transport.current_step != self.transport.step_precision {
            return;
        }

        self.transport.current_step = 0;
        let next_pattern = self.transport.active_pattern + 1;
        let max_pattern = self.song.patterns.len().saturating_sub(1);

        if next_pattern > max_pattern {
            self.transport.active_pattern = 0;
            if self.audio_sink.is_recording() && !self.transport.looping {
                self.stop();
                return;
            }
        } else if !self.transport.looping {
            self.transport.active_pattern = next_pattern;
        }

        let pattern = self.transport.active_pattern;
        let next_note_time = self.transport.next_note_time;
        self.set_position(pattern, Some(next_note_time));

        if self.transport.recording
            && self.transport.count_in_enabled
            && !self.transport.count_in_complete
        {
            self.transport.count_in_complete = true;
            self.transport.metronome_enabled = self.transport.metronome_enabled_before_count_in;
            self.transport.first_measure_start_time = self.audio_sink.current_time();
            self.transport.active_pattern = 0;
            trace!("count-in complete, recording begins at pattern 0");
        }
    }
}

/// Clear `seq.playing` on the slot a drained voice came from, if it is
/// still present (pattern step counts may have changed underneath it).
fn clear_playing(song: &mut Song, voice: &QueuedVoice) {
    if let Some(pattern) = song.patterns.get_mut(voice.pattern_index) {
        if let Some(channel) = pattern.channels.get_mut(voice.channel_index) {
            if let Some(Some(event)) = channel.get_mut(voice.step_index) {
                event.seq.playing = false;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn enqueue_event<A: AudioSink>(
    event: &mut Event,
    pattern_index: usize,
    channel_index: usize,
    step_index: usize,
    at_time: f64,
    mp_length: f64,
    voice_queues: &mut [VoiceQueue],
    audio_sink: &mut A,
) {
    event.seq.playing = true;
    event.seq.mp_length = mp_length;

    let instrument = event.instrument;
    audio_sink.note_on(event, instrument, at_time);

    let is_note_on = event.action == Action::NoteOn;
    if event.action != Action::ModuleParamChange {
        voice_queues[channel_index].drain_with(|voice| {
            audio_sink.note_off(&voice.event, at_time);
        });
    }

    if is_note_on {
        voice_queues[channel_index].append(QueuedVoice {
            pattern_index,
            channel_index,
            step_index,
            event: event.clone(),
        });
    } else {
        audio_sink.note_off(event, at_time + mp_length);
    }
}
