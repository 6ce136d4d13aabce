// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song data model consumed by the scheduler.
//!
//! A `Song` is read-only to the scheduler: patterns, channels and events are
//! owned by the editing layer. The scheduler only mutates an event's `seq`
//! sub-record (and only the `playing` flag within it).

/// What an event does when its trigger range is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Short, self-terminating control-rate change (does not occupy the
    /// voice queue).
    ModuleParamChange,
    /// Starts a monophonic voice on the owning channel.
    NoteOn,
    /// Ends a voice explicitly.
    NoteOff,
}

/// Module-parameter payload for `Action::ModuleParamChange` events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleParam {
    pub module: u32,
    pub value: f64,
    pub glide: bool,
}

/// Scheduler-owned bookkeeping attached to every event.
///
/// All fields except `playing` are set once by the editing layer and read
/// only by the scheduler; `playing` is written exclusively by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSeq {
    /// Pattern index this event belongs to.
    pub start_measure: usize,
    /// Seconds from pattern start when the event enters its trigger range.
    pub start_measure_offset: f64,
    /// Seconds the event remains within its trigger range.
    pub length: f64,
    /// Seconds a module-param-change event's glide lasts.
    pub mp_length: f64,
    /// Transient: true while the event currently owns the sounding voice.
    pub playing: bool,
}

impl EventSeq {
    pub fn new(start_measure: usize, start_measure_offset: f64, length: f64) -> Self {
        Self {
            start_measure,
            start_measure_offset,
            length,
            mp_length: 0.0,
            playing: false,
        }
    }
}

/// One entry in a channel's step slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub action: Action,
    /// The synthesis slot this event targets.
    pub instrument: u32,
    pub mp: Option<ModuleParam>,
    pub seq: EventSeq,
    /// True while the user is still holding the key that created this
    /// event; such events are skipped by `collect`.
    pub recording: bool,
}

impl Event {
    pub fn new(action: Action, instrument: u32, seq: EventSeq) -> Self {
        Self {
            action,
            instrument,
            mp: None,
            seq,
            recording: false,
        }
    }

    pub fn note_on(instrument: u32, seq: EventSeq) -> Self {
        Self::new(Action::NoteOn, instrument, seq)
    }

    pub fn note_off(instrument: u32, seq: EventSeq) -> Self {
        Self::new(Action::NoteOff, instrument, seq)
    }

    pub fn module_param_change(instrument: u32, seq: EventSeq, mp: ModuleParam) -> Self {
        let mut event = Self::new(Action::ModuleParamChange, instrument, seq);
        event.mp = Some(mp);
        event
    }
}

/// A single monophonic voice lane, `steps` slots long. `None` is an empty
/// slot.
pub type Channel = Vec<Option<Event>>;

/// One musical bar, subdivided into `steps` slots per channel.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub steps: usize,
    pub channels: Vec<Channel>,
}

impl Pattern {
    /// Build a pattern with `instrument_amount` empty channels of the given
    /// step resolution.
    pub fn empty(steps: usize, instrument_amount: usize) -> Self {
        Self {
            steps,
            channels: (0..instrument_amount).map(|_| vec![None; steps]).collect(),
        }
    }

    /// Resize every channel of this pattern to `new_steps`, per the
    /// decimation/expansion sampling rule. Each channel is replaced as a
    /// whole value so a concurrent scheduler pass never observes a
    /// partially-resized pattern.
    pub fn set_steps(&mut self, new_steps: usize) {
        let old_steps = self.steps;
        if new_steps == old_steps {
            return;
        }
        for channel in &mut self.channels {
            *channel = resample_channel(channel, old_steps, new_steps);
        }
        self.steps = new_steps;
    }
}

/// Implements spec's `setPatternSteps` per-channel resampling rule in
/// isolation so it can be unit-tested against exact index mappings.
fn resample_channel(old: &Channel, old_steps: usize, new_steps: usize) -> Channel {
    let mut new: Channel = vec![None; new_steps];
    if new_steps == 0 || old_steps == 0 {
        return new;
    }
    if new_steps < old_steps {
        let k = old_steps / new_steps;
        for i in 0..new_steps {
            let src = i * k;
            if src < old.len() {
                new[i] = old[src].clone();
            }
        }
    } else {
        let k = new_steps / old_steps;
        for i in 0..old_steps {
            let dst = i * k;
            if dst < new.len() {
                new[dst] = old[i].clone();
            }
        }
    }
    new
}

/// Read-only to the scheduler: tempo and ordered patterns.
#[derive(Debug, Clone)]
pub struct Song {
    pub tempo: f64,
    pub patterns: Vec<Pattern>,
}

impl Song {
    pub fn new(tempo: f64, patterns: Vec<Pattern>) -> Self {
        Self { tempo, patterns }
    }

    pub fn pattern(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn pattern_mut(&mut self, index: usize) -> Option<&mut Pattern> {
        self.patterns.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(step: usize) -> Event {
        Event::note_on(0, EventSeq::new(0, step as f64 * 0.1, 0.1))
    }

    #[test]
    fn decimating_samples_every_kth_slot() {
        let mut old: Channel = vec![None; 16];
        old[0] = Some(event_at(0));
        old[2] = Some(event_at(2));
        let mut pattern = Pattern {
            steps: 16,
            channels: vec![old],
        };
        pattern.set_steps(8);
        assert_eq!(pattern.steps, 8);
        assert!(pattern.channels[0][0].is_some());
        assert!(pattern.channels[0][1].is_some());
        assert!(pattern.channels[0][2..].iter().all(Option::is_none));
    }

    #[test]
    fn expanding_spreads_content_with_gaps() {
        // Scenario E: 16 -> 32, A at 0, B at 2, becomes A at 0, B at 4.
        let mut old: Channel = vec![None; 16];
        old[0] = Some(event_at(0));
        old[2] = Some(event_at(2));
        let mut pattern = Pattern {
            steps: 16,
            channels: vec![old],
        };
        pattern.set_steps(32);
        assert_eq!(pattern.steps, 32);
        assert!(pattern.channels[0][0].is_some());
        assert!(pattern.channels[0][4].is_some());
        assert_eq!(pattern.channels[0].iter().filter(|s| s.is_some()).count(), 2);
    }

    #[test]
    fn unchanged_step_count_leaves_content_untouched() {
        let mut old: Channel = vec![None; 16];
        old[5] = Some(event_at(5));
        let mut pattern = Pattern {
            steps: 16,
            channels: vec![old.clone()],
        };
        pattern.set_steps(16);
        assert_eq!(pattern.channels[0], old);
    }

    #[test]
    fn every_channel_has_exactly_pattern_steps_slots() {
        let pattern = Pattern::empty(16, 4);
        assert_eq!(pattern.channels.len(), 4);
        assert!(pattern.channels.iter().all(|c| c.len() == 16));
    }
}
