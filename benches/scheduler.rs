// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.
//
//! Benchmarks for the scheduler's hot path: the lookahead `collect` loop
//! and the per-channel voice queue it drives.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stepseq::sequencer::song::{Event, EventSeq, Pattern};
use stepseq::{AudioSink, Metronome, QueuedVoice, Scheduler, SchedulerConfig, Song, VoiceQueue};

struct NullSink {
    time: f64,
}

impl AudioSink for NullSink {
    fn current_time(&self) -> f64 {
        self.time
    }
    fn is_recording(&self) -> bool {
        false
    }
    fn note_on(&mut self, event: &Event, instrument: u32, at_time: f64) {
        black_box((event.instrument, instrument, at_time));
    }
    fn note_off(&mut self, event: &Event, at_time: f64) {
        black_box((event.instrument, at_time));
    }
}

struct NullMetronome;

impl Metronome for NullMetronome {
    fn play(&mut self, _subdivision: u8, _current_step: usize, _step_precision: usize, _at_time: f64) {}
}

/// A pattern with a noteOn on every other step of every channel, at 120 BPM
/// / 16 steps, so `collect` has real drain/enqueue work to do each pass.
fn busy_pattern(channel_count: usize, steps: usize) -> Pattern {
    let mut pattern = Pattern::empty(steps, channel_count);
    let step_seconds = (60.0 / 120.0 * 4.0) / steps as f64;
    for channel in pattern.channels.iter_mut() {
        for step in (0..steps).step_by(2) {
            channel[step] =
                Some(Event::note_on(0, EventSeq::new(0, step as f64 * step_seconds, step_seconds)));
        }
    }
    pattern
}

fn bench_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_collect");

    for &channel_count in &[1usize, 8, 32] {
        group.bench_with_input(
            BenchmarkId::new("channels", channel_count),
            &channel_count,
            |b, &channel_count| {
                b.iter_batched(
                    || {
                        let pattern = busy_pattern(channel_count, 16);
                        let song = Song::new(120.0, vec![pattern]);
                        let config = SchedulerConfig {
                            instrument_amount: channel_count,
                            schedule_ahead_time: 0.2,
                            step_precision: 16,
                            beat_amount: 4.0,
                        };
                        let mut scheduler =
                            Scheduler::new(song, config, NullSink { time: 0.0 }, NullMetronome);
                        scheduler.start();
                        scheduler
                    },
                    |mut scheduler| {
                        scheduler.collect();
                        black_box(scheduler.position())
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_voice_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("voice_queue");

    fn queued(instrument: u32) -> QueuedVoice {
        let mut event = Event::note_on(instrument, EventSeq::new(0, 0.0, 0.1));
        event.instrument = instrument;
        QueuedVoice { pattern_index: 0, channel_index: 0, step_index: 0, event }
    }

    group.bench_function("append_then_drain", |b| {
        b.iter(|| {
            let mut queue = VoiceQueue::new();
            for i in 0..64u32 {
                queue.append(queued(i));
            }
            let mut count = 0;
            queue.drain_with(|_| count += 1);
            black_box(count)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_collect, bench_voice_queue);
criterion_main!(benches);
