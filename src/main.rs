// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::info;

use stepseq::config::SchedulerSettings;
use stepseq::midi::{list_output_ports, MidiAudioSink};
use stepseq::sequencer::{Action, Channel, Event, EventSeq, Pattern, Song};
use stepseq::{AudioSink, ClockDriver, Metronome, Scheduler};

/// Console-only `AudioSink`: logs every note rather than producing sound.
/// Used when no `--port` is given, so the demo runs without any MIDI gear.
struct LoggingAudioSink {
    clock: Instant,
}

impl LoggingAudioSink {
    fn new() -> Self {
        Self { clock: Instant::now() }
    }
}

impl AudioSink for LoggingAudioSink {
    fn current_time(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    fn is_recording(&self) -> bool {
        false
    }

    fn note_on(&mut self, event: &Event, instrument: u32, at_time: f64) {
        info!(instrument, action = ?event.action, at_time, "note on");
    }

    fn note_off(&mut self, event: &Event, at_time: f64) {
        info!(instrument = event.instrument, at_time, "note off");
    }
}

/// `Metronome` that just logs the click.
struct LoggingMetronome;

impl Metronome for LoggingMetronome {
    fn play(&mut self, subdivision: u8, current_step: usize, step_precision: usize, at_time: f64) {
        if current_step % (step_precision / subdivision as usize).max(1) == 0 {
            info!(current_step, at_time, "click");
        }
    }
}

fn print_usage() {
    println!("stepseq - real-time step-sequencer scheduler demo");
    println!();
    println!("Usage: stepseq [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-midi         List available MIDI output ports");
    println!("  --play [PORT]       Run the demo pattern (console log, or MIDI port N)");
    println!("  --config <PATH>     Load scheduler settings from a TOML file");
    println!("  --seconds <N>       How long to run the demo for (default 8)");
    println!("  --help              Show this help message");
}

fn demo_song(instrument_amount: usize, steps: usize) -> Song {
    let mut channel: Channel = vec![None; steps];
    channel[0] = Some(Event::note_on(0, EventSeq::new(0, 0.0, 0.1)));
    channel[4] = Some(Event::note_on(1, EventSeq::new(0, 0.5, 0.1)));
    channel[8] = Some(Event::new(
        Action::ModuleParamChange,
        2,
        EventSeq::new(0, 1.0, 0.05),
    ));

    let mut pattern = Pattern::empty(steps, instrument_amount);
    pattern.channels[0] = channel;

    Song::new(120.0, vec![pattern])
}

fn run_demo(port: Option<usize>, settings: SchedulerSettings, run_for: Duration) -> Result<()> {
    let song = demo_song(settings.instrument_amount, settings.default_step_precision);
    let config = settings.into();
    let interval_ms = stepseq::interval_ms_for_schedule_ahead(settings.schedule_ahead_time);

    match port {
        Some(port_index) => {
            let sink = MidiAudioSink::open(port_index, "stepseq")?;
            run_with_sink(song, config, sink, interval_ms, run_for)
        }
        None => run_with_sink(song, config, LoggingAudioSink::new(), interval_ms, run_for),
    }
}

fn run_with_sink<A: AudioSink>(
    song: Song,
    config: stepseq::SchedulerConfig,
    sink: A,
    interval_ms: u64,
    run_for: Duration,
) -> Result<()> {
    let mut scheduler = Scheduler::new(song, config, sink, LoggingMetronome);
    scheduler.start();

    let driver = ClockDriver::start(interval_ms);
    let start = Instant::now();
    while start.elapsed() < run_for {
        if !driver.wait_for_tick() {
            break;
        }
        scheduler.collect();
    }

    scheduler.stop();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let mut config_path: Option<String> = None;
    let mut run_seconds: f64 = 8.0;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = args.get(i).cloned();
            }
            "--seconds" => {
                i += 1;
                run_seconds = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| anyhow!("--seconds requires a number"))?;
            }
            _ => {}
        }
        i += 1;
    }

    let settings = match &config_path {
        Some(path) => SchedulerSettings::load(path)?,
        None => SchedulerSettings::default(),
    };

    match args[1].as_str() {
        "--list-midi" => {
            for (index, name) in list_output_ports()?.iter().enumerate() {
                println!("{}: {}", index, name);
            }
        }
        "--play" => {
            let port = args.get(2).and_then(|s| s.parse().ok());
            run_demo(port, settings, Duration::from_secs_f64(run_seconds))?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
