#![forbid(unsafe_code)]

//! `lazyscroll-sim` binary entry point.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;

use lazyscroll_core::{ScrollerConfig, VirtualScroller, logging};
use lazyscroll_harness::cli::Opts;
use lazyscroll_harness::{Action, DriverConfig, FakeDataset, ScenarioDriver, TraceRecorder, sweep};

fn open_trace(path: &str) -> io::Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

fn run(opts: &Opts) -> io::Result<()> {
    let parsed = ScrollerConfig::from_env_with_diagnostics();
    for err in &parsed.errors {
        tracing::warn!(%err, "ignoring scroller setting");
    }
    let scroller = match VirtualScroller::new(parsed.config) {
        Ok(scroller) => scroller,
        Err(errors) => {
            for err in errors {
                eprintln!("Invalid scroller config: {err}");
            }
            process::exit(1);
        }
    };

    let dataset =
        FakeDataset::new(opts.data_size, opts.seed).with_malformed_every(opts.malformed_every);
    let config = DriverConfig {
        page_size: opts.page_size,
        latency: opts.latency,
        row_height: opts.row_height,
        viewport_height: opts.height,
    };
    let mut driver = ScenarioDriver::new(scroller, dataset, config);
    let mut recorder = match &opts.jsonl {
        Some(path) => Some(TraceRecorder::new(open_trace(path)?)),
        None => None,
    };
    if let Some(recorder) = recorder.as_mut() {
        recorder.start(opts.data_size, opts.start_index, opts.seed, &config)?;
    }

    let phase = driver.start(opts.start_index);
    tracing::info!(?phase, start_index = opts.start_index, "scroller started");

    let mut actions = sweep(opts.steps, opts.stride);
    actions.extend(std::iter::repeat_n(Action::Idle, opts.latency as usize));
    for action in actions {
        let record = driver.step(action);
        for event in &record.events {
            tracing::debug!(tick = record.tick, event = event.name(), "event");
        }
        if let Some(recorder) = recorder.as_mut() {
            recorder.record(&record)?;
        }
    }

    let stats = driver.stats();
    for diagnostic in driver.scroller_mut().take_diagnostics() {
        tracing::warn!(%diagnostic, "recovered");
    }
    if let Some(recorder) = recorder {
        recorder.finish(&stats)?;
    }

    let store = driver.scroller().store();
    eprintln!(
        "requests={} deduplicated={} pages={} rows={} loaded={}/{}",
        stats.requests,
        stats.deduplicated,
        stats.delivered,
        stats.rows_delivered,
        store.loaded_count(),
        store.data_size(),
    );
    Ok(())
}

fn main() {
    let opts = Opts::parse();
    if let Err(err) = logging::init(opts.log_format) {
        eprintln!("Failed to install logger: {err}");
    }
    if let Err(err) = run(&opts) {
        eprintln!("Simulation failed: {err}");
        process::exit(1);
    }
}
