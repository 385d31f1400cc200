mod config;
mod operations;

use anyhow::Context;
use clap::Parser;
use config::{Config, SourceKind};
use crossbeam::channel::{self, Receiver};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use vision_capture::{FrameSource, SyntheticSource};
use vision_worker::{
    LatestFrameSlot, PreviewController, Worker, WorkerEvent, WorkerExit, WorkerReport,
};

#[derive(Parser, Debug)]
#[command(name = "vision-preview")]
#[command(about = "Headless live preview of a camera through a switchable operation")]
struct Args {
    /// TOML config file; defaults apply when omitted
    config: Option<PathBuf>,

    /// Capture device index
    #[arg(short, long)]
    device: Option<u32>,

    /// Operation to apply once the preview starts
    #[arg(short, long)]
    operation: Option<String>,

    /// Stop after this many seconds
    #[arg(long)]
    run_secs: Option<u64>,

    /// List the available operations and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(device) = self.device {
            config.worker.device_index = device;
        }
        if let Some(operation) = &self.operation {
            config.preview.operation = Some(operation.clone());
        }
        if let Some(secs) = self.run_secs {
            config.preview.run_secs = Some(secs);
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("vision-preview: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let registry = Arc::new(operations::registry().context("building operation registry")?);
    if args.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let source = build_source(&config)?;
    info!(
        source = %source.describe(),
        device = config.worker.device_index,
        operations = registry.len(),
        "starting vision preview"
    );

    let slot = Arc::new(LatestFrameSlot::new());
    let worker = Worker::new(
        source,
        slot.clone(),
        registry,
        config.worker.to_worker_config(),
    );
    let events = worker.events();
    let mut controller = PreviewController::new(worker);

    if let Some(operation) = &config.preview.operation {
        controller
            .choose(operation)
            .with_context(|| format!("selecting operation '{operation}'"))?;
    }

    let (interrupt_tx, interrupt_rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })
    .context("installing Ctrl-C handler")?;

    controller.toggle().context("starting preview")?;

    let outcome = preview_loop(&mut controller, &slot, &events, &interrupt_rx, &config);
    let report = controller.shutdown();

    if let Some(report) = &report {
        log_report(report, &slot);
    }

    match (outcome, report.map(|r| r.exit)) {
        (LoopOutcome::Stalled, _) => Ok(ExitCode::from(2)),
        (_, Some(WorkerExit::Panicked)) => Ok(ExitCode::FAILURE),
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn build_source(config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    match config.source.kind {
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new(config.source.to_synthetic()))),
        SourceKind::V4l2 => v4l2_source(config),
    }
}

#[cfg(all(feature = "v4l2", target_os = "linux"))]
fn v4l2_source(config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(vision_capture::V4l2Source::new(
        vision_capture::V4l2Config {
            width: config.source.width,
            height: config.source.height,
            buffers: config.source.buffers,
        },
    )))
}

#[cfg(not(all(feature = "v4l2", target_os = "linux")))]
fn v4l2_source(_config: &Config) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!("source kind 'v4l2' needs a Linux build with the `v4l2` feature")
}

enum LoopOutcome {
    Interrupted,
    Elapsed,
    Stalled,
}

/// Consume display frames until interrupted, out of time or stalled
fn preview_loop(
    controller: &mut PreviewController,
    slot: &LatestFrameSlot,
    events: &Receiver<WorkerEvent>,
    interrupt: &Receiver<()>,
    config: &Config,
) -> LoopOutcome {
    let started = Instant::now();
    let run_for = config.preview.run_secs.map(Duration::from_secs);
    let toggle_every = config.preview.toggle_secs.map(Duration::from_secs);
    let report_every = Duration::from_secs(config.preview.report_secs.max(1));

    let mut last_sequence = 0;
    let mut shown = 0u64;
    let mut last_toggle = Instant::now();
    let mut last_report = Instant::now();

    loop {
        if interrupt.try_recv().is_ok() {
            info!("interrupted, stopping preview");
            return LoopOutcome::Interrupted;
        }
        if run_for.is_some_and(|limit| started.elapsed() >= limit) {
            return LoopOutcome::Elapsed;
        }

        if let Some(frame) = slot.wait_newer(last_sequence, Duration::from_millis(100)) {
            last_sequence = frame.sequence;
            shown += 1;
        }

        for event in events.try_iter() {
            match event {
                WorkerEvent::Started { capture } => info!(capture = capture.get(), "capture opened"),
                WorkerEvent::CaptureStalled {
                    consecutive_failures,
                } => {
                    warn!(consecutive_failures, "capture stalled");
                    if config.preview.exit_on_stall {
                        error!("exiting on capture stall");
                        return LoopOutcome::Stalled;
                    }
                }
                WorkerEvent::CaptureRecovered { after_failures } => {
                    info!(after_failures, "capture recovered")
                }
                WorkerEvent::Finished(_) => {}
            }
        }

        if let Some(every) = toggle_every {
            if last_toggle.elapsed() >= every {
                last_toggle = Instant::now();
                match controller.toggle() {
                    Ok(state) => info!(state = ?state, "preview toggled"),
                    Err(e) => warn!(error = %e, "toggle failed"),
                }
            }
        }

        if last_report.elapsed() >= report_every {
            last_report = Instant::now();
            let stats = controller.worker().stats();
            info!(
                shown,
                published = stats.frames_published,
                transient = stats.transient_failures,
                dropped = stats.dropped_frames,
                operation = controller.worker().active_operation().name(),
                "preview running"
            );
        }
    }
}

fn log_report(report: &WorkerReport, slot: &LatestFrameSlot) {
    let slot_stats = slot.stats();
    info!(
        exit = ?report.exit,
        frames_read = report.stats.frames_read,
        frames_published = report.stats.frames_published,
        transient_failures = report.stats.transient_failures,
        dropped_frames = report.stats.dropped_frames,
        stall_episodes = report.stats.stall_episodes,
        overwritten = slot_stats.overwritten,
        "preview finished"
    );
}
