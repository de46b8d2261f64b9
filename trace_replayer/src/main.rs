use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use arena_sight::{CameraConverter, DetectionPipeline, PipelineConfig, SystemClock};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::broadcast::error::RecvError;

mod bus;
mod logging;
mod trace;

use bus::{ReportBus, ReportReceiver};

/// Replays a captured draw-call trace and prints one JSON report per frame
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trace file, one JSON draw event per line
    trace: PathBuf,

    /// JSON pipeline config; omitted fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the reports (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rendering surface size as WIDTHxHEIGHT, used to centre the camera
    #[arg(long, default_value = "1920x1080")]
    surface: String,

    /// Reports buffered between the pipeline and its consumers
    #[arg(long, default_value_t = 256)]
    bus_capacity: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    // --- 1. Pipeline Initialization ---
    let config = match &args.config {
        Some(path) => trace::load_config(path).await?,
        None => PipelineConfig::default(),
    };
    let mut converter = CameraConverter::identity();
    converter.set_surface_center(trace::parse_surface(&args.surface)?);
    let mut pipeline = DetectionPipeline::builder()
        .config(config)
        .converter(converter)
        .clock(SystemClock::new())
        .build()?;

    // --- 2. Consumers ---
    let bus = ReportBus::new(args.bus_capacity);
    let writer = tokio::spawn(write_reports(bus.subscribe(), open_output(args.output.as_deref()).await?));
    let summary = tokio::spawn(summarize(bus.subscribe()));

    // --- 3. Main Replay Loop ---
    let file = tokio::fs::File::open(&args.trace)
        .await
        .with_context(|| format!("opening trace {}", args.trace.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_number = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let Some(event) = trace::parse_line(&line, line_number) else {
            continue;
        };
        if let Some(report) = pipeline.handle(&event) {
            bus.publish(report).await;
        }
    }
    if let Some(report) = pipeline.close_open_frame() {
        log::warn!("trace ended mid-frame; closed frame {}", report.frame_index);
        bus.publish(report).await;
    }

    // --- 4. Shutdown ---
    drop(bus);
    let written = writer.await??;
    summary.await?;
    log::info!("replayed {line_number} lines into {written} frame reports");
    Ok(())
}

async fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn AsyncWrite + Unpin + Send>> {
    Ok(match path {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating output {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    })
}

/// Writes each report as one JSON line. Returns how many were written.
async fn write_reports(
    mut rx: ReportReceiver,
    sink: Box<dyn AsyncWrite + Unpin + Send>,
) -> anyhow::Result<u64> {
    let mut out = BufWriter::new(sink);
    let mut written = 0;
    loop {
        match rx.recv().await {
            Ok(report) => {
                let mut line = serde_json::to_vec(report.as_ref())?;
                line.push(b'\n');
                out.write_all(&line).await?;
                written += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("writer fell behind; {skipped} reports lost");
            }
            Err(RecvError::Closed) => break,
        }
    }
    out.flush().await?;
    Ok(written)
}

/// Logs how often each kind was seen and how many frames located the player.
async fn summarize(mut rx: ReportReceiver) {
    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    let mut frames = 0usize;
    let mut frames_with_player = 0usize;
    loop {
        match rx.recv().await {
            Ok(report) => {
                frames += 1;
                if report.player.is_some() {
                    frames_with_player += 1;
                }
                for entity in &report.entities {
                    *kinds.entry(format!("{:?}", entity.kind)).or_default() += 1;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                log::debug!("summary skipped {skipped} reports");
            }
            Err(RecvError::Closed) => break,
        }
    }
    log::info!("{frames} frames, player located in {frames_with_player}");
    for (kind, count) in kinds {
        log::info!("  {kind}: {count} sightings");
    }
}
