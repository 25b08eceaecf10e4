use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use scantrack::overlay::Animation;
use scantrack::{
    AttitudeSample, Error, Frame, NormalizedDetection, OverlayStyle, RenderSurface,
    SessionRunner, TrackerConfig, TrackingRect, Viewport,
};

/// Drives a tracking session with a synthetic camera, analyzer and attitude sensor.
#[derive(Parser, Debug)]
#[command(name = "scan_sim")]
struct Args {
    /// TOML config file (falls back to SCANTRACK_CONFIG)
    #[arg(long, env = "SCANTRACK_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    duration_secs: u64,

    /// Simulated analyzer latency
    #[arg(long, default_value_t = 120)]
    analysis_ms: u64,

    #[arg(long, default_value_t = 390.0)]
    viewport_width: f32,

    #[arg(long, default_value_t = 844.0)]
    viewport_height: f32,
}

struct SyntheticAnalyzer {
    latency: Duration,
    passes: u64,
}

impl scantrack::Analyzer for SyntheticAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<NormalizedDetection>, Error> {
        std::thread::sleep(self.latency);
        self.passes += 1;

        // every eighth pass sees nothing
        if self.passes % 8 == 0 {
            log::debug!("pass {}: nothing in view", self.passes);
            return Ok(Vec::new());
        }

        let t = frame.timestamp;

        Ok(vec![NormalizedDetection::new(
            0.4 + (t * 0.7).sin() * 0.1,
            0.3 + (t * 0.5).cos() * 0.05,
            0.2,
            0.08,
        )])
    }
}

struct LogSurface;

impl RenderSurface for LogSurface {
    fn create_overlay(&mut self, rect: &TrackingRect, style: &OverlayStyle) {
        log::info!("create overlay {:?} style {:?}", rect.as_slice(), style);
    }

    fn animate_overlay(&mut self, animation: &Animation) {
        log::info!(
            "animate overlay {:?} -> {:?} over {:.2}s",
            animation.from.as_slice(),
            animation.to.as_slice(),
            animation.duration
        );
    }

    fn nudge_overlay(&mut self, dx: f32, dy: f32, displayed: &TrackingRect) {
        log::debug!("nudge ({:.2}, {:.2}) -> {:?}", dx, dy, displayed.as_slice());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = TrackerConfig::load_from(args.config.as_deref()).context("loading config")?;
    let interval = config.motion_interval;

    let analyzer = SyntheticAnalyzer {
        latency: Duration::from_millis(args.analysis_ms),
        passes: 0,
    };
    let handle = SessionRunner::spawn(config, analyzer, LogSurface)?;

    let start = Instant::now();
    let mut submitted = 0u32;
    let mut dropped = 0u32;
    let mut laid_out = false;

    while start.elapsed() < Duration::from_secs(args.duration_secs) {
        let t = start.elapsed().as_secs_f32();

        handle.submit_attitude(AttitudeSample::new(
            (t * 1.3).sin() * 0.05,
            (t * 0.9).cos() * 0.03,
            0.0,
            t,
        ))?;

        if !laid_out {
            handle.layout(Viewport::new(args.viewport_width, args.viewport_height))?;
            laid_out = true;
        }

        if handle.submit_frame(Frame::blank(1920, 1080, t)) {
            submitted += 1;
        } else {
            dropped += 1;
        }

        std::thread::sleep(interval);
    }

    let session = handle.shutdown();
    log::info!(
        "frames analysed: {}, dropped while busy: {}, final overlay: {:?}",
        submitted,
        dropped,
        session.and_then(|s| s.overlay().target()).map(|r| *r.as_slice())
    );

    Ok(())
}
