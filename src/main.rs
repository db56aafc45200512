// SPDX-License-Identifier: MPL-2.0
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vidsync::config::{self, defaults};
use vidsync::domain::media::{Point, RawImage, Size};
use vidsync::infrastructure::{
    ImagePresenter, SimulatedAudioChannel, SyntheticClip, SyntheticDecoder,
};
use vidsync::{Playback, PlaybackSession};

const HELP: &str = "\
vidsync - play a synthetic clip against a simulated audio clock

USAGE:
  vidsync [OPTIONS]

OPTIONS:
  --duration SECS      Clip duration [default: 5]
  --fps FPS            Clip frame rate [default: 30]
  --width PX           Frame width [default: 320]
  --height PX          Frame height [default: 180]
  --loops N            Extra playthroughs, -1 for endless [default: 0]
  --ticks N            Render ticks before quitting [default: 90]
  --tick-ms MS         Delay between ticks [default: 33]
  --cache-frames N     Pre-cache the first N frames
  --volume V           Channel volume, 0.0 to 1.0
  --config PATH        Playback config file
  -h, --help           Print this help
";

struct Args {
    duration: f64,
    fps: f64,
    width: u32,
    height: u32,
    loops: i32,
    ticks: u32,
    tick_ms: u64,
    cache_frames: Option<usize>,
    volume: Option<f32>,
    config: Option<PathBuf>,
}

fn parse_args(mut args: pico_args::Arguments) -> Result<Args, pico_args::Error> {
    let parsed = Args {
        duration: args
            .opt_value_from_str("--duration")?
            .unwrap_or(defaults::DEMO_DURATION_SECS),
        fps: args
            .opt_value_from_str("--fps")?
            .unwrap_or(defaults::DEMO_FPS),
        width: args
            .opt_value_from_str("--width")?
            .unwrap_or(defaults::DEMO_WIDTH),
        height: args
            .opt_value_from_str("--height")?
            .unwrap_or(defaults::DEMO_HEIGHT),
        loops: args.opt_value_from_str("--loops")?.unwrap_or(0),
        ticks: args
            .opt_value_from_str("--ticks")?
            .unwrap_or(defaults::DEMO_TICKS),
        tick_ms: args
            .opt_value_from_str("--tick-ms")?
            .unwrap_or(defaults::DEMO_TICK_MS),
        cache_frames: args.opt_value_from_str("--cache-frames")?,
        volume: args.opt_value_from_str("--volume")?,
        config: args.opt_value_from_str("--config")?,
    };

    let remaining = args.finish();
    if !remaining.is_empty() {
        tracing::warn!(?remaining, "ignoring unknown arguments");
    }
    Ok(parsed)
}

fn run(args: Args) -> vidsync::Result<()> {
    let config = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    let clip_path = PathBuf::from("synthetic/demo.mp4");
    let decoder = SyntheticDecoder::new().with_clip(
        clip_path.clone(),
        SyntheticClip::new(args.width, args.height, args.fps, args.duration),
    );
    let session = PlaybackSession::new(SimulatedAudioChannel::wall_clock(), ImagePresenter::new());
    let playback = Playback::open(&session, &decoder, &clip_path, config)?;
    tracing::info!(%playback, frames = playback.total_frames()?, "clip opened");

    if let Some(budget) = args.cache_frames {
        let cached = playback.create_cache(Some(budget))?;
        tracing::info!(cached, "frames cached");
    }

    playback.prepare()?;
    if let Some(volume) = args.volume {
        playback.set_volume(volume.clamp(defaults::MIN_VOLUME, defaults::MAX_VOLUME), false)?;
    }
    playback.play(args.loops, 0.0)?;

    let mut screen = RawImage::blank(Size::new(args.width, args.height));
    for tick in 0..args.ticks {
        playback.advance_and_render(Some(&mut screen), Point::default())?;
        tracing::info!(
            tick,
            frame = playback.frame_index()?,
            loops_completed = playback.loops_completed()?,
            position = ?playback.position()?,
            "tick"
        );
        if !playback.state().is_active() {
            tracing::info!("playback ended");
            break;
        }
        thread::sleep(Duration::from_millis(args.tick_ms));
    }

    let report = session.quit_all();
    if !report.is_clean() {
        tracing::warn!(failed = report.failed.len(), "some instances failed to quit");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return ExitCode::SUCCESS;
    }

    let result = parse_args(pargs)
        .map_err(vidsync::Error::from)
        .and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "vidsync failed");
            ExitCode::FAILURE
        }
    }
}
