use std::process::ExitCode;
use std::time::Duration;

use engine::Display;
use media::{DecoderTuning, TransportOptions};
use util::shutdown::ShutdownFlag;
use util::stop_signals;

use player::args::Args;
use player::clock::FrameClock;
use player::dispatcher::{Dispatcher, TickPolicy};
use player::playback::{self, RtspConnector};

const WINDOW_WIDTH: u32 = 1080;
const WINDOW_HEIGHT: u32 = 720;

/// 25 frames per second.
const FRAME_INTERVAL: Duration = Duration::from_millis(40);

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::default();
    log::info!("Playing video: {}", args.url);

    // Held until the end of `main` so stop signals keep being captured.
    let _signals = match stop_signals::capture() {
        Ok(guard) => guard,
        Err(e) => {
            log::error!("Failed to capture stop signals: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut display = match Display::open(&args.title, WINDOW_WIDTH, WINDOW_HEIGHT) {
        Ok(display) => display,
        Err(e) => {
            log::error!("Failed to open a window: {e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = ShutdownFlag::new();
    let dispatcher = Dispatcher::new(TickPolicy::Coalesce);

    let _clock = match FrameClock::spawn(
        FRAME_INTERVAL,
        dispatcher.sender(),
        shutdown.clone(),
        stop_signals::consume,
    ) {
        Ok(clock) => clock,
        Err(e) => {
            log::error!("Failed to start the frame clock: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut connector = RtspConnector::new(
        args.url,
        TransportOptions::default(),
        DecoderTuning::default(),
    );

    match playback::run(&mut connector, &mut display, &dispatcher, &shutdown) {
        Ok(report) => {
            log::info!(
                "Playback stopped after {} session(s): {} frame(s) presented, {} decode failure(s).",
                report.sessions,
                report.frames_presented,
                report.decode_failures,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
