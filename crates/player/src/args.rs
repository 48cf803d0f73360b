//! Contains [Args], which are parsed command-line arguments.

use clap::Parser;

/// The stream played when no URL is given.
pub const DEFAULT_URL: &str = "rtsp://192.168.1.136:554/h264/ch1/main/av_stream";

/// The window title used when no title is given.
pub const DEFAULT_TITLE: &str = "title";

/// Parsed command line arguments.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Hash)]
#[command(
    version,
    about = "Plays a network video stream in a window, reconnecting whenever the stream ends."
)]
pub struct Args {
    /// The URL of the stream to play.
    #[arg(default_value = DEFAULT_URL)]
    pub url: String,

    /// The window's title.
    #[arg(default_value = DEFAULT_TITLE)]
    pub title: String,
}

impl Default for Args {
    fn default() -> Self {
        Self::parse()
    }
}
