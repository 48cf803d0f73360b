//! This library contains the FFmpeg side of playing a network video stream:
//! connecting, picking the video substream, opening its decoder, reading
//! packets, decoding them, and converting pictures to planar YUV 4:2:0.

pub mod frame;
pub mod options;
pub mod rtsp;
pub mod source;

mod ffmpeg_tools;

pub use options::{DecoderTuning, Transport, TransportOptions};
pub use rtsp::{RtspSource, SessionSetupError};
pub use source::{DecodeError, PacketSource, ReadError};

/// FFmpeg's error type, which some [DecodeError] and [ReadError] variants wrap.
pub use ffmpeg_next::Error as FFmpegError;
