//! The module contains [RtspSource], a [PacketSource] that plays a network
//! video stream (RTSP, or anything else FFmpeg can open from a URL).

use ffmpeg::codec::Context as FFmpegCodecContext;
use ffmpeg::codec::Flags as FFmpegCodecFlags;
use ffmpeg::codec::decoder::Video as FFmpegVideoDecoder;
use ffmpeg::codec::packet::Packet as FFmpegPacket;
use ffmpeg::format::context::Input as FFmpegInputFormatContext;
use ffmpeg::frame::Video as FFmpegVideoFrame;
use ffmpeg::media::Type as FFmpegMediaType;
use ffmpeg_next as ffmpeg;

use crate::ffmpeg_tools::YuvConverter;
use crate::frame::{Dimensions, YuvPlanes};
use crate::options::{DecoderTuning, TransportOptions};
use crate::source::{DecodeError, PacketSource, ReadError};

/// One connection to a network video stream, bound to its first video
/// substream.
///
/// Everything a session needs is created up front by [RtspSource::connect]:
/// the stream handle, the decoder, the decoded-picture buffer and the YUV 4:2:0
/// converter (with its own buffer). All of it is released when the source is
/// dropped.
///
/// Teardown order comes from the field order below (fields are dropped in
/// declaration order): converter and its buffer, decoded buffer, decoder,
/// stream handle. Reordering the fields changes teardown.
pub struct RtspSource {
    converter: YuvConverter,
    decoded: FFmpegVideoFrame,
    decoder: FFmpegVideoDecoder,
    input_context: FFmpegInputFormatContext,
    video_stream_index: usize,
    url: String,
}

impl RtspSource {
    /// Connect to `url` and get everything ready to decode its first video
    /// substream.
    pub fn connect(
        url: &str,
        transport: &TransportOptions,
        tuning: &DecoderTuning,
    ) -> Result<Self, SessionSetupError> {
        // This opens the connection and probes the stream so we know what
        // substreams it has (FFmpeg has none of the actual video data yet).
        let input_context = ffmpeg::format::input_with_dictionary(&url, transport.to_dictionary())
            .map_err(|source| SessionSetupError::Connect {
                url: url.to_owned(),
                source,
            })?;

        // We always take the first video substream, even if the server offers
        // a "better" one.
        let video_stream = input_context
            .streams()
            .find(|stream| stream.parameters().medium() == FFmpegMediaType::Video)
            .ok_or(SessionSetupError::NoVideoStream)?;

        // When we're reading packets later, we'll ignore every packet that
        // isn't from this substream.
        let video_stream_index = video_stream.index();

        let codec_id = video_stream.parameters().id();
        let codec =
            ffmpeg::codec::decoder::find(codec_id).ok_or(SessionSetupError::CodecNotFound(codec_id))?;

        let mut decoder_context = FFmpegCodecContext::from_parameters(video_stream.parameters())
            .map_err(SessionSetupError::CodecOpen)?;
        if tuning.low_delay {
            decoder_context.set_flags(FFmpegCodecFlags::LOW_DELAY);
        }

        let decoder = decoder_context
            .decoder()
            .open_as_with(codec, tuning.to_dictionary())
            .and_then(|opened| opened.video())
            .map_err(SessionSetupError::CodecOpen)?;

        let dimensions = Dimensions::new(decoder.width(), decoder.height()).ok_or(
            SessionSetupError::ZeroSizedVideo {
                width: decoder.width(),
                height: decoder.height(),
            },
        )?;

        let converter = YuvConverter::new(decoder.format(), dimensions)
            .map_err(SessionSetupError::ConverterCreate)?;

        log::debug!(
            "Opened substream #{video_stream_index} ({codec_id:?}, {:?}, {dimensions}).",
            decoder.format()
        );

        Ok(Self {
            converter,
            decoded: FFmpegVideoFrame::empty(),
            decoder,
            input_context,
            video_stream_index,
            url: url.to_owned(),
        })
    }

    /// Have FFmpeg print its description of the stream (container,
    /// substreams, codec parameters) to stderr. Nothing is printed unless
    /// `info` logging is enabled.
    pub fn dump_stream_info(&self) {
        if !log::log_enabled!(log::Level::Info) {
            return;
        }

        log::info!("------------------------- stream info -------------------------");
        ffmpeg::format::context::input::dump(&self.input_context, 0, Some(&self.url));
        log::info!("---------------------------------------------------------------");
    }

    /// Pull every picture the decoder has ready, keeping only the newest one.
    /// Returns whether any picture was received.
    fn drain_decoder(&mut self) -> Result<bool, DecodeError> {
        let mut received = false;

        loop {
            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => received = true,
                // The decoder needs more packets (or is done), so there is
                // nothing left to pull for now.
                Err(ffmpeg::Error::Eof) => break,
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
                    break;
                }
                Err(err) => return Err(DecodeError::Receive(err)),
            }
        }

        Ok(received)
    }
}

impl PacketSource for RtspSource {
    type Packet = FFmpegPacket;

    fn dimensions(&self) -> Dimensions {
        self.converter.dimensions()
    }

    fn read_packet(&mut self) -> Result<Self::Packet, ReadError> {
        let mut packet = FFmpegPacket::empty();

        match packet.read(&mut self.input_context) {
            Ok(()) => Ok(packet),
            Err(ffmpeg::Error::Eof) => Err(ReadError::EndOfStream),
            Err(err) => Err(ReadError::Other(err)),
        }
    }

    fn is_selected(&self, packet: &Self::Packet) -> bool {
        packet.stream() == self.video_stream_index
    }

    fn decode(&mut self, packet: &Self::Packet) -> Result<Option<YuvPlanes<'_>>, DecodeError> {
        self.decoder
            .send_packet(packet)
            .map_err(DecodeError::Send)?;

        if !self.drain_decoder()? {
            return Ok(None);
        }

        self.converter.convert(&self.decoded).map(Some)
    }
}

/// Indicates that a session couldn't get far enough to start streaming. All of
/// these are terminal.
#[derive(thiserror::Error, Debug)]
pub enum SessionSetupError {
    #[error("Failed to open `{url}`: {source}")]
    Connect { url: String, source: ffmpeg::Error },
    #[error("The stream has no video substream.")]
    NoVideoStream,
    #[error("No decoder is available for the video codec {0:?}.")]
    CodecNotFound(ffmpeg::codec::Id),
    #[error("Failed to open the video decoder: {0}")]
    CodecOpen(ffmpeg::Error),
    #[error(
        "The video stream shouldn't have dimensions with a 0-length side \
        ({width}x{height} has no area)."
    )]
    ZeroSizedVideo { width: u32, height: u32 },
    #[error("Failed to create a frame converter: {0}")]
    ConverterCreate(ffmpeg::Error),
}
