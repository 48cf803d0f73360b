//! This module contains the [PacketSource] trait, the packet-level half of a
//! stream session, along with the errors its operations can produce.

use ffmpeg_next as ffmpeg;

use crate::frame::{Dimensions, PlaneError, YuvPlanes};

/// Something that compressed packets can be read from and decoded into planar
/// YUV 4:2:0 pictures, one packet at a time.
///
/// A source is bound to exactly one selected video substream for its whole
/// life. Pictures it hands back always have the source's [Dimensions];
/// anything else is reported as [DecodeError::DimensionsChanged].
pub trait PacketSource {
    /// One compressed packet. Dropping it releases whatever it holds.
    type Packet;

    /// The dimensions of every picture this source decodes.
    fn dimensions(&self) -> Dimensions;

    /// Read the next packet from any substream.
    fn read_packet(&mut self) -> Result<Self::Packet, ReadError>;

    /// Whether `packet` belongs to the selected video substream.
    fn is_selected(&self, packet: &Self::Packet) -> bool;

    /// Feed `packet` to the decoder and hand back the newest complete picture,
    /// if the packet finished one.
    fn decode(&mut self, packet: &Self::Packet) -> Result<Option<YuvPlanes<'_>>, DecodeError>;
}

/// Indicates that no packet could be read.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("The stream ended.")]
    EndOfStream,
    #[error("Failed to read a packet: {0}")]
    Other(#[from] ffmpeg::Error),
}

/// Indicates that a packet couldn't be turned into a picture.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("The decoder rejected a packet: {0}")]
    Send(ffmpeg::Error),
    #[error("Failed to receive a picture from the decoder: {0}")]
    Receive(ffmpeg::Error),
    #[error("Failed to convert a picture to planar YUV 4:2:0: {0}")]
    Convert(ffmpeg::Error),
    #[error(
        "The stream's picture dimensions changed mid-session \
        (expected {expected} but got {actual})."
    )]
    DimensionsChanged {
        expected: Dimensions,
        actual: Dimensions,
    },
    #[error("A converted picture didn't fit its own planes: {0}")]
    Planes(#[from] PlaneError),
    #[error("The stream's pixel format changed mid-session ({from:?} to {to:?}).")]
    FormatChanged {
        from: ffmpeg::format::Pixel,
        to: ffmpeg::format::Pixel,
    },
}

impl DecodeError {
    /// Whether the stream renegotiated its picture layout, meaning the session's
    /// buffers no longer fit and a new session is needed. Every other decode
    /// error only costs one frame.
    pub fn is_renegotiation(&self) -> bool {
        matches!(
            self,
            DecodeError::DimensionsChanged { .. } | DecodeError::FormatChanged { .. }
        )
    }
}
