//! This module contains FFmpeg setup and [YuvConverter], which normalizes
//! decoded pictures to planar YUV 4:2:0.

#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicBool, Ordering};

use ctor::ctor;

use ffmpeg::format::Pixel as FFmpegPixelFormat;
use ffmpeg::frame::Video as FFmpegVideoFrame;
use ffmpeg::software::scaling::Context as FFmpegScalingContext;
use ffmpeg::software::scaling::flag::Flags as FFmpegScalingFlags;
use ffmpeg_next as ffmpeg;

use crate::frame::{Dimensions, Plane, YuvPlanes};
use crate::source::DecodeError;

/// The pixel format every picture is converted to before it's displayed.
pub const TARGET_FORMAT: FFmpegPixelFormat = FFmpegPixelFormat::YUV420P;

/// Converts decoded pictures of one fixed source format and size into a
/// planar YUV 4:2:0 buffer of the same size.
///
/// The buffer is allocated once and reused for every picture. Dropping the
/// converter releases the conversion context first and the buffer second.
pub struct YuvConverter {
    scaler: FFmpegScalingContext,
    converted: FFmpegVideoFrame,
    source_format: FFmpegPixelFormat,
    dimensions: Dimensions,
}

impl YuvConverter {
    /// Create a converter from `source_format` pictures with `dimensions`.
    pub fn new(
        source_format: FFmpegPixelFormat,
        dimensions: Dimensions,
    ) -> Result<Self, ffmpeg::Error> {
        let scaler = FFmpegScalingContext::get(
            // Src. format:
            source_format,
            dimensions.width(),
            dimensions.height(),
            // Dest. format (same size, we only change the layout):
            TARGET_FORMAT,
            dimensions.width(),
            dimensions.height(),
            FFmpegScalingFlags::BICUBIC,
        )?;

        let converted =
            FFmpegVideoFrame::new(TARGET_FORMAT, dimensions.width(), dimensions.height());

        Ok(Self {
            scaler,
            converted,
            source_format,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Convert `decoded` into this converter's buffer and borrow the result.
    ///
    /// `decoded` must have the format and dimensions the converter was created
    /// with. A different size is reported as [DecodeError::DimensionsChanged]
    /// and a different format as [DecodeError::FormatChanged].
    pub fn convert(&mut self, decoded: &FFmpegVideoFrame) -> Result<YuvPlanes<'_>, DecodeError> {
        let actual = Dimensions::new(decoded.width(), decoded.height());
        if actual != Some(self.dimensions) {
            return Err(DecodeError::DimensionsChanged {
                expected: self.dimensions,
                // A 0x0 picture can't be described by `Dimensions`, so it's
                // reported as the smallest picture there is.
                actual: actual.unwrap_or((1, 1).into()),
            });
        }

        if decoded.format() != self.source_format {
            return Err(DecodeError::FormatChanged {
                from: self.source_format,
                to: decoded.format(),
            });
        }

        self.scaler
            .run(decoded, &mut self.converted)
            .map_err(DecodeError::Convert)?;

        let plane = |i: usize| Plane::new(self.converted.data(i), self.converted.stride(i));
        Ok(YuvPlanes::new(self.dimensions, plane(0), plane(1), plane(2))?)
    }
}

/// Initializes FFmpeg (including its networking layer). This happens when the
/// [crate] is loaded.
///
/// You should never actually call this function.
#[ctor]
fn ffmpeg_init() {
    #[cfg(debug_assertions)]
    {
        static ALREADY_INIT: AtomicBool = AtomicBool::new(false);
        assert!(
            !ALREADY_INIT.swap(true, Ordering::SeqCst),
            "Tried to initialize FFmpeg twice. \
            THIS WOULD NOT HAVE BEEN CAUGHT IN A RELEASE BUILD."
        );
    }

    ffmpeg::init().expect("FFmpeg shouldn't fail to initialize.");
    ffmpeg::format::network::init();
}
