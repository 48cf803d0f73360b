//! Typed tuning knobs for opening a network stream ([TransportOptions]) and
//! its decoder ([DecoderTuning]). Both render to the string dictionaries FFmpeg
//! expects.

use std::time::Duration;

use ffmpeg_next as ffmpeg;

/// Which kind of transport to ask the stream's server for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transport {
    /// Interleave media over the control connection (TCP). Nothing is lost but
    /// a stalled connection stalls the picture.
    #[default]
    Reliable,
    /// Separate datagram flows (UDP). Lower latency, but lost packets turn into
    /// decode errors.
    Connectionless,
}

impl Transport {
    /// The value FFmpeg's RTSP demuxer expects for `rtsp_transport`.
    pub fn as_ffmpeg_str(&self) -> &'static str {
        match self {
            Transport::Reliable => "tcp",
            Transport::Connectionless => "udp",
        }
    }
}

/// Options used when connecting to a network stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportOptions {
    /// Size of the socket's receive buffer in bytes.
    pub buffer_size: u32,
    /// The longest the demuxer may hold packets back to reorder them.
    pub max_delay: Duration,
    /// The frame rate the source is expected to have.
    pub frame_rate: u32,
    /// How long a socket may go without data before the connection is
    /// considered dead.
    pub socket_timeout: Duration,
    pub transport: Transport,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1_024_000,
            max_delay: Duration::from_millis(500),
            frame_rate: 25,
            socket_timeout: Duration::from_secs(20),
            transport: Transport::Reliable,
        }
    }
}

impl TransportOptions {
    /// The option dictionary to open the stream's input with. Durations are
    /// written in microseconds.
    pub fn to_dictionary(&self) -> ffmpeg::Dictionary<'static> {
        let mut dict = ffmpeg::Dictionary::new();
        dict.set("buffer_size", &self.buffer_size.to_string());
        dict.set("max_delay", &self.max_delay.as_micros().to_string());
        dict.set("fps", &self.frame_rate.to_string());
        dict.set("timeout", &self.socket_timeout.as_micros().to_string());
        dict.set("rtsp_transport", self.transport.as_ffmpeg_str());
        dict
    }
}

/// Hints applied to the decoder before it's opened so it hands pictures back
/// as soon as it can instead of buffering for quality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecoderTuning {
    /// Set the codec's low-delay flag.
    pub low_delay: bool,
    pub preset: Option<String>,
    pub tune: Option<String>,
}

impl Default for DecoderTuning {
    fn default() -> Self {
        Self {
            low_delay: true,
            preset: Some(String::from("superfast")),
            tune: Some(String::from("zerolatency")),
        }
    }
}

impl DecoderTuning {
    /// The option dictionary to open the decoder with. Options the chosen
    /// decoder doesn't recognize are ignored by FFmpeg.
    pub fn to_dictionary(&self) -> ffmpeg::Dictionary<'static> {
        let mut dict = ffmpeg::Dictionary::new();
        if let Some(preset) = &self.preset {
            dict.set("preset", preset);
        }
        if let Some(tune) = &self.tune {
            dict.set("tune", tune);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_options_render_to_ffmpeg_keys() {
        let dict = TransportOptions::default().to_dictionary();

        assert_eq!(dict.get("buffer_size"), Some("1024000"));
        assert_eq!(dict.get("max_delay"), Some("500000"));
        assert_eq!(dict.get("fps"), Some("25"));
        assert_eq!(dict.get("timeout"), Some("20000000"));
        assert_eq!(dict.get("rtsp_transport"), Some("tcp"));
    }

    #[test]
    fn connectionless_transport_is_udp() {
        let options = TransportOptions {
            transport: Transport::Connectionless,
            ..Default::default()
        };
        assert_eq!(options.to_dictionary().get("rtsp_transport"), Some("udp"));
    }

    #[test]
    fn decoder_tuning_skips_unset_hints() {
        let dict = DecoderTuning::default().to_dictionary();
        assert_eq!(dict.get("preset"), Some("superfast"));
        assert_eq!(dict.get("tune"), Some("zerolatency"));

        let plain = DecoderTuning {
            low_delay: false,
            preset: None,
            tune: None,
        };
        let dict = plain.to_dictionary();
        assert_eq!(dict.get("preset"), None);
        assert_eq!(dict.get("tune"), None);
    }
}
