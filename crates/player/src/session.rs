//! This module contains [StreamSession], which plays one connection to a
//! stream from its first tick until the stream ends or playback is quit, and
//! the [Presenter] trait it draws through.

use std::error::Error;

use engine::{Display, DisplayStatus, EngineError, VideoTexture};
use media::frame::{Dimensions, YuvPlanes};
use media::{DecodeError, PacketSource, ReadError};
use util::shutdown::ShutdownFlag;

use crate::dispatcher::{Dispatcher, PlaybackEvent};

/// Somewhere decoded pictures can be shown.
pub trait Presenter {
    /// A render target for pictures of one fixed size.
    type Texture;
    type Error: Error + 'static;

    fn create_texture(&mut self, dimensions: Dimensions) -> Self::Texture;

    /// Upload `picture` to `texture` and show it.
    fn present(
        &mut self,
        texture: &mut Self::Texture,
        picture: &YuvPlanes,
    ) -> Result<(), Self::Error>;

    /// Handle pending user input and report whether the user asked to stop.
    fn close_requested(&mut self) -> bool;
}

impl Presenter for Display {
    type Texture = VideoTexture;
    type Error = EngineError;

    fn create_texture(&mut self, dimensions: Dimensions) -> Self::Texture {
        self.create_video_texture(dimensions)
    }

    fn present(
        &mut self,
        texture: &mut Self::Texture,
        picture: &YuvPlanes,
    ) -> Result<(), Self::Error> {
        Display::present(self, texture, picture)
    }

    fn close_requested(&mut self) -> bool {
        self.pump_events() == DisplayStatus::CloseRequested
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEnd {
    /// The stream ended cleanly.
    EndOfStream,
    /// A packet couldn't be read.
    ReadError,
    /// The stream's picture size or format changed, so the session's buffers
    /// no longer fit.
    Renegotiated,
    /// Playback was quit. The shutdown flag is set.
    Quit,
}

impl SessionEnd {
    /// Whether another session should be started after this one (as long as
    /// the shutdown flag isn't set).
    pub fn wants_reconnect(&self) -> bool {
        *self != SessionEnd::Quit
    }
}

/// What happened during one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionReport {
    pub end: SessionEnd,
    /// Packets read from any substream.
    pub packets_read: u64,
    /// Packets from the selected video substream that were handed to the
    /// decoder.
    pub decode_attempts: u64,
    /// Decode attempts that failed and were skipped.
    pub decode_failures: u64,
    pub frames_presented: u64,
}

/// Indicates that a session couldn't continue and playback can't either.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Failed to present a frame: {0}")]
    Present(#[source] Box<dyn Error>),
}

/// Counters collected while a session runs.
#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    packets_read: u64,
    decode_attempts: u64,
    decode_failures: u64,
    frames_presented: u64,
}

/// One connection's worth of playback: on every tick, read one packet, decode
/// it if it belongs to the selected video substream and present the picture
/// it finished (if any).
///
/// The session owns its [PacketSource] and its render texture. Both are
/// released when the session ends, however it ends.
pub struct StreamSession<'p, S, P>
where
    S: PacketSource,
    P: Presenter,
{
    texture: P::Texture,
    source: S,
    presenter: &'p mut P,
    counters: Counters,
    quit_posted: bool,
}

impl<'p, S, P> StreamSession<'p, S, P>
where
    S: PacketSource,
    P: Presenter,
{
    /// Create a session for `source`, with a render texture sized for its
    /// pictures.
    pub fn new(source: S, presenter: &'p mut P) -> Self {
        let texture = presenter.create_texture(source.dimensions());

        Self {
            texture,
            source,
            presenter,
            counters: Counters::default(),
            quit_posted: false,
        }
    }

    /// Handle events from `dispatcher` until the stream ends or playback is
    /// quit. A quit sets `shutdown`.
    pub fn run(
        mut self,
        dispatcher: &Dispatcher,
        shutdown: &ShutdownFlag,
    ) -> Result<SessionReport, SessionError> {
        let end = loop {
            if shutdown.is_set() {
                break SessionEnd::Quit;
            }

            match dispatcher.next_event() {
                PlaybackEvent::Quit => {
                    if shutdown.set() {
                        log::info!("Quit requested.");
                    }
                    break SessionEnd::Quit;
                }
                PlaybackEvent::Tick => {}
            }

            if self.presenter.close_requested() {
                // The quit comes back around through the dispatcher, after
                // anything that's already waiting.
                if !self.quit_posted {
                    self.quit_posted = true;
                    dispatcher.post_quit();
                }
                continue;
            }

            if let Some(end) = self.step()? {
                break end;
            }
        };

        let Counters {
            packets_read,
            decode_attempts,
            decode_failures,
            frames_presented,
        } = self.counters;

        Ok(SessionReport {
            end,
            packets_read,
            decode_attempts,
            decode_failures,
            frames_presented,
        })
    }

    /// Read, filter, decode and present one packet. Returns how the session
    /// ended if it did.
    ///
    /// The packet is released when this returns, on every path.
    fn step(&mut self) -> Result<Option<SessionEnd>, SessionError> {
        let packet = match self.source.read_packet() {
            Ok(packet) => packet,
            Err(ReadError::EndOfStream) => {
                log::info!("The stream ended.");
                return Ok(Some(SessionEnd::EndOfStream));
            }
            Err(err) => {
                log::warn!("{err}");
                return Ok(Some(SessionEnd::ReadError));
            }
        };
        self.counters.packets_read += 1;

        if !self.source.is_selected(&packet) {
            log::trace!("Skipped a packet from another substream.");
            return Ok(None);
        }

        self.counters.decode_attempts += 1;

        match self.source.decode(&packet) {
            Ok(Some(picture)) => {
                self.presenter
                    .present(&mut self.texture, &picture)
                    .map_err(|err| SessionError::Present(Box::new(err)))?;
                self.counters.frames_presented += 1;
            }
            Ok(None) => log::trace!("The decoder needs more packets for a picture."),
            Err(err) if err.is_renegotiation() => {
                log::warn!("{err}");
                return Ok(Some(SessionEnd::Renegotiated));
            }
            Err(err) => {
                self.counters.decode_failures += 1;
                log::warn!("Skipping a frame: {err}");
            }
        }

        Ok(None)
    }
}


#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::fakes::*;
    use super::*;
    use crate::dispatcher::TickPolicy;

    /// A dispatcher with `ticks` ticks already waiting.
    fn dispatcher_with_ticks(ticks: usize) -> Dispatcher {
        let dispatcher = Dispatcher::new(TickPolicy::Unbounded);
        let sender = dispatcher.sender();
        for _ in 0..ticks {
            sender.send_tick().unwrap();
        }
        dispatcher
    }

    fn run_script(
        script: impl IntoIterator<Item = Step>,
        presenter: &mut FakePresenter,
        dispatcher: &Dispatcher,
    ) -> (SessionReport, Rc<Stats>) {
        let stats = Rc::new(Stats::default());
        let source = FakeSource::new(script, stats.clone());
        let report = StreamSession::new(source, presenter)
            .run(dispatcher, &ShutdownFlag::new())
            .unwrap();
        (report, stats)
    }

    #[test]
    fn other_substreams_are_read_but_never_decoded() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(10);

        let (report, stats) = run_script(
            [Video, Audio, Audio, Video, Audio],
            &mut presenter,
            &dispatcher,
        );

        assert_eq!(report.end, SessionEnd::EndOfStream);
        assert_eq!(report.packets_read, 5);
        assert_eq!(report.decode_attempts, 2);
        assert_eq!(report.frames_presented, 2);
        assert_eq!(*stats.decoded_streams.borrow(), [VIDEO_STREAM, VIDEO_STREAM]);
    }

    #[test]
    fn every_packet_is_released_once_before_the_next_read() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(10);

        let (report, stats) = run_script(
            [Video, Corrupt, Audio, PartialVideo, Video],
            &mut presenter,
            &dispatcher,
        );

        assert_eq!(report.packets_read, 5);
        assert_eq!(stats.packets_issued.get(), 5);
        assert_eq!(stats.packets_released.get(), 5);
        assert!(!stats.overlapping_packets.get());
    }

    #[test]
    fn decode_failures_are_skipped() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(10);

        let (report, _) = run_script([Corrupt, Video, Corrupt, Video], &mut presenter, &dispatcher);

        assert_eq!(report.end, SessionEnd::EndOfStream);
        assert_eq!(report.decode_attempts, 4);
        assert_eq!(report.decode_failures, 2);
        assert_eq!(report.frames_presented, 2);
        assert_eq!(presenter.presented, 2);
    }

    #[test]
    fn one_packet_is_handled_per_tick() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(3);
        dispatcher.post_quit();

        let (report, stats) = run_script([Video; 10], &mut presenter, &dispatcher);

        assert_eq!(report.end, SessionEnd::Quit);
        assert_eq!(report.packets_read, 3);
        assert_eq!(stats.packets_released.get(), 3);
    }

    #[test]
    fn texture_matches_the_source() {
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(1);

        let (_, stats) = run_script(std::iter::empty(), &mut presenter, &dispatcher);

        assert_eq!(presenter.textures_created, [Dimensions::from((2, 2))]);
        assert_eq!(stats.sources_dropped.get(), 1);
    }

    #[test]
    fn size_change_ends_the_session() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(10);

        let (report, stats) = run_script([Video, Resized, Video], &mut presenter, &dispatcher);

        assert_eq!(report.end, SessionEnd::Renegotiated);
        assert!(report.end.wants_reconnect());
        assert_eq!(report.frames_presented, 1);
        assert_eq!(stats.packets_released.get(), 2);
        assert_eq!(stats.sources_dropped.get(), 1);
    }

    #[test]
    fn read_failure_ends_the_session() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(10);

        let (report, _) = run_script([Video, ReadFailure, Video], &mut presenter, &dispatcher);

        assert_eq!(report.end, SessionEnd::ReadError);
        assert!(report.end.wants_reconnect());
        assert_eq!(report.packets_read, 1);
    }

    #[test]
    fn quit_sets_the_shutdown_flag_once() {
        use Step::*;
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with_ticks(2);
        dispatcher.post_quit();
        dispatcher.post_quit();
        let shutdown = ShutdownFlag::new();
        let stats = Rc::new(Stats::default());

        let report = StreamSession::new(FakeSource::new([Video; 5], stats.clone()), &mut presenter)
            .run(&dispatcher, &shutdown)
            .unwrap();

        assert_eq!(report.end, SessionEnd::Quit);
        assert!(!report.end.wants_reconnect());
        assert_eq!(report.frames_presented, 2);
        assert!(shutdown.is_set());
        assert_eq!(stats.sources_dropped.get(), 1);

        // Once the flag is set, a new session stops before reading anything.
        let report = StreamSession::new(FakeSource::new([Video], stats.clone()), &mut presenter)
            .run(&dispatcher, &shutdown)
            .unwrap();
        assert_eq!(report.end, SessionEnd::Quit);
        assert_eq!(report.packets_read, 0);

        // The second quit is left over and changes nothing.
        assert_eq!(dispatcher.try_next_event(), Some(PlaybackEvent::Quit));
        assert!(!shutdown.set());
    }

    #[test]
    fn closing_the_window_quits() {
        use Step::*;
        let mut presenter = FakePresenter {
            close_after: Some(2),
            ..Default::default()
        };
        let dispatcher = dispatcher_with_ticks(10);
        let shutdown = ShutdownFlag::new();
        let stats = Rc::new(Stats::default());

        let report = StreamSession::new(FakeSource::new([Video; 10], stats.clone()), &mut presenter)
            .run(&dispatcher, &shutdown)
            .unwrap();

        assert_eq!(report.end, SessionEnd::Quit);
        assert_eq!(report.frames_presented, 2);
        assert!(shutdown.is_set());
        // Only one quit was posted even though ticks kept coming.
        assert_eq!(dispatcher.try_next_event(), None);
    }

    #[test]
    fn presenter_failure_is_an_error() {
        use Step::*;
        let mut presenter = FakePresenter {
            fail_after: Some(1),
            ..Default::default()
        };
        let dispatcher = dispatcher_with_ticks(10);
        let stats = Rc::new(Stats::default());

        let result = StreamSession::new(FakeSource::new([Video; 5], stats.clone()), &mut presenter)
            .run(&dispatcher, &ShutdownFlag::new());

        assert!(matches!(result, Err(SessionError::Present(_))));
        assert_eq!(stats.packets_released.get(), 2);
        assert_eq!(stats.sources_dropped.get(), 1);
    }
}
