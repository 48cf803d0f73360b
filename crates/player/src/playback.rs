//! This module contains the playback loop ([run]): keep starting sessions
//! against the same stream until playback is quit.

use media::{DecoderTuning, PacketSource, RtspSource, SessionSetupError, TransportOptions};
use util::shutdown::ShutdownFlag;

use crate::dispatcher::Dispatcher;
use crate::session::{Presenter, SessionEnd, SessionError, StreamSession};

/// Opens new connections to one stream.
pub trait Connector {
    type Source: PacketSource;

    fn connect(&mut self) -> Result<Self::Source, SessionSetupError>;
}

/// Connects to a network stream with [RtspSource].
#[derive(Debug, Clone)]
pub struct RtspConnector {
    url: String,
    transport: TransportOptions,
    tuning: DecoderTuning,
}

impl RtspConnector {
    pub fn new(url: String, transport: TransportOptions, tuning: DecoderTuning) -> Self {
        Self {
            url,
            transport,
            tuning,
        }
    }
}

impl Connector for RtspConnector {
    type Source = RtspSource;

    fn connect(&mut self) -> Result<Self::Source, SessionSetupError> {
        let source = RtspSource::connect(&self.url, &self.transport, &self.tuning)?;
        source.dump_stream_info();
        Ok(source)
    }
}

/// What happened over the whole of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaybackReport {
    /// The number of sessions that were started (including the last one).
    pub sessions: u64,
    pub frames_presented: u64,
    pub decode_failures: u64,
}

/// Indicates that playback stopped because of an error. These are all
/// terminal: a new session is only attempted after one ends on its own.
#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("Session #{session} couldn't start: {source}")]
    Setup {
        session: u64,
        source: SessionSetupError,
    },
    #[error("Session #{session} failed: {source}")]
    Session { session: u64, source: SessionError },
}

/// Run sessions one after another until one ends with a quit or the shutdown
/// flag is set. A session that ends any other way (the stream ended, a read
/// failed, the stream renegotiated its picture size) is followed by exactly
/// one new session.
///
/// The presenter is shared by every session; each session creates its own
/// render texture.
pub fn run<C, P>(
    connector: &mut C,
    presenter: &mut P,
    dispatcher: &Dispatcher,
    shutdown: &ShutdownFlag,
) -> Result<PlaybackReport, PlaybackError>
where
    C: Connector,
    P: Presenter,
{
    let mut report = PlaybackReport::default();

    while !shutdown.is_set() {
        report.sessions += 1;
        let session = report.sessions;
        log::info!("Starting session #{session}.");

        let source = connector
            .connect()
            .map_err(|source| PlaybackError::Setup { session, source })?;

        log::info!("Streaming at {}.", source.dimensions());

        let session_report = StreamSession::new(source, presenter)
            .run(dispatcher, shutdown)
            .map_err(|source| PlaybackError::Session { session, source })?;

        report.frames_presented += session_report.frames_presented;
        report.decode_failures += session_report.decode_failures;

        log::info!(
            "Session #{session} ended ({:?}) after {} packet(s), {} frame(s) presented.",
            session_report.end,
            session_report.packets_read,
            session_report.frames_presented,
        );

        match session_report.end {
            SessionEnd::Quit => break,
            SessionEnd::ReadError => log::warn!("Reconnecting after a read error."),
            SessionEnd::EndOfStream | SessionEnd::Renegotiated => log::info!("Reconnecting."),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::rc::Rc;

    use media::FFmpegError;

    use super::*;
    use crate::dispatcher::{PlaybackEvent, TickPolicy};
    use crate::session::fakes::*;

    /// Hands out scripted sources in order. Once the scripts run out, every
    /// connection fails.
    struct FakeConnector {
        scripts: VecDeque<Vec<Step>>,
        stats: Rc<Stats>,
    }

    impl FakeConnector {
        fn new(scripts: impl IntoIterator<Item = Vec<Step>>) -> Self {
            Self {
                scripts: scripts.into_iter().collect(),
                stats: Rc::default(),
            }
        }
    }

    impl Connector for FakeConnector {
        type Source = FakeSource;

        fn connect(&mut self) -> Result<Self::Source, SessionSetupError> {
            let connects = &self.stats.connects;
            connects.set(connects.get() + 1);

            let script = self.scripts.pop_front().ok_or(SessionSetupError::Connect {
                url: String::from("rtsp://unreachable"),
                source: FFmpegError::Unknown,
            })?;
            Ok(FakeSource::new(script, self.stats.clone()))
        }
    }

    fn dispatcher_with(events: impl IntoIterator<Item = PlaybackEvent>) -> Dispatcher {
        let dispatcher = Dispatcher::new(TickPolicy::Unbounded);
        let sender = dispatcher.sender();
        for event in events {
            match event {
                PlaybackEvent::Tick => {
                    sender.send_tick().unwrap();
                }
                PlaybackEvent::Quit => sender.send_quit().unwrap(),
            }
        }
        dispatcher
    }

    fn ticks(n: usize) -> impl Iterator<Item = PlaybackEvent> {
        std::iter::repeat_n(PlaybackEvent::Tick, n)
    }

    #[test]
    fn unreachable_stream_is_terminal() {
        let mut connector = FakeConnector::new(Vec::new());
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with(ticks(5));
        let shutdown = ShutdownFlag::new();

        let result = run(&mut connector, &mut presenter, &dispatcher, &shutdown);

        assert!(matches!(
            result,
            Err(PlaybackError::Setup {
                session: 1,
                source: SessionSetupError::Connect { .. },
            })
        ));
        assert_eq!(connector.stats.connects.get(), 1);
        assert!(presenter.textures_created.is_empty());
        assert!(!shutdown.is_set());
    }

    #[test]
    fn end_of_stream_starts_exactly_one_new_session() {
        use Step::*;
        // 100 video packets, then the source closes the connection. The second
        // session sees the quit.
        let mut connector = FakeConnector::new([vec![Video; 100], vec![Video; 100]]);
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with(ticks(101).chain([PlaybackEvent::Quit]));
        let shutdown = ShutdownFlag::new();

        let report = run(&mut connector, &mut presenter, &dispatcher, &shutdown).unwrap();

        assert_eq!(report.sessions, 2);
        assert_eq!(connector.stats.connects.get(), 2);
        assert_eq!(connector.stats.decoded_streams.borrow().len(), 100);
        assert_eq!(report.frames_presented, 100);
        assert_eq!(connector.stats.sources_dropped.get(), 2);
        assert!(shutdown.is_set());
    }

    #[test]
    fn read_errors_and_renegotiation_reconnect_too() {
        use Step::*;
        let mut connector = FakeConnector::new([
            vec![Video, ReadFailure],
            vec![Video, Resized],
            vec![Video],
            vec![],
        ]);
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with(ticks(6).chain([PlaybackEvent::Quit]));
        let shutdown = ShutdownFlag::new();

        let report = run(&mut connector, &mut presenter, &dispatcher, &shutdown).unwrap();

        // Session 3 reads its video packet and then the end of the stream, so
        // a 4th session is started and sees the quit.
        assert_eq!(report.sessions, 4);
        assert_eq!(report.frames_presented, 3);
        assert_eq!(presenter.textures_created.len(), 4);
    }

    #[test]
    fn losing_the_stream_after_sessions_worked_is_still_terminal() {
        use Step::*;
        let mut connector = FakeConnector::new([vec![Video; 3]]);
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with(ticks(10));
        let shutdown = ShutdownFlag::new();

        let result = run(&mut connector, &mut presenter, &dispatcher, &shutdown);

        assert!(matches!(
            result,
            Err(PlaybackError::Setup { session: 2, .. })
        ));
        assert_eq!(presenter.presented, 3);
    }

    #[test]
    fn quit_after_ten_frames_tears_down_and_stops() {
        use Step::*;
        let mut connector = FakeConnector::new([vec![Video; 50], vec![Video; 50]]);
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with(ticks(10).chain([PlaybackEvent::Quit]).chain(ticks(10)));
        let shutdown = ShutdownFlag::new();

        let report = run(&mut connector, &mut presenter, &dispatcher, &shutdown).unwrap();

        assert_eq!(report.sessions, 1);
        assert_eq!(report.frames_presented, 10);
        assert!(shutdown.is_set());
        assert_eq!(connector.stats.connects.get(), 1);
        assert_eq!(connector.stats.sources_dropped.get(), 1);
        assert_eq!(
            connector.stats.packets_issued.get(),
            connector.stats.packets_released.get()
        );
    }

    #[test]
    fn nothing_starts_once_shutdown_is_set() {
        let mut connector = FakeConnector::new([vec![Step::Video]]);
        let mut presenter = FakePresenter::default();
        let dispatcher = dispatcher_with(ticks(1));
        let shutdown = ShutdownFlag::new();
        shutdown.set();

        let report = run(&mut connector, &mut presenter, &dispatcher, &shutdown).unwrap();

        assert_eq!(report, PlaybackReport::default());
        assert_eq!(connector.stats.connects.get(), 0);
    }

    #[test]
    fn presenter_failure_stops_playback() {
        use Step::*;
        let mut connector = FakeConnector::new([vec![Video; 5], vec![Video; 5]]);
        let mut presenter = FakePresenter {
            fail_after: Some(2),
            ..Default::default()
        };
        let dispatcher = dispatcher_with(ticks(10));
        let shutdown = ShutdownFlag::new();

        let result = run(&mut connector, &mut presenter, &dispatcher, &shutdown);

        assert!(matches!(
            result,
            Err(PlaybackError::Session {
                session: 1,
                source: SessionError::Present(_),
            })
        ));
        assert_eq!(connector.stats.connects.get(), 1);
    }
}
