//! This module contains the [FrameClock], a background thread that asks for a
//! new frame at a fixed interval.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use util::drop_join_thread::{self, DropJoinHandle};
use util::shutdown::ShutdownFlag;

use crate::dispatcher::EventSender;

/// How long the clock sleeps at most before checking for quit requests again.
const POLL_SLICE: Duration = Duration::from_millis(5);

/// Sends a [Tick](crate::dispatcher::PlaybackEvent::Tick) every `interval`
/// from its own thread until it's dropped, the shutdown flag is set, a quit
/// request is forwarded, or the dispatcher goes away.
///
/// Ticks are scheduled against fixed deadlines, so a late tick doesn't push
/// every later one back. Deadlines that were missed completely are skipped
/// instead of being sent late.
///
/// Dropping the clock stops the thread and joins it.
pub struct FrameClock {
    stop: Arc<AtomicBool>,
    _thread: DropJoinHandle<()>,
}

impl FrameClock {
    /// Start the clock. `quit_pending` is checked before every tick and while
    /// waiting for the next one; when it returns `true` a quit request is
    /// forwarded right away and the clock stops.
    pub fn spawn<Q>(
        interval: Duration,
        sender: EventSender,
        shutdown: ShutdownFlag,
        quit_pending: Q,
    ) -> io::Result<Self>
    where
        Q: FnMut() -> bool + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));

        let thread = drop_join_thread::spawn_named("frame clock", {
            let stop = stop.clone();
            move || {
                Ticker {
                    interval,
                    sender,
                    shutdown,
                    quit_pending,
                    stop,
                }
                .run()
            }
        })?;

        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for FrameClock {
    fn drop(&mut self) {
        // The thread is joined after this, when `_thread` is dropped.
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Why the clock stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stopped {
    Dropped,
    Shutdown,
    QuitForwarded,
    DispatcherGone,
}

struct Ticker<Q> {
    interval: Duration,
    sender: EventSender,
    shutdown: ShutdownFlag,
    quit_pending: Q,
    stop: Arc<AtomicBool>,
}

impl<Q: FnMut() -> bool> Ticker<Q> {
    fn run(mut self) {
        let reason = self.tick_until_stopped();
        log::debug!("Frame clock stopped ({reason:?}).");
    }

    fn tick_until_stopped(&mut self) -> Stopped {
        let mut deadline = Instant::now();

        loop {
            if let Some(reason) = self.check_stop() {
                return reason;
            }

            match self.sender.send_tick() {
                Ok(true) => {}
                Ok(false) => log::trace!("Render step is behind, dropped a tick."),
                Err(_) => return Stopped::DispatcherGone,
            }

            deadline += self.interval;
            let now = Instant::now();
            if deadline < now {
                let behind = now - deadline;
                let missed = behind.as_nanos() / self.interval.as_nanos().max(1) + 1;
                log::trace!("Frame clock skipped {missed} deadline(s).");
                deadline += self.interval * missed as u32;
            }

            if let Some(reason) = self.sleep_until(deadline) {
                return reason;
            }
        }
    }

    fn sleep_until(&mut self, deadline: Instant) -> Option<Stopped> {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            thread::sleep(remaining.min(POLL_SLICE));

            if let Some(reason) = self.check_stop() {
                return Some(reason);
            }
        }
    }

    fn check_stop(&mut self) -> Option<Stopped> {
        if self.stop.load(Ordering::SeqCst) {
            return Some(Stopped::Dropped);
        }
        if self.shutdown.is_set() {
            return Some(Stopped::Shutdown);
        }
        if (self.quit_pending)() {
            return Some(match self.sender.send_quit() {
                Ok(()) => Stopped::QuitForwarded,
                Err(_) => Stopped::DispatcherGone,
            });
        }
        None
    }
}
