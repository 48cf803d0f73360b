//! This module contains the [Dispatcher], the one queue that scheduling
//! signals ([PlaybackEvent]s) travel through on their way to the stream
//! session.

use util::channels::ChannelResult;
use util::channels::message_channel::{self, Inbox, Outbox};

/// A scheduling signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackEvent {
    /// A new frame should be rendered now.
    Tick,
    /// Playback should stop for good.
    Quit,
}

/// What happens to a tick that's sent while another one is still waiting to be
/// handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TickPolicy {
    /// The new tick is dropped, so at most one tick is ever waiting. A render
    /// step that runs long delays the next frame instead of being followed by
    /// a burst of catch-up frames.
    #[default]
    Coalesce,
    /// Every tick is queued, no matter how many are already waiting.
    Unbounded,
}

/// Merges ticks and quit requests into a single ordered queue. Events are
/// received in the order they were sent.
///
/// Producers on other threads send through an [EventSender] (see
/// [Dispatcher::sender]). The thread that owns the dispatcher can also post a
/// quit request itself with [Dispatcher::post_quit].
#[derive(Debug)]
pub struct Dispatcher {
    inbox: Inbox<PlaybackEvent>,
    local: EventSender,
}

impl Dispatcher {
    pub fn new(policy: TickPolicy) -> Self {
        let (inbox, outbox) = message_channel::with_capacity(4);
        Self {
            inbox,
            local: EventSender { outbox, policy },
        }
    }

    /// A new sender for this dispatcher's queue.
    pub fn sender(&self) -> EventSender {
        self.local.clone()
    }

    /// Queue a quit request from the thread that owns the dispatcher (e.g.
    /// because the window was closed).
    pub fn post_quit(&self) {
        // Only fails if the inbox is gone, and we're holding it.
        _ = self.local.send_quit();
    }

    /// Block until the next event arrives. If every sender is gone, no tick
    /// can ever arrive again, which reads as [PlaybackEvent::Quit].
    pub fn next_event(&self) -> PlaybackEvent {
        self.inbox.wait().unwrap_or(PlaybackEvent::Quit)
    }

    /// The next event if one is already waiting.
    pub fn try_next_event(&self) -> Option<PlaybackEvent> {
        self.inbox.check().ok().flatten()
    }
}

/// The sending half of a [Dispatcher]. Cloning it gives another sender for
/// the same queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    outbox: Outbox<PlaybackEvent>,
    policy: TickPolicy,
}

impl EventSender {
    /// Queue a tick (subject to the dispatcher's [TickPolicy]). Returns whether
    /// the tick was queued.
    ///
    /// A [ChannelError::ConnectionDropped](util::channels::ChannelError) error
    /// is returned if the dispatcher was dropped.
    pub fn send_tick(&self) -> ChannelResult<bool> {
        match self.policy {
            TickPolicy::Coalesce => self
                .outbox
                .send_unless(PlaybackEvent::Tick, |queued| *queued == PlaybackEvent::Tick)
                .map(|in_flight| in_flight.is_some()),
            TickPolicy::Unbounded => self.outbox.send(PlaybackEvent::Tick).map(|_| true),
        }
    }

    /// Queue a quit request. Quit requests are never dropped.
    pub fn send_quit(&self) -> ChannelResult<()> {
        self.outbox.send(PlaybackEvent::Quit).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn coalescing_keeps_at_most_one_tick_waiting() {
        let dispatcher = Dispatcher::new(TickPolicy::Coalesce);
        let sender = dispatcher.sender();

        assert_eq!(sender.send_tick(), Ok(true));
        assert_eq!(sender.send_tick(), Ok(false));
        assert_eq!(sender.send_tick(), Ok(false));

        assert_eq!(dispatcher.next_event(), PlaybackEvent::Tick);
        assert_eq!(dispatcher.try_next_event(), None);

        // Once the waiting tick is handled, the next one gets through again.
        assert_eq!(sender.send_tick(), Ok(true));
        assert_eq!(dispatcher.next_event(), PlaybackEvent::Tick);
    }

    #[test]
    fn unbounded_ticks_pile_up() {
        let dispatcher = Dispatcher::new(TickPolicy::Unbounded);
        let sender = dispatcher.sender();

        for _ in 0..10 {
            assert_eq!(sender.send_tick(), Ok(true));
        }

        for _ in 0..10 {
            assert_eq!(dispatcher.next_event(), PlaybackEvent::Tick);
        }
        assert_eq!(dispatcher.try_next_event(), None);
    }

    #[test]
    fn quit_is_never_coalesced_and_order_is_kept() {
        let dispatcher = Dispatcher::new(TickPolicy::Coalesce);
        let sender = dispatcher.sender();

        sender.send_tick().unwrap();
        sender.send_quit().unwrap();
        dispatcher.post_quit();
        sender.send_tick().unwrap();

        assert_eq!(dispatcher.next_event(), PlaybackEvent::Tick);
        assert_eq!(dispatcher.next_event(), PlaybackEvent::Quit);
        assert_eq!(dispatcher.next_event(), PlaybackEvent::Quit);
        assert_eq!(dispatcher.next_event(), PlaybackEvent::Tick);
    }

    #[test]
    fn events_from_another_thread_wake_the_dispatcher() {
        let dispatcher = Dispatcher::new(TickPolicy::Unbounded);
        let sender = dispatcher.sender();

        let thread = thread::spawn(move || {
            sender.send_tick().unwrap();
            sender.send_quit().unwrap();
        });

        assert_eq!(dispatcher.next_event(), PlaybackEvent::Tick);
        assert_eq!(dispatcher.next_event(), PlaybackEvent::Quit);
        thread.join().unwrap();
    }

    #[test]
    fn senders_see_a_dropped_dispatcher() {
        let dispatcher = Dispatcher::new(TickPolicy::Coalesce);
        let sender = dispatcher.sender();
        drop(dispatcher);

        assert!(sender.send_tick().is_err());
        assert!(sender.send_quit().is_err());
    }
}
