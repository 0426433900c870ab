//! Progress channel between the engine and whoever renders it.
//!
//! The scanner, the analysis pool and the matcher hold an `EventSender`;
//! the CLI progress bars hold the `EventReceiver`. Nothing in the engine
//! waits on a listener.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::path::{Path, PathBuf};

use super::{AnalyzeEvent, AnalyzeProgress, Event, PipelineEvent, PipelinePhase, ScanEvent};

/// Engine side of the channel. Cheap to clone into rayon workers.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Events sent after the receiver is gone are dropped
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }

    pub fn phase(&self, phase: PipelinePhase) {
        self.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
    }

    /// A directory or entry the scanner could not read
    pub fn scan_error(&self, path: PathBuf, message: impl Into<String>) {
        self.send(Event::Scan(ScanEvent::Error {
            path,
            message: message.into(),
        }));
    }

    /// One more item finished analysis
    pub fn item_analyzed(&self, completed: usize, total: usize, path: &Path) {
        self.send(Event::Analyze(AnalyzeEvent::Progress(AnalyzeProgress {
            completed,
            total,
            current_path: path.to_path_buf(),
        })));
    }
}

/// Listener side of the channel
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Blocks between events and ends once every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything already sent. Call after the run returns and the sender is dropped.
    pub fn drain(self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructors for a sender/receiver pair
pub struct EventChannel;

impl EventChannel {
    /// Unbounded. A pipeline run sends a few events per library item.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }

    /// Bounded, so a slow progress display throttles the analysis pool
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }
}

/// Sender with no listener, for `Pipeline::run` and tests
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ScanProgress;
    use std::thread;

    #[test]
    fn scan_progress_crosses_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                directories_scanned: 5,
                items_found: 25,
                current_path: PathBuf::from("/media/movies"),
            })));
        });
        handle.join().unwrap();

        match receiver.recv() {
            Some(Event::Scan(ScanEvent::Progress(p))) => assert_eq!(p.items_found, 25),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn helpers_build_the_matching_events() {
        let (sender, receiver) = EventChannel::new();
        sender.phase(PipelinePhase::Matching);
        sender.scan_error(PathBuf::from("/media/locked"), "permission denied");
        sender.item_analyzed(3, 10, Path::new("/media/Heat (1995)"));
        drop(sender);

        let events = receiver.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Matching
            })
        ));
        match &events[1] {
            Event::Scan(ScanEvent::Error { path, message }) => {
                assert_eq!(path, Path::new("/media/locked"));
                assert_eq!(message, "permission denied");
            }
            other => panic!("unexpected event {other:?}"),
        }
        match &events[2] {
            Event::Analyze(AnalyzeEvent::Progress(p)) => {
                assert_eq!((p.completed, p.total), (3, 10));
                assert_eq!(p.current_path, PathBuf::from("/media/Heat (1995)"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn null_sender_discards_quietly() {
        let sender = null_sender();
        sender.phase(PipelinePhase::Scanning);
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));
    }

    #[test]
    fn bounded_channel_holds_capacity_events() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.phase(PipelinePhase::Scanning);
        sender.phase(PipelinePhase::Analyzing);

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }
}
