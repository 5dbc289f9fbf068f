//! FIFO stream of scan events, one writer side per session.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::clock;
use crate::types::{LogLevel, ResultRecord, ScanEvent};

/// Create a connected sender/stream pair.
pub fn channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventStream { rx })
}

/// Writer half. Cloneable; sends never block and are dropped silently once
/// the consumer has gone away.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<ScanEvent>,
}

impl EventSender {
    /// Push a log line, prefixed with the local `[HH:MM:SS]` time.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        let text = format!("[{}] {}", clock::log_stamp(), message.as_ref());
        self.send(ScanEvent::Log { text, level });
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn progress(&self, percent: u8) {
        self.send(ScanEvent::Progress { percent });
    }

    pub fn done(&self, results: Vec<ResultRecord>) {
        self.send(ScanEvent::Done { results });
    }

    fn send(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }
}

/// Reader half, owned by the presentation layer.
#[derive(Debug)]
pub struct EventStream {
    rx: UnboundedReceiver<ScanEvent>,
}

impl EventStream {
    /// Wait for the next event. `None` once every sender is gone and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_next(&mut self) -> Option<ScanEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Everything queued right now, in order.
    pub fn drain(&mut self) -> Vec<ScanEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_and_nonblocking_drain() {
        let (tx, mut rx) = channel();
        assert!(rx.try_next().is_none());
        tx.info("hello");
        tx.progress(10);
        tx.done(Vec::new());
        let evs = rx.drain();
        assert_eq!(evs.len(), 3);
        match &evs[0] {
            ScanEvent::Log { text, level } => {
                assert!(text.ends_with("] hello"), "{text}");
                assert!(text.starts_with('['));
                assert_eq!(*level, LogLevel::Info);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(evs[1], ScanEvent::Progress { percent: 10 });
        assert!(matches!(evs[2], ScanEvent::Done { .. }));
    }

    #[test]
    fn send_after_consumer_dropped_is_ignored() {
        let (tx, rx) = channel();
        drop(rx);
        tx.info("nobody listening");
    }
}
