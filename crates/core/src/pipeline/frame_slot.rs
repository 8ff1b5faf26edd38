use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::shared::frame::Frame;

/// Creates a keep-latest frame slot.
///
/// The slot holds at most one undelivered frame. Publishing while a
/// frame is pending replaces it (the stale frame is dropped and
/// counted), so the consumer always sees the newest frame next and the
/// producer never blocks behind a slow consumer.
pub fn frame_slot() -> (SlotSender, SlotReceiver) {
    let (tx, rx) = crossbeam_channel::bounded::<Frame>(1);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        SlotSender {
            tx,
            rx: rx.clone(),
            dropped: dropped.clone(),
        },
        SlotReceiver { rx, dropped },
    )
}

/// Producer half. Dropping it closes the slot; a pending frame is still
/// delivered before the receiver observes the close.
pub struct SlotSender {
    tx: crossbeam_channel::Sender<Frame>,
    rx: crossbeam_channel::Receiver<Frame>,
    dropped: Arc<AtomicU64>,
}

impl SlotSender {
    /// Publishes a frame, replacing any undelivered one.
    ///
    /// Returns `false` once the receiver is gone.
    pub fn publish(&self, frame: Frame) -> bool {
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return true,
                Err(crossbeam_channel::TrySendError::Full(f)) => {
                    // Evict the stale frame. The consumer may win this
                    // race and take it first; then nothing is dropped
                    // and the retry succeeds.
                    if self.rx.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    frame = f;
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half.
pub struct SlotReceiver {
    rx: crossbeam_channel::Receiver<Frame>,
    dropped: Arc<AtomicU64>,
}

impl SlotReceiver {
    /// Blocks for the next frame. Returns `None` once the sender is
    /// dropped and the slot is empty.
    pub fn take(&self) -> Option<Frame> {
        self.rx.recv().ok()
    }

    /// Frames discarded unprocessed so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 12], 2, 2, 3, index)
    }

    #[test]
    fn test_take_returns_published_frame() {
        let (tx, rx) = frame_slot();
        assert!(tx.publish(frame(0)));
        assert_eq!(rx.take().unwrap().index(), 0);
    }

    #[test]
    fn test_publish_replaces_pending_frame() {
        // F1 arrives, then F2 before F1 is taken: F1 is discarded
        // unprocessed and only F2 is delivered.
        let (tx, rx) = frame_slot();
        tx.publish(frame(1));
        tx.publish(frame(2));
        assert_eq!(rx.take().unwrap().index(), 2);
        assert_eq!(rx.dropped(), 1);
    }

    #[test]
    fn test_burst_keeps_only_newest() {
        let (tx, rx) = frame_slot();
        for i in 0..10 {
            tx.publish(frame(i));
        }
        assert_eq!(rx.take().unwrap().index(), 9);
        assert_eq!(rx.dropped(), 9);
    }

    #[test]
    fn test_no_drops_when_consumer_keeps_up() {
        let (tx, rx) = frame_slot();
        for i in 0..5 {
            tx.publish(frame(i));
            assert_eq!(rx.take().unwrap().index(), i);
        }
        assert_eq!(rx.dropped(), 0);
    }

    #[test]
    fn test_pending_frame_survives_sender_drop() {
        let (tx, rx) = frame_slot();
        tx.publish(frame(7));
        drop(tx);
        assert_eq!(rx.take().unwrap().index(), 7);
        assert!(rx.take().is_none());
    }

    #[test]
    fn test_take_none_after_close_when_empty() {
        let (tx, rx) = frame_slot();
        drop(tx);
        assert!(rx.take().is_none());
    }

    #[test]
    fn test_publish_false_after_receiver_drop() {
        let (tx, rx) = frame_slot();
        drop(rx);
        assert!(!tx.publish(frame(0)));
    }

    #[test]
    fn test_take_blocks_until_publish() {
        let (tx, rx) = frame_slot();
        let handle = std::thread::spawn(move || rx.take().map(|f| f.index()));
        std::thread::sleep(std::time::Duration::from_millis(20));
        tx.publish(frame(3));
        assert_eq!(handle.join().unwrap(), Some(3));
    }
}
