//! Work queue between the batch driver and the worker threads.
//!
//! Uses an unbounded std::sync::mpsc channel. The driver sends one item per
//! source text; workers share the receiver and take items in order.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// One source awaiting recognition.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Image or text file to recognize
    pub source: PathBuf,
    /// Position in the batch (1-based)
    pub index: u32,
    pub queued_at: DateTime<Local>,
}

impl BatchItem {
    pub fn new(source: PathBuf, index: u32) -> Self {
        Self {
            source,
            index,
            queued_at: Local::now(),
        }
    }
}

/// Creates a new work queue as (sender, receiver).
pub fn create_work_queue() -> (Sender<BatchItem>, Receiver<BatchItem>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_keep_order() {
        let (sender, receiver) = create_work_queue();
        for i in 1..=3 {
            sender
                .send(BatchItem::new(PathBuf::from(format!("echo_{}.txt", i)), i))
                .unwrap();
        }

        for i in 1..=3 {
            let item = receiver.recv().unwrap();
            assert_eq!(item.index, i);
            assert_eq!(item.source, PathBuf::from(format!("echo_{}.txt", i)));
        }
    }

    #[test]
    fn test_channel_closes_when_sender_dropped() {
        let (sender, receiver) = create_work_queue();
        sender.send(BatchItem::new(PathBuf::from("a.txt"), 1)).unwrap();
        drop(sender);

        assert!(receiver.recv().is_ok());
        assert!(receiver.recv().is_err());
    }
}
