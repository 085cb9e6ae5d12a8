//! Batch OCR worker threads.
//!
//! Each worker takes items from the shared queue, obtains the OCR text
//! through a `TextRecognizer`, parses it and sends the result back. A failed
//! item becomes a `Failed` outcome; the worker moves on to the next one.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use super::queue::{create_work_queue, BatchItem};
use crate::ocr::{OcrParser, ParseResult};

/// Source of OCR text for one batch item.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, source: &Path) -> Result<String>;
}

/// Reads text that an external OCR engine already wrote to disk.
pub struct PlainTextRecognizer;

impl TextRecognizer for PlainTextRecognizer {
    fn recognize(&self, source: &Path) -> Result<String> {
        fs::read_to_string(source)
            .context(format!("Failed to read OCR text: {}", source.display()))
    }
}

/// Shared stop flag, checked between items.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    on_failure: bool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips on the first failed item.
    pub fn stop_on_failure() -> Self {
        Self {
            flag: Arc::default(),
            on_failure: true,
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn item_failed(&self) {
        if self.on_failure {
            self.cancel();
        }
    }
}

/// What happened to one item.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Parsed { parse: ParseResult },
    Failed { error: String },
}

/// Result of one item, attributable to its source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchItemResult {
    pub index: u32,
    pub source: PathBuf,
    pub outcome: BatchOutcome,
}

fn process_item(
    item: &BatchItem,
    recognizer: &dyn TextRecognizer,
    parser: &OcrParser,
) -> BatchOutcome {
    match recognizer.recognize(&item.source) {
        Ok(text) => {
            let parse = parser.parse(&text);
            crate::log(&format!(
                "Batch worker: item {} parsed {} substat(s), cost={}, main={}",
                item.index,
                parse.substats.len(),
                parse.cost.map(|c| c.as_str()).unwrap_or("?"),
                parse.main_stat.as_deref().unwrap_or("?")
            ));
            BatchOutcome::Parsed { parse }
        }
        Err(e) => {
            crate::log(&format!(
                "Batch worker: OCR failed for item {} ({}): {:#}",
                item.index,
                item.source.display(),
                e
            ));
            BatchOutcome::Failed {
                error: format!("{:#}", e),
            }
        }
    }
}

/// Runs the worker loop.
///
/// Processes items until the queue is closed and drained, the result
/// receiver is gone, or `cancel` is set. Blocks, so run it on its own thread.
pub fn run_worker(
    queue: &Mutex<Receiver<BatchItem>>,
    results: Sender<BatchItemResult>,
    recognizer: &dyn TextRecognizer,
    parser: &OcrParser,
    cancel: &CancelToken,
) {
    loop {
        if cancel.is_cancelled() {
            crate::log("Batch worker: cancelled");
            break;
        }

        let next = match queue.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => {
                crate::log("Batch worker: queue lock poisoned, exiting");
                break;
            }
        };
        let Ok(item) = next else {
            // Channel closed and drained
            break;
        };

        let outcome = process_item(&item, recognizer, parser);
        if matches!(outcome, BatchOutcome::Failed { .. }) {
            cancel.item_failed();
        }
        let result = BatchItemResult {
            index: item.index,
            source: item.source,
            outcome,
        };
        if results.send(result).is_err() {
            crate::log("Batch worker: result channel closed, exiting");
            break;
        }
    }
}

/// Recognizes and parses every source on `jobs` worker threads.
///
/// Results come back sorted by item index. Items not started before a
/// cancel have no result.
pub fn run_batch(
    sources: &[PathBuf],
    recognizer: &dyn TextRecognizer,
    parser: &OcrParser,
    jobs: usize,
    cancel: &CancelToken,
) -> Vec<BatchItemResult> {
    let (sender, receiver) = create_work_queue();
    for (i, source) in sources.iter().enumerate() {
        // Receiver is alive until the end of this function
        let _ = sender.send(BatchItem::new(source.clone(), i as u32 + 1));
    }
    drop(sender);

    let queue = Mutex::new(receiver);
    let (result_tx, result_rx) = channel();
    let jobs = jobs.max(1);

    crate::log(&format!(
        "Batch started: {} item(s), {} worker(s)",
        sources.len(),
        jobs
    ));

    thread::scope(|scope| {
        for _ in 0..jobs {
            let results = result_tx.clone();
            let queue = &queue;
            scope.spawn(move || run_worker(queue, results, recognizer, parser, cancel));
        }
    });
    drop(result_tx);

    let mut results: Vec<BatchItemResult> = result_rx.into_iter().collect();
    results.sort_by_key(|r| r.index);

    crate::log(&format!(
        "Batch finished: {} of {} item(s) processed",
        results.len(),
        sources.len()
    ));
    results
}
