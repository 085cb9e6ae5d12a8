//! Echo Scorer
//!
//! Extracts Echo substat rolls from OCR text of a game screenshot and scores
//! them against a character's stat-weight profile.

pub mod batch;
pub mod echo;
pub mod gamedata;
pub mod ocr;
pub mod paths;
pub mod scoring;
pub mod stats;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

pub use echo::Echo;
pub use gamedata::{CharacterProfile, GameData};
pub use ocr::{OcrParser, ParseResult, SubStat};
pub use scoring::{ConfigBundle, EvaluationResult, ScoringEngine, ScoringMethod};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("echo_scorer.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
