//! Batch processing of many Echo screenshots.
//!
//! `worker::run_batch` turns sources into parse results on worker threads;
//! `build_report` scores them, flags duplicates and sums everything up.
//! `export::export_to_json` writes the report.

pub mod export;
pub mod queue;
pub mod worker;

pub use export::export_to_json;
pub use queue::{create_work_queue, BatchItem};
pub use worker::{
    run_batch, BatchItemResult, BatchOutcome, CancelToken, PlainTextRecognizer, TextRecognizer,
};

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::echo::Echo;
use crate::gamedata::CharacterProfile;
use crate::scoring::{BatchSummary, EvaluationResult, ScoringEngine, ScoringMethod};

/// One item of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub index: u32,
    pub source: PathBuf,
    pub echo: Option<Echo>,
    pub fingerprint: Option<String>,
    /// Index of the earlier item with the same fingerprint
    pub duplicate_of: Option<u32>,
    pub evaluation: Option<EvaluationResult>,
    /// Parser auto-fill messages
    pub log: Vec<String>,
    pub error: Option<String>,
}

/// Scored batch with its summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub character: String,
    pub generated_at: String,
    pub entries: Vec<ReportEntry>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn evaluated(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.entries.iter().filter_map(|e| e.evaluation.as_ref())
    }
}

/// Scores every parsed item.
///
/// Items without a detected main stat, and failed items, are reported with
/// an error and left out of the summary. Duplicates are flagged but still
/// scored.
pub fn build_report(
    results: Vec<BatchItemResult>,
    engine: &ScoringEngine,
    profile: &CharacterProfile,
    enabled: &[ScoringMethod],
) -> BatchReport {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    let mut entries = Vec::with_capacity(results.len());

    for result in results {
        let mut entry = ReportEntry {
            index: result.index,
            source: result.source,
            echo: None,
            fingerprint: None,
            duplicate_of: None,
            evaluation: None,
            log: Vec::new(),
            error: None,
        };

        let parse = match result.outcome {
            BatchOutcome::Parsed { parse } => parse,
            BatchOutcome::Failed { error } => {
                entry.error = Some(error);
                entries.push(entry);
                continue;
            }
        };
        entry.log = parse.log.clone();

        let Some(echo) = Echo::from_parse(&parse) else {
            crate::log(&format!(
                "[item {}] Main stat not detected, skipping",
                entry.index
            ));
            entry.error = Some("Main stat not detected".to_string());
            entries.push(entry);
            continue;
        };

        let fingerprint = echo.fingerprint();
        if let Some(&first) = seen.get(&fingerprint) {
            crate::log(&format!(
                "[item {}] Duplicate Detected (same as item {})",
                entry.index, first
            ));
            entry.duplicate_of = Some(first);
        } else {
            seen.insert(fingerprint.clone(), entry.index);
        }

        entry.evaluation = Some(engine.evaluate(&echo, profile, enabled));
        entry.fingerprint = Some(fingerprint);
        entry.echo = Some(echo);
        entries.push(entry);
    }

    let summary = BatchSummary::from_results(entries.iter().filter_map(|e| e.evaluation.as_ref()));
    crate::log(&format!(
        "Batch calculation complete ({} echoes)",
        summary.count
    ));

    BatchReport {
        character: profile.name.clone(),
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        entries,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::CostTier;
    use crate::gamedata::GameData;
    use crate::ocr::{ParseResult, SubStat};
    use crate::scoring::ConfigBundle;

    fn parsed(index: u32, main: Option<&str>, crit: f64) -> BatchItemResult {
        BatchItemResult {
            index,
            source: PathBuf::from(format!("echo_{}.png", index)),
            outcome: BatchOutcome::Parsed {
                parse: ParseResult {
                    substats: vec![SubStat {
                        stat: "クリティカル率".to_string(),
                        value: crit,
                        is_percent: true,
                    }],
                    cost: Some(CostTier::Four),
                    main_stat: main.map(String::from),
                    log: vec!["OCR auto-fill: Sub1".to_string()],
                },
            },
        }
    }

    #[test]
    fn test_report() {
        let game = GameData::builtin().unwrap();
        let config = ConfigBundle::for_game(&game);
        let engine = ScoringEngine::new(&config);
        let profile = game.preset_profile("General").unwrap();

        let results = vec![
            parsed(1, Some("クリティカル率"), 8.1),
            parsed(2, None, 8.1),
            BatchItemResult {
                index: 3,
                source: PathBuf::from("echo_3.png"),
                outcome: BatchOutcome::Failed {
                    error: "unreadable".to_string(),
                },
            },
            parsed(4, Some("クリティカル率"), 8.1),
            parsed(5, Some("クリティカル率"), 10.5),
        ];
        let report = build_report(results, &engine, &profile, &ScoringMethod::ALL);

        assert_eq!(report.character, "General");
        assert_eq!(report.entries.len(), 5);
        assert_eq!(report.summary.count, 3);
        assert_eq!(report.evaluated().count(), 3);

        assert_eq!(report.entries[1].error.as_deref(), Some("Main stat not detected"));
        assert_eq!(report.entries[2].error.as_deref(), Some("unreadable"));
        assert_eq!(report.entries[3].duplicate_of, Some(1));
        assert_eq!(report.entries[4].duplicate_of, None);
        assert_eq!(report.entries[0].log, vec!["OCR auto-fill: Sub1"]);
        assert!(report.entries[3].evaluation.is_some());
    }
}
