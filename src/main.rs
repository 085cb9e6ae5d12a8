//! Echo Scorer
//!
//! Command-line front end: parses OCR text of Echo screenshots and scores
//! the Echoes for a character.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use echo_scorer::batch::{self, CancelToken, PlainTextRecognizer};
use echo_scorer::echo::CostTier;
use echo_scorer::ocr::AliasIndex;
use echo_scorer::scoring::rating::method_label;
use echo_scorer::{
    log, paths, CharacterProfile, ConfigBundle, Echo, EvaluationResult, GameData, OcrParser,
    ParseResult, ScoringEngine, ScoringMethod,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Game tables (max rolls, aliases, presets). Defaults to data/game_data.json or the builtin tables.
    #[arg(global = true, long)]
    game_data: Option<PathBuf>,

    /// Calculation config. Defaults to data/calculation_config.json.
    #[arg(global = true, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse OCR text and print the detected stats
    Parse {
        /// OCR text file, or - for stdin
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Parse OCR text and score the Echo
    Evaluate(EvaluateArgs),
    /// Parse and score many OCR text files
    Batch(BatchArgs),
    /// Write the default calculation config
    InitConfig {
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Preset or saved character profile name
    #[arg(short, long, default_value = "General")]
    character: String,

    /// Character profile JSON file (overrides --character)
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Scoring methods to run (normalized, ratio, roll, effective, cv)
    #[arg(long, value_delimiter = ',', default_value = "normalized,ratio,roll,effective,cv")]
    methods: Vec<String>,

    /// Scoring methods to skip
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// OCR text file, or - for stdin
    input: PathBuf,

    #[command(flatten)]
    profile: ProfileArgs,

    /// Cost tier when OCR missed it (1, 3 or 4)
    #[arg(long)]
    cost: Option<String>,

    /// Main stat when OCR missed it
    #[arg(long)]
    main: Option<String>,

    /// OCR text of the currently equipped Echo to compare against
    #[arg(long)]
    equipped: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// OCR text files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    profile: ProfileArgs,

    /// Worker threads
    #[arg(short, long, default_value_t = 2)]
    jobs: usize,

    /// Write the report as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop handing out items after the first unreadable input
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("echo_scorer.log");
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            use std::io::Write;
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    // Ensure output directories exist
    paths::ensure_directories()?;

    let cli = Cli::parse();

    let game = load_game_data(cli.game_data.as_deref())?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| paths::get_data_dir().join("calculation_config.json"));

    match cli.command {
        Commands::Parse { input, json } => {
            let index = AliasIndex::new(&game.stat_aliases);
            let parser = OcrParser::new(&index, &game)?;
            let result = parser.parse(&read_input(&input)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_parse(&result);
            }
        }
        Commands::Evaluate(args) => {
            let config = ConfigBundle::load(&config_path, &game.substat_max_values);
            run_evaluate(&game, &config, args)?;
        }
        Commands::Batch(args) => {
            let config = ConfigBundle::load(&config_path, &game.substat_max_values);
            run_batch(&game, &config, args)?;
        }
        Commands::InitConfig { output } => {
            ConfigBundle::save_default(&output)?;
            log(&format!("Default config written to {}", output.display()));
        }
    }

    Ok(())
}

/// Explicit path, then data/game_data.json next to the executable, then the builtin tables.
fn load_game_data(path: Option<&Path>) -> Result<GameData> {
    if let Some(path) = path {
        return GameData::load(path);
    }
    let bundled = paths::get_data_dir().join("game_data.json");
    if bundled.exists() {
        match GameData::load(&bundled) {
            Ok(data) => return Ok(data),
            Err(e) => log(&format!("Warning: {:#}. Using builtin game data.", e)),
        }
    }
    GameData::builtin()
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read OCR text from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).context(format!("Failed to read OCR text: {}", path.display()))
}

/// Explicit profile file, then a saved profile, then the game data presets.
fn load_profile(args: &ProfileArgs, game: &GameData) -> Result<CharacterProfile> {
    if let Some(path) = &args.profile {
        return CharacterProfile::load(path);
    }
    let saved = paths::get_profiles_dir().join(format!("{}.json", args.character));
    if saved.exists() {
        return CharacterProfile::load(&saved);
    }
    game.preset_profile(&args.character)
        .ok_or_else(|| anyhow!("Unknown character: {}", args.character))
}

fn selected_methods(args: &ProfileArgs) -> Result<Vec<ScoringMethod>> {
    let parse = |names: &[String]| -> Result<Vec<ScoringMethod>> {
        names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| ScoringMethod::from_name(n).ok_or_else(|| anyhow!("Unknown scoring method: {}", n)))
            .collect()
    };
    let disabled = parse(&args.disable)?;
    let mut methods = parse(&args.methods)?;
    methods.retain(|m| !disabled.contains(m));
    methods.sort();
    methods.dedup();
    Ok(methods)
}

/// Returns None after warning the user when no method is enabled.
fn require_methods(args: &ProfileArgs) -> Result<Option<Vec<ScoringMethod>>> {
    let methods = selected_methods(args)?;
    if methods.is_empty() {
        log("Warning: 計算方法が1つも選択されていません。少なくとも1つ有効にしてください");
        return Ok(None);
    }
    Ok(Some(methods))
}

fn echo_from_text(
    parser: &OcrParser,
    text: &str,
    cost: Option<CostTier>,
    main: Option<&str>,
) -> Result<Echo> {
    let mut parse = parser.parse(text);
    for line in &parse.log {
        log(line);
    }
    if let Some(cost) = cost {
        parse.cost = Some(cost);
    }
    if let Some(main) = main {
        parse.main_stat = Some(main.to_string());
    }
    Echo::from_parse(&parse)
        .ok_or_else(|| anyhow!("メインステータスが検出されませんでした。--main で指定してください"))
}

fn run_evaluate(game: &GameData, config: &ConfigBundle, args: EvaluateArgs) -> Result<()> {
    let Some(methods) = require_methods(&args.profile)? else {
        return Ok(());
    };
    let profile = load_profile(&args.profile, game)?;

    let cost = match args.cost.as_deref().map(str::trim) {
        Some(c) => {
            let mut chars = c.chars();
            let tier = match (chars.next(), chars.next()) {
                (Some(d), None) => CostTier::from_digit(d),
                _ => None,
            };
            Some(tier.ok_or_else(|| anyhow!("Invalid cost: {}", c))?)
        }
        None => None,
    };

    let index = AliasIndex::new(&game.stat_aliases);
    let parser = OcrParser::new(&index, game)?;
    let echo = echo_from_text(&parser, &read_input(&args.input)?, cost, args.main.as_deref())?;
    log(&format!(
        "Evaluating Echo - Cost: {}, Main: {}, Substats: {:?}",
        echo.cost.map(|c| c.as_str()).unwrap_or("?"),
        echo.main_stat,
        echo.substats
    ));

    let engine = ScoringEngine::new(config);
    let result = match &args.equipped {
        Some(path) => {
            let equipped = echo_from_text(&parser, &read_input(path)?, None, None)
                .context("Failed to read the equipped Echo")?;
            engine.compare(&echo, &equipped, &profile, &methods)
        }
        None => engine.evaluate(&echo, &profile, &methods),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", echo);
        print_evaluation(&profile.name, &result);
    }
    Ok(())
}

fn run_batch(game: &GameData, config: &ConfigBundle, args: BatchArgs) -> Result<()> {
    let Some(methods) = require_methods(&args.profile)? else {
        return Ok(());
    };
    let profile = load_profile(&args.profile, game)?;

    let index = AliasIndex::new(&game.stat_aliases);
    let parser = OcrParser::new(&index, game)?;
    let cancel = if args.fail_fast {
        CancelToken::stop_on_failure()
    } else {
        CancelToken::new()
    };
    let results = batch::run_batch(
        &args.inputs,
        &PlainTextRecognizer,
        &parser,
        args.jobs,
        &cancel,
    );
    if cancel.is_cancelled() {
        println!(
            "読み込みに失敗したため中断しました（{} / {} 件処理済み）",
            results.len(),
            args.inputs.len()
        );
    }

    let engine = ScoringEngine::new(config);
    let report = batch::build_report(results, &engine, &profile, &methods);

    for entry in &report.entries {
        match (&entry.evaluation, &entry.error) {
            (Some(eval), _) => println!(
                "#{:<3} {:<30} {:>6.2}%  {:<3} {}{}",
                entry.index,
                entry.source.display(),
                eval.total_score,
                eval.rating,
                eval.recommendation.label(),
                match entry.duplicate_of {
                    Some(first) => format!("  (#{}と重複)", first),
                    None => String::new(),
                }
            ),
            (None, Some(error)) => {
                println!("#{:<3} {:<30} エラー: {}", entry.index, entry.source.display(), error)
            }
            (None, None) => {}
        }
    }

    let summary = &report.summary;
    if summary.count == 0 {
        println!("No data available.");
    } else {
        println!(
            "\n{} / {} 件  平均 {:.2}%  合計 {:.2}",
            summary.count,
            report.entries.len(),
            summary.total_average,
            summary.total_sum
        );
        for (method, avg) in &summary.method_averages {
            println!("  {:<10} 平均 {:.2}", method, avg);
        }
    }

    if let Some(output) = &args.output {
        batch::export_to_json(&report, output)?;
        log(&format!("Report written to {}", output.display()));
    }

    if summary.count == 0 && !args.inputs.is_empty() {
        bail!("No Echo could be evaluated");
    }
    Ok(())
}

fn print_parse(result: &ParseResult) {
    println!(
        "Cost: {}",
        result.cost.map(|c| c.as_str()).unwrap_or("?")
    );
    println!("Main: {}", result.main_stat.as_deref().unwrap_or("?"));
    for sub in &result.substats {
        println!(
            "  {}: {}{}",
            sub.stat,
            sub.value,
            if sub.is_percent { "%" } else { "" }
        );
    }
    for line in &result.log {
        println!("{}", line);
    }
}

fn print_evaluation(character: &str, result: &EvaluationResult) {
    println!("\n[{}] 達成率 {:.2}%  評価 {}  {}", character, result.total_score, result.rating, result.recommendation.label());
    if result.penalty < 1.0 {
        println!("  (補正前 {:.2}% × {})", result.achievement_rate, result.penalty);
    }
    if let Some(diff) = result.comparison_diff {
        println!("  装備中との差: {:+.2}", diff);
    }
    if let Some(msg) = &result.consistency_advice {
        println!("  {}", msg);
    }

    for (method, score) in &result.individual_scores {
        println!(
            "  {:<10} {:>7.2}  {}",
            method,
            score,
            method_label(*method, *score, result.effective_count)
        );
    }
    println!("  有効ステータス数: {}", result.effective_count);

    for (stat, value) in &result.estimated_stats {
        println!("  {}: {:.1}", stat, value);
    }
    for advice in &result.advice {
        println!("  * {}", advice);
    }
}
