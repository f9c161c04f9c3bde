//! Operator binary: runs poll cycles over raw row dumps, trains the
//! delay predictor on accumulated history, and prunes old records.

pub mod config;

use clap::{Arg, App, SubCommand, AppSettings};
use failure::format_err;
use log::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use vspt_rechner::{DelayCalculator, TimeNormalizer};
use vspt_rechner::ingest;
use vspt_schaetzer::DelayPredictor;
use vspt_sqlite::{r2d2, VsptConnectionManager};
use vspt_util::ConfigExt;
use vspt_verlauf::{HistoryWriter, SqliteHistoryStore};
use vspt_verlauf::types::MIGRATIONS;

use crate::config::Config;

type Result<T> = ::std::result::Result<T, failure::Error>;

fn open_store(cfg: &Config) -> Result<SqliteHistoryStore> {
    let manager = VsptConnectionManager::initialize(&cfg.database_path, &MIGRATIONS)?;
    let pool = r2d2::Pool::new(manager)?;
    Ok(SqliteHistoryStore::new(pool))
}

fn fmt_time(time: Option<chrono::NaiveTime>) -> String {
    time.map(TimeNormalizer::canonical).unwrap_or_else(|| "--:--".into())
}

/// One poll cycle: normalize raw rows, predict, record into history.
fn run_cycle(cfg: &Config, input: &str) -> Result<()> {
    let file = BufReader::new(File::open(input)?);
    let rows: Vec<HashMap<String, String>> = serde_json::from_reader(file)?;
    info!("read {} raw rows from {}", rows.len(), input);

    let normalizer = TimeNormalizer::new();
    let calc = DelayCalculator::new();
    let records = ingest::parse_rows(&normalizer, &calc, &rows);
    if records.is_empty() {
        warn!("no usable records in this cycle");
        return Ok(());
    }

    let mut predictor = DelayPredictor::new(&cfg.model_path);
    let predictions = predictor.predict(&records);

    println!("{:<24} {:<6} {:>6} {:>6} {:>7} {:>10} {:>10}",
             "train", "stn", "wtt", "just", "delay", "status", "predicted");
    for (rec, pred) in records.iter().zip(&predictions) {
        println!("{:<24} {:<6} {:>6} {:>6} {:>7} {:>10} {:>10}",
                 rec.train_name, rec.station,
                 fmt_time(rec.scheduled_time), fmt_time(rec.actual_time),
                 rec.delay_minutes.map(|d| format!("{:+}", d)).unwrap_or_else(|| "N/A".into()),
                 rec.running_status.as_str(), pred);
    }

    let store = open_store(cfg)?;
    let writer = HistoryWriter::new(&store);
    if !writer.record_cycle(&records) {
        warn!("cycle was not recorded to history");
    }
    Ok(())
}

/// Rebuilds training records from stored history and trains the model.
/// Unlike the polling path, failures here are loud.
fn train(cfg: &Config) -> Result<()> {
    let store = open_store(cfg)?;
    let history = store.recent_history(cfg.history_days)?;
    info!("training from {} history rows ({} days)", history.len(), cfg.history_days);
    let records: Vec<_> = history.iter().map(|h| h.to_tracking()).collect();
    let mut predictor = DelayPredictor::new(&cfg.model_path);
    let report = predictor.train(&records)
        .map_err(|e| format_err!("training failed: {}", e))?;
    println!("trained on {} rows (train R2 {:.3}, test R2 {:.3} over {} held-out rows)",
             report.n_train, report.train_r2, report.test_r2, report.n_test);
    Ok(())
}

fn cleanup(cfg: &Config, days: i64) -> Result<()> {
    let store = open_store(cfg)?;
    let removed = store.cleanup_old_records(days)?;
    println!("removed {} history rows older than {} days", removed, days);
    Ok(())
}

fn main() -> Result<()> {
    vspt_util::setup_logging()?;
    let matches = App::new("vspt-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Train delay tracking: poll cycles, model training, history upkeep.")
        .setting(AppSettings::SubcommandRequired)
        .subcommand(SubCommand::with_name("run")
                    .about("Process one poll cycle of raw rows.")
                    .arg(Arg::with_name("input")
                         .short("i")
                         .long("input")
                         .value_name("FILE")
                         .help("JSON file containing an array of raw row objects.")
                         .takes_value(true)
                         .required(true)))
        .subcommand(SubCommand::with_name("train")
                    .about("Train the delay predictor on recent history."))
        .subcommand(SubCommand::with_name("cleanup")
                    .about("Remove history older than the retention window.")
                    .arg(Arg::with_name("days")
                         .short("d")
                         .long("days")
                         .value_name("DAYS")
                         .help("Days of history to keep.")
                         .takes_value(true)))
        .get_matches();

    info!("loading config");
    let cfg = Config::load()?;
    match matches.subcommand() {
        ("run", Some(opts)) => {
            let input = opts.value_of("input").unwrap();
            run_cycle(&cfg, input)
        },
        ("train", _) => train(&cfg),
        ("cleanup", Some(opts)) => {
            let days = match opts.value_of("days") {
                Some(d) => d.parse()
                    .map_err(|_| format_err!("--days must be an integer"))?,
                None => cfg.history_days
            };
            cleanup(&cfg, days)
        },
        _ => unreachable!()
    }
}
