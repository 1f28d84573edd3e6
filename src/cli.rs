//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::config_validation::{Settings, validate_config};
use crate::domain::error::ScreenerError;
use crate::domain::history::load_series;
use crate::domain::period::{Interval, Period};
use crate::domain::screen::{Criterion, ScreenParams, ScreeningSession, screen};
use crate::domain::statistic::{Statistic, StatisticKind, compute};
use crate::ports::history_port::HistoryRequest;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "barscreen", about = "Intraday bar statistics and stock screening")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute one statistic for a symbol
    Stat {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// FirstN, VolRSI, SimpleRSI, Gobo or HourlyChg
        #[arg(short, long)]
        what: String,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        interval: Option<String>,
        /// Bars per session (FirstN, Gobo)
        #[arg(long)]
        n: Option<usize>,
        /// Oscillator window
        #[arg(long)]
        window: Option<usize>,
    },
    /// Screen symbols against a criterion
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        criterion: Option<String>,
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// File with one symbol per line
        #[arg(long)]
        symbols_file: Option<PathBuf>,
        #[arg(long)]
        max_age: Option<u32>,
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Report directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write passing symbols here, one per line
        #[arg(long)]
        shortlist: Option<PathBuf>,
    },
    /// List screening criteria
    Criteria,
    /// List symbols with history files for an interval
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value = "1d")]
        interval: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Stat {
            config,
            symbol,
            what,
            period,
            interval,
            n,
            window,
        } => run_stat(
            &config,
            &symbol,
            &what,
            period.as_deref(),
            interval.as_deref(),
            n,
            window,
        ),
        Command::Screen {
            config,
            criterion,
            symbols,
            symbols_file,
            max_age,
            jobs,
            output,
            shortlist,
        } => run_screen(
            &config,
            ScreenArgs {
                criterion,
                symbols,
                symbols_file,
                max_age,
                jobs,
                output,
                shortlist,
            },
        ),
        Command::Criteria => {
            run_criteria();
            Ok(())
        }
        Command::ListSymbols { config, interval } => run_list_symbols(&config, &interval),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, ScreenerError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)
}

fn run_stat(
    config_path: &Path,
    symbol: &str,
    what: &str,
    period: Option<&str>,
    interval: Option<&str>,
    n: Option<usize>,
    window: Option<usize>,
) -> Result<(), ScreenerError> {
    let settings = load_settings(config_path)?;
    let kind: StatisticKind = what.parse()?;
    let statistic = Statistic::new(kind, Some(n.unwrap_or(settings.n)))?;

    let (period, interval) = match period {
        Some(p) => {
            let p: Period = p.parse()?;
            let i = match interval {
                Some(i) => i.parse()?,
                None => p.default_interval(),
            };
            (p, i)
        }
        None => {
            let i: Interval = match interval {
                Some(i) => i.parse()?,
                None => settings.interval,
            };
            (settings.period, i)
        }
    };

    let mut rsi = settings.rsi;
    if let Some(w) = window {
        if w < 2 {
            return Err(ScreenerError::invalid("window", &w.to_string(), "must be at least 2"));
        }
        rsi.window = w;
    }
    let rsi = (kind != StatisticKind::HourlyChg).then_some(rsi);

    let port = CsvAdapter::new(settings.data_dir()?.to_path_buf());
    let request = HistoryRequest::new(symbol, period, interval);
    let series = load_series(&port, &request, rsi).ok_or_else(|| ScreenerError::NoData {
        symbol: symbol.to_string(),
        period: period.to_string(),
        interval: interval.to_string(),
    })?;

    let result = compute(&statistic, &series);
    println!("{result}");
    Ok(())
}

struct ScreenArgs {
    criterion: Option<String>,
    symbols: Vec<String>,
    symbols_file: Option<PathBuf>,
    max_age: Option<u32>,
    jobs: Option<usize>,
    output: Option<PathBuf>,
    shortlist: Option<PathBuf>,
}

fn run_screen(config_path: &Path, args: ScreenArgs) -> Result<(), ScreenerError> {
    let settings = load_settings(config_path)?;
    let criterion: Criterion = match &args.criterion {
        Some(c) => c.parse()?,
        None => settings.criterion,
    };
    let port = CsvAdapter::new(settings.data_dir()?.to_path_buf());

    let mut symbols = if args.symbols.is_empty() {
        settings.symbols.clone()
    } else {
        args.symbols.clone()
    };
    if let Some(file) = args.symbols_file.as_ref().or(settings.symbols_file.as_ref()) {
        symbols.extend(read_symbols_file(file)?);
    }
    if symbols.is_empty() {
        symbols = port.list_symbols("1d")?;
        info!(count = symbols.len(), "screening every symbol with daily history");
    }

    let params = ScreenParams {
        max_age: args.max_age.or(settings.max_age),
        jobs: args.jobs.unwrap_or(settings.jobs),
        ..ScreenParams::default()
    };

    let mut session = ScreeningSession::new();
    let passed = screen(&mut session, &port, symbols.as_slice(), criterion, &params)?;

    println!("=== Screen: {} ===", criterion);
    println!("{}", session.summary());
    println!("PASS Symbols ({}) = {:?}", passed.len(), passed);

    if session.is_empty() {
        eprintln!("No stats or results to export.");
    } else {
        let dir = args.output.unwrap_or(settings.report_dir);
        let path = TextReportAdapter::new().write_dated(
            &session,
            &dir,
            &settings.report_name,
            params.as_of,
        )?;
        eprintln!("Exported results to '{}'.", path.display());
    }

    if let Some(path) = args.shortlist {
        write_symbols_file(&path, &passed)?;
        eprintln!("Screened symbols written to '{}'.", path.display());
    }
    Ok(())
}

fn run_criteria() {
    for criterion in Criterion::ALL {
        println!("{}", criterion);
        for line in criterion.description().lines() {
            println!("  {}", line);
        }
    }
}

fn run_list_symbols(config_path: &Path, interval: &str) -> Result<(), ScreenerError> {
    let settings = load_settings(config_path)?;
    let interval: Interval = interval.parse()?;
    let port = CsvAdapter::new(settings.data_dir()?.to_path_buf());
    for symbol in port.list_symbols(&interval.to_string())? {
        println!("{}", symbol);
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ScreenerError> {
    eprintln!("Validating config: {}", config_path.display());
    let settings = load_settings(config_path)?;
    eprintln!("  history:   period={} interval={}", settings.period, settings.interval);
    eprintln!(
        "  indicator: rsi_window={} rsi_scope={:?}",
        settings.rsi.window, settings.rsi.scope
    );
    eprintln!("  screen:    criterion={} jobs={}", settings.criterion, settings.jobs);
    if settings.criterion == Criterion::MaxAge && settings.max_age.is_none() {
        return Err(ScreenerError::ConfigMissing {
            section: "screen".to_string(),
            key: "max_age".to_string(),
        });
    }
    eprintln!("Config is valid.");
    Ok(())
}

/// One symbol per line; blank lines and `#` comments are ignored.
pub fn read_symbols_file(path: &Path) -> Result<Vec<String>, ScreenerError> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub fn write_symbols_file(path: &Path, symbols: &[String]) -> Result<(), ScreenerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = symbols.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
