//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::build_data_port;
use crate::adapters::chart_svg::generate_line_chart_svg;
use crate::adapters::csv_adapter::{CsvAdapter, read_price_file};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::write_output;
use crate::adapters::svg_report_adapter::report_for_path;
use crate::domain::batch::{
    self, BatchReport, DEFAULT_END_DATE, DEFAULT_INSTRUMENTS, DEFAULT_START_DATE,
    parse_instruments,
};
use crate::domain::config_validation::validate_config;
use crate::domain::engine::{self, AnalysisOptions, CorrelationRequest, DEFAULT_REBASE_BASE};
use crate::domain::error::StockcorrError;
use crate::domain::price::PriceField;
use crate::domain::ticker::{TickerRules, parse_rules};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_REPORT_OUTPUT: &str = "correlations.html";

#[derive(Parser, Debug)]
#[command(
    name = "stockcorr",
    version,
    about = "Correlate daily stock returns with their home-market index"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Correlate every configured instrument and chart the ranking
    Batch {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Chart output (.html or .svg)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated instruments, overriding [analysis] instruments
        #[arg(long)]
        instruments: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Correlate one ticker against its index
    Correlate {
        ticker: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the rebased price chart as SVG
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Show which index a ticker is compared against
    Resolve {
        ticker: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols held by the local price source
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load a Yahoo-style CSV into the SQLite price store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Batch {
            config,
            output,
            instruments,
            start,
            end,
        } => run_batch(
            config.as_deref(),
            output.as_deref(),
            instruments.as_deref(),
            start.as_deref(),
            end.as_deref(),
        ),
        Command::Correlate {
            ticker,
            start,
            end,
            config,
            chart,
        } => run_correlate(
            &ticker,
            start.as_deref(),
            end.as_deref(),
            config.as_deref(),
            chart.as_deref(),
        ),
        Command::Resolve { ticker, config } => run_resolve(&ticker, config.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
        Command::Import {
            config,
            symbol,
            file,
        } => run_import(&config, &symbol, &file),
        Command::Serve { config } => run_serve(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StockcorrError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// Load `path` if given, otherwise an empty config so every key falls back
/// to its default.
pub fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, StockcorrError> {
    match path {
        Some(p) => load_config(p),
        None => FileConfigAdapter::from_string("").map_err(|reason| StockcorrError::ConfigParse {
            file: "<empty>".into(),
            reason,
        }),
    }
}

pub fn build_analysis_options(config: &dyn ConfigPort) -> Result<AnalysisOptions, StockcorrError> {
    let price_field = match config.get_string("data", "price_field") {
        Some(s) => s
            .parse::<PriceField>()
            .map_err(|reason| StockcorrError::ConfigInvalid {
                section: "data".into(),
                key: "price_field".into(),
                reason,
            })?,
        None => PriceField::default(),
    };

    Ok(AnalysisOptions {
        price_field,
        rebase_base: config.get_double("analysis", "rebase_base", DEFAULT_REBASE_BASE),
    })
}

pub fn build_rules(config: &dyn ConfigPort) -> Result<TickerRules, StockcorrError> {
    match config.get_string("tickers", "rules") {
        Some(s) => parse_rules(&s).map_err(|e| StockcorrError::ConfigInvalid {
            section: "tickers".into(),
            key: "rules".into(),
            reason: e.to_string(),
        }),
        None => Ok(TickerRules::default()),
    }
}

/// Command-line dates win over `[analysis]`, which wins over the defaults.
pub fn build_date_range(
    config: &dyn ConfigPort,
    start_override: Option<&str>,
    end_override: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), StockcorrError> {
    let start = start_override
        .map(str::to_string)
        .or_else(|| config.get_string("analysis", "start_date"))
        .unwrap_or_else(|| DEFAULT_START_DATE.to_string());
    let end = end_override
        .map(str::to_string)
        .or_else(|| config.get_string("analysis", "end_date"))
        .unwrap_or_else(|| DEFAULT_END_DATE.to_string());

    let start_date = engine::parse_date(&start)?;
    let end_date = engine::parse_date(&end)?;
    if start_date > end_date {
        return Err(StockcorrError::InvalidDateRange { start, end });
    }
    Ok((start_date, end_date))
}

pub fn resolve_instruments(
    instruments_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, StockcorrError> {
    let (raw, key_source) = match instruments_override {
        Some(s) => (s.to_string(), "--instruments"),
        None => match config.get_string("analysis", "instruments") {
            Some(s) => (s, "instruments"),
            None => return Ok(DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect()),
        },
    };

    parse_instruments(&raw).map_err(|e| StockcorrError::ConfigInvalid {
        section: "analysis".into(),
        key: key_source.into(),
        reason: e.to_string(),
    })
}

/// One line per instrument, in input order.
pub fn format_batch_lines(report: &BatchReport) -> Vec<String> {
    report
        .entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(r) => format!(
                "{} vs {} ({}): {}",
                entry.identifier,
                r.ticker.market,
                r.ticker.benchmark,
                entry.summary(4)
            ),
            Err(_) => format!("{}: {}", entry.identifier, entry.summary(4)),
        })
        .collect()
}

fn run_batch(
    config_path: Option<&Path>,
    output_path: Option<&Path>,
    instruments_override: Option<&str>,
    start_override: Option<&str>,
    end_override: Option<&str>,
) -> Result<(), StockcorrError> {
    let config = load_optional_config(config_path)?;
    validate_config(&config)?;

    let options = build_analysis_options(&config)?;
    let rules = build_rules(&config)?;
    let (start_date, end_date) = build_date_range(&config, start_override, end_override)?;
    let instruments = resolve_instruments(instruments_override, &config)?;
    let data_port = build_data_port(&config)?;

    let report = batch::run_batch(
        data_port.as_ref(),
        &rules,
        &instruments,
        start_date,
        end_date,
        &options,
    )?;

    println!("Correlations {} to {}", start_date, end_date);
    for line in format_batch_lines(&report) {
        println!("{line}");
    }

    let output = output_path
        .map(|p| p.display().to_string())
        .or_else(|| config.get_string("report", "output"))
        .unwrap_or_else(|| DEFAULT_REPORT_OUTPUT.to_string());
    report_for_path(&output).write(&report, &output)?;
    println!("Chart written to {}", output);

    let failed = report.failed().count();
    if failed > 0 {
        info!(failed, total = report.entries.len(), "batch finished with failures");
    }
    Ok(())
}

fn run_correlate(
    ticker: &str,
    start_override: Option<&str>,
    end_override: Option<&str>,
    config_path: Option<&Path>,
    chart_path: Option<&Path>,
) -> Result<(), StockcorrError> {
    let config = load_optional_config(config_path)?;
    validate_config(&config)?;

    let options = build_analysis_options(&config)?;
    let rules = build_rules(&config)?;
    let (start_date, end_date) = build_date_range(&config, start_override, end_override)?;
    let request = CorrelationRequest::new(ticker, start_date, end_date)?;
    let data_port = build_data_port(&config)?;

    let report = engine::analyse(data_port.as_ref(), &rules, &request, &options)?;

    println!(
        "{} vs {} ({}), {} to {}",
        report.ticker.identifier,
        report.ticker.market,
        report.ticker.benchmark,
        report.start_date,
        report.end_date
    );
    let coefficient = report
        .correlation
        .require(&report.ticker.provider_symbol, &report.ticker.benchmark)?;
    println!(
        "Correlation: {:.2} ({} paired observations)",
        coefficient,
        report.correlation.observations()
    );

    let finals: Vec<String> = report
        .rebased
        .columns()
        .iter()
        .filter_map(|c| c.last_value().map(|v| format!("{} {:.4}", c.symbol, v)))
        .collect();
    println!("Rebased at {}: {}", report.end_date, finals.join(", "));

    if let Some(path) = chart_path {
        let path = path.display().to_string();
        write_output(&path, &generate_line_chart_svg(&report.rebased))?;
        println!("Chart written to {}", path);
    }
    Ok(())
}

fn run_resolve(ticker: &str, config_path: Option<&Path>) -> Result<(), StockcorrError> {
    let config = load_optional_config(config_path)?;
    let rules = build_rules(&config)?;
    let resolved = rules.resolve(ticker)?;
    println!(
        "{} -> {} vs {} ({})",
        resolved.identifier, resolved.provider_symbol, resolved.benchmark, resolved.market
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), StockcorrError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let rules = build_rules(&config)?;
    let instruments = resolve_instruments(None, &config)?;
    let (start_date, end_date) = build_date_range(&config, None, None)?;

    eprintln!("Period: {} to {}", start_date, end_date);
    eprintln!("Instruments:");
    for id in &instruments {
        match rules.resolve(id) {
            Ok(t) => eprintln!("  {} -> {} vs {}", id, t.provider_symbol, t.benchmark),
            Err(_) => eprintln!("  {} -> not supported", id),
        }
    }
    eprintln!("Ticker rules:");
    for rule in rules.rules() {
        eprintln!("  {}", rule);
    }
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(config_path: &Path) -> Result<(), StockcorrError> {
    let config = load_config(config_path)?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| StockcorrError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            let adapter = CsvAdapter::new(PathBuf::from(&dir));
            for symbol in adapter.list_symbols()? {
                let path = Path::new(&dir).join(format!("{}.csv", symbol));
                match read_price_file(&path, &symbol) {
                    Ok(bars) => match (bars.first(), bars.last()) {
                        (Some(first), Some(last)) => println!(
                            "{}: {} rows, {} to {}",
                            symbol,
                            bars.len(),
                            first.date,
                            last.date
                        ),
                        _ => println!("{}: no rows", symbol),
                    },
                    Err(e) => eprintln!("{}: {}", symbol, e),
                }
            }
            Ok(())
        }
        "sqlite" => run_sqlite_info(&config),
        other => Err(StockcorrError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("info needs a local source, not '{}'", other),
        }),
    }
}

#[cfg(feature = "sqlite")]
fn run_sqlite_info(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    for symbol in adapter.list_symbols()? {
        match adapter.get_data_range(&symbol)? {
            Some((min_date, max_date, count)) => {
                println!("{}: {} rows, {} to {}", symbol, count, min_date, max_date)
            }
            None => println!("{}: no rows", symbol),
        }
    }
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_sqlite_info(_config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    Err(sqlite_unavailable())
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_unavailable() -> StockcorrError {
    StockcorrError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "stockcorr was built without the sqlite feature".into(),
    }
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, symbol: &str, file: &Path) -> Result<(), StockcorrError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = load_config(config_path)?;
    let symbol = symbol.trim().to_uppercase();
    let bars = read_price_file(file, &symbol)?;
    let adapter = SqliteAdapter::from_config(&config)?;
    let written = adapter.insert_bars(&bars)?;
    info!(%symbol, rows = written, "imported prices");

    match adapter.get_data_range(&symbol)? {
        Some((min_date, max_date, count)) => println!(
            "Imported {} rows for {}; store holds {} rows, {} to {}",
            written, symbol, count, min_date, max_date
        ),
        None => println!("Imported {} rows for {}", written, symbol),
    }
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _symbol: &str, _file: &Path) -> Result<(), StockcorrError> {
    Err(sqlite_unavailable())
}

#[cfg(feature = "web")]
fn run_serve(config_path: Option<&Path>) -> Result<(), StockcorrError> {
    use crate::adapters::web::{AppState, DEFAULT_LISTEN, serve};
    use crate::ports::data_port::DataPort;
    use std::sync::Arc;

    let config = load_optional_config(config_path)?;
    validate_config(&config)?;

    let data_port: Arc<dyn DataPort + Send + Sync> = Arc::from(build_data_port(&config)?);
    let listen = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());

    let state = AppState {
        data_port: Arc::clone(&data_port),
        rules: build_rules(&config)?,
        options: build_analysis_options(&config)?,
    };

    eprintln!("Starting web server on {}", listen);
    let runtime = tokio::runtime::Runtime::new()?;
    let served = runtime.block_on(serve(state, &listen));
    // the blocking HTTP client must not be dropped inside the runtime
    drop(runtime);
    drop(data_port);
    served
}

#[cfg(not(feature = "web"))]
fn run_serve(_config_path: Option<&Path>) -> Result<(), StockcorrError> {
    Err(StockcorrError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: "stockcorr was built without the web feature".into(),
    })
}
