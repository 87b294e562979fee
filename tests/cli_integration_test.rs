//! CLI integration tests: config helpers and whole subcommands run against
//! CSV price files on disk.

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use stockcorr::adapters::file_config_adapter::FileConfigAdapter;
use stockcorr::cli::{self, Cli};
use stockcorr::domain::batch::{DEFAULT_INSTRUMENTS, run_batch};
use stockcorr::domain::engine::AnalysisOptions;
use stockcorr::domain::error::StockcorrError;
use stockcorr::domain::price::PriceField;
use stockcorr::domain::ticker::TickerRules;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn write_prices(dir: &Path, symbol: &str, rows: &[(&str, f64)]) {
    let mut csv = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (date, close) in rows {
        csv.push_str(&format!(
            "{date},{close},{close},{close},{close},{close},1000\n"
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), csv).unwrap();
}

/// A price directory with BP.L, VOD and the FTSE, plus a config using it.
fn csv_fixture() -> (TempDir, tempfile::NamedTempFile) {
    let dir = TempDir::new().unwrap();
    write_prices(
        dir.path(),
        "BP.L",
        &[
            ("2025-01-02", 480.0),
            ("2025-01-03", 489.6),
            ("2025-01-06", 484.8),
            ("2025-01-07", 494.4),
        ],
    );
    write_prices(
        dir.path(),
        "VOD",
        &[
            ("2025-01-02", 70.0),
            ("2025-01-03", 69.0),
            ("2025-01-06", 71.0),
            ("2025-01-07", 70.0),
        ],
    );
    write_prices(
        dir.path(),
        "^FTSE",
        &[
            ("2025-01-02", 8000.0),
            ("2025-01-03", 8160.0),
            ("2025-01-06", 8080.0),
            ("2025-01-07", 8240.0),
        ],
    );

    let ini = write_temp_ini(&format!(
        "[analysis]\n\
         start_date = 2025-01-01\n\
         end_date = 2025-01-31\n\
         instruments = BP.L, VOD, XXX.ZZ\n\
         [data]\n\
         source = csv\n\
         csv_dir = {}\n",
        dir.path().display()
    ));
    (dir, ini)
}

mod config_helpers {
    use super::*;

    #[test]
    fn load_config_missing_file_is_io_error() {
        let err = cli::load_config(Path::new("/nonexistent/stockcorr.ini")).unwrap_err();
        assert!(matches!(err, StockcorrError::Io(_)));
        assert!(same_code((&err).into(), ExitCode::from(1)));
    }

    #[test]
    fn optional_config_defaults() {
        let config = cli::load_optional_config(None).unwrap();
        let options = cli::build_analysis_options(&config).unwrap();
        assert_eq!(options, AnalysisOptions::default());
        assert_eq!(cli::build_rules(&config).unwrap(), TickerRules::default());

        let (start, end) = cli::build_date_range(&config, None, None).unwrap();
        assert_eq!(start, date(2025, 1, 1));
        assert_eq!(end, date(2025, 12, 31));

        let instruments = cli::resolve_instruments(None, &config).unwrap();
        assert_eq!(instruments.len(), DEFAULT_INSTRUMENTS.len());
    }

    #[test]
    fn analysis_options_from_config() {
        let config = FileConfigAdapter::from_string(
            "[data]\nprice_field = close\n[analysis]\nrebase_base = 100\n",
        )
        .unwrap();
        let options = cli::build_analysis_options(&config).unwrap();
        assert_eq!(options.price_field, PriceField::Close);
        assert_eq!(options.rebase_base, 100.0);
    }

    #[test]
    fn bad_price_field_is_config_error() {
        let config = FileConfigAdapter::from_string("[data]\nprice_field = volume\n").unwrap();
        let err = cli::build_analysis_options(&config).unwrap_err();
        assert!(same_code((&err).into(), ExitCode::from(2)));
    }

    #[test]
    fn custom_ticker_rules() {
        let config = FileConfigAdapter::from_string(
            "[tickers]\nrules = suffix:.AX=^AXJO@ASX 200, exact:BHP=^AXJO@ASX 200\n",
        )
        .unwrap();
        let rules = cli::build_rules(&config).unwrap();
        let resolved = rules.resolve("cba.ax").unwrap();
        assert_eq!(resolved.benchmark, "^AXJO");
        assert!(rules.resolve("BP.L").is_err());
    }

    #[test]
    fn command_line_dates_override_config() {
        let config = FileConfigAdapter::from_string(
            "[analysis]\nstart_date = 2024-01-01\nend_date = 2024-12-31\n",
        )
        .unwrap();
        let (start, end) =
            cli::build_date_range(&config, Some("2024-06-01"), None).unwrap();
        assert_eq!(start, date(2024, 6, 1));
        assert_eq!(end, date(2024, 12, 31));
    }

    #[test]
    fn reversed_override_rejected() {
        let config = cli::load_optional_config(None).unwrap();
        let err = cli::build_date_range(&config, Some("2025-06-01"), Some("2025-05-01"))
            .unwrap_err();
        assert!(matches!(err, StockcorrError::InvalidDateRange { .. }));
    }

    #[test]
    fn malformed_date_override() {
        let config = cli::load_optional_config(None).unwrap();
        let err = cli::build_date_range(&config, Some("01/06/2025"), None).unwrap_err();
        assert!(matches!(err, StockcorrError::InvalidDate { .. }));
    }

    #[test]
    fn instruments_override_wins() {
        let config =
            FileConfigAdapter::from_string("[analysis]\ninstruments = VOD, BP.L\n").unwrap();
        assert_eq!(
            cli::resolve_instruments(Some("nvda"), &config).unwrap(),
            vec!["NVDA"]
        );
        assert_eq!(
            cli::resolve_instruments(None, &config).unwrap(),
            vec!["VOD", "BP.L"]
        );
        assert!(cli::resolve_instruments(Some("VOD,,BP.L"), &config).is_err());
    }
}

mod batch_output {
    use super::*;

    #[test]
    fn one_line_per_instrument() {
        let port = MockDataPort::new()
            .with_closes("BP.L", "2025-01-01", &[100.0, 102.0, 101.0])
            .with_closes("^FTSE", "2025-01-01", &[200.0, 204.0, 202.0])
            .with_bars("VOD", vec![make_bar("VOD", "2025-01-03", Some(70.0))])
            .with_error("NVDA", "timeout");
        let instruments: Vec<String> = ["BP.L", "VOD", "NVDA"].iter().map(|s| s.to_string()).collect();
        let report = run_batch(
            &port,
            &TickerRules::default(),
            &instruments,
            date(2025, 1, 1),
            date(2025, 12, 31),
            &AnalysisOptions::default(),
        )
        .unwrap();

        let lines = cli::format_batch_lines(&report);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "BP.L vs FTSE 100 (^FTSE): 1.0000");
        assert_eq!(
            lines[1],
            "VOD vs FTSE 100 (^FTSE): Not enough data to calculate correlation"
        );
        assert!(lines[2].starts_with("NVDA: "));
        assert!(lines[2].contains("timeout"));
    }
}

mod subcommands {
    use super::*;

    fn run_args(args: &[&str]) -> ExitCode {
        let mut argv = vec!["stockcorr"];
        argv.extend_from_slice(args);
        cli::run(Cli::parse_from(argv))
    }

    #[test]
    fn validate_ok() {
        let (_dir, ini) = csv_fixture();
        let code = run_args(&["validate", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_bad_source() {
        let ini = write_temp_ini("[data]\nsource = bloomberg\n");
        let code = run_args(&["validate", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn batch_writes_html_chart_despite_failures() {
        let (dir, ini) = csv_fixture();
        let output = dir.path().join("out/chart.html");

        let code = run_args(&[
            "batch",
            "-c",
            ini.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);

        assert!(same_code(code, ExitCode::SUCCESS));
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("BP.L"));
        assert!(html.contains("VOD"));
        assert!(html.contains("XXX.ZZ"));
        assert_eq!(html.matches("<rect").count(), 2);
    }

    #[test]
    fn batch_writes_svg_chart() {
        let (dir, ini) = csv_fixture();
        let output = dir.path().join("chart.svg");

        let code = run_args(&[
            "batch",
            "-c",
            ini.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--instruments",
            "BP.L",
        ]);

        assert!(same_code(code, ExitCode::SUCCESS));
        let svg = fs::read_to_string(&output).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">BP.L<"));
    }

    #[test]
    fn correlate_writes_line_chart() {
        let (dir, ini) = csv_fixture();
        let chart = dir.path().join("bp.svg");

        let code = run_args(&[
            "correlate",
            "BP.L",
            "-c",
            ini.path().to_str().unwrap(),
            "--chart",
            chart.to_str().unwrap(),
        ]);

        assert!(same_code(code, ExitCode::SUCCESS));
        let svg = fs::read_to_string(&chart).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn correlate_unsupported_exits_4() {
        let (_dir, ini) = csv_fixture();
        let code = run_args(&["correlate", "XXX.ZZ", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(4)));
    }

    #[test]
    fn correlate_without_data_exits_5() {
        let (_dir, ini) = csv_fixture();
        let code = run_args(&["correlate", "SAP.DE", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn correlate_single_day_exits_5() {
        let (_dir, ini) = csv_fixture();
        let code = run_args(&[
            "correlate",
            "BP.L",
            "-c",
            ini.path().to_str().unwrap(),
            "--start",
            "2025-01-02",
            "--end",
            "2025-01-02",
        ]);
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn correlate_flat_prices_exits_5() {
        let (dir, ini) = csv_fixture();
        write_prices(
            dir.path(),
            "SHEL.L",
            &[
                ("2025-01-02", 2500.0),
                ("2025-01-03", 2500.0),
                ("2025-01-06", 2500.0),
                ("2025-01-07", 2500.0),
            ],
        );
        let code = run_args(&["correlate", "SHEL.L", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn resolve_known_and_unknown() {
        assert!(same_code(run_args(&["resolve", "AMZN.US"]), ExitCode::SUCCESS));
        assert!(same_code(run_args(&["resolve", "XXX.ZZ"]), ExitCode::from(4)));
    }

    #[test]
    fn info_lists_csv_symbols() {
        let (_dir, ini) = csv_fixture();
        let code = run_args(&["info", "-c", ini.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn import_then_correlate_from_sqlite() {
        let (dir, _csv_ini) = csv_fixture();
        let db = dir.path().join("prices.db");
        let ini = write_temp_ini(&format!(
            "[data]\nsource = sqlite\n[sqlite]\npath = {}\n[analysis]\nstart_date = 2025-01-01\nend_date = 2025-01-31\n",
            db.display()
        ));
        let ini_path = ini.path().to_str().unwrap();

        for symbol in ["BP.L", "^FTSE"] {
            let file = dir.path().join(format!("{symbol}.csv"));
            let code = run_args(&[
                "import",
                "-c",
                ini_path,
                "--symbol",
                symbol,
                "--file",
                file.to_str().unwrap(),
            ]);
            assert!(same_code(code, ExitCode::SUCCESS));
        }

        assert!(same_code(run_args(&["info", "-c", ini_path]), ExitCode::SUCCESS));
        assert!(same_code(
            run_args(&["correlate", "BP.L", "-c", ini_path]),
            ExitCode::SUCCESS
        ));
    }
}
