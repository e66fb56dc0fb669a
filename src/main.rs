use crate::options::{Args, RateArgs};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

mod options {
    use std::path::PathBuf;

    #[derive(Debug, clap::Parser)]
    #[command(name = "rtool", about = "A tool to turn exported exchange rate sheets into ERP import tables")]
    pub enum Args {
        /// Expand rates per country into one rate per company, grouped by currency.
        Company {
            #[clap(flatten)]
            rates: RateArgs,
            /// The file to write the table to, or stdout if unset.
            #[clap(long, short = 'o')]
            output: Option<PathBuf>,
        },
        /// Write the rates of all currencies quoted against a single settlement currency.
        Consolidate {
            #[clap(flatten)]
            rates: RateArgs,
            /// The currency all rates are quoted against, like USD.
            #[clap(long, short = 't')]
            target: String,
            /// The file to write the table to, or stdout if unset.
            #[clap(long, short = 'o')]
            output: Option<PathBuf>,
        },
        /// Write the per-company table and one consolidation table per target into a directory.
        ///
        /// No file is written if any of the tables can't be computed.
        Export {
            #[clap(flatten)]
            rates: RateArgs,
            /// The settlement currencies to write consolidation tables for.
            #[clap(long = "target", short = 't', default_values_t = ["USD".to_string(), "AED".to_string()])]
            targets: Vec<String>,
            /// The directory to write all tables into.
            #[clap(long, short = 'O')]
            out_dir: PathBuf,
        },
        /// Write one table per country, grouped by target currency, into a directory.
        ByCountry {
            #[clap(flatten)]
            rates: RateArgs,
            /// The directory to write all tables into.
            #[clap(long, short = 'O')]
            out_dir: PathBuf,
        },
        /// Rewrite date-like headers like `9/9/2020` into the `DD.MM.YYYY` form the other commands expect.
        NormalizeHeaders {
            #[clap(long, short = 'd', default_value = ",")]
            delimiter: char,
            /// The file to write the normalized CSV to, or stdout if unset.
            #[clap(long, short = 'o')]
            output: Option<PathBuf>,
            /// The CSV file with headers to normalize.
            csv_file: PathBuf,
        },
        /// Print the built-in configuration as RON, to be edited and passed with `--config`.
        DefaultConfig,
    }

    #[derive(Debug, clap::Args)]
    pub struct RateArgs {
        /// A RON file with the date range, column aliases, currencies and company mapping to use.
        #[clap(long, short = 'c')]
        pub config: Option<PathBuf>,
        /// The first date to export, inclusive, as DD.MM.YYYY. Overrides the configuration.
        #[clap(long)]
        pub from: Option<String>,
        /// The last date to export, inclusive, as DD.MM.YYYY. Overrides the configuration.
        #[clap(long)]
        pub to: Option<String>,
        #[clap(long, short = 'd', default_value = ",")]
        pub delimiter: char,
        /// The character separating the fractional digits of rates.
        #[clap(long, default_value = ".")]
        pub decimal_separator: char,
        /// Round rates to this many fractional digits, ties to even.
        #[clap(long, short = 'r', value_parser = clap::value_parser!(u32).range(0..=rtool::MAX_ROUND_DIGITS as i64))]
        pub round: Option<u32>,
        /// One or more CSV sheets with a country, a from and a to currency column and one column per date.
        ///
        /// Rows of later sheets win over those of earlier ones.
        #[clap(required = true)]
        pub csv_file: Vec<PathBuf>,
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = options::Args::parse();
    match args {
        Args::Company { rates, output } => {
            let (csv_file, options) = rate_options(rates, None)?;
            let outcome = with_output(output.as_deref(), |out| {
                Ok(rtool::company_rates(into_read(csv_file)?, out, options)?)
            })?;
            summary(output.as_deref(), &outcome);
        }
        Args::Consolidate {
            rates,
            target,
            output,
        } => {
            let (csv_file, options) = rate_options(rates, None)?;
            let outcome = with_output(output.as_deref(), |out| {
                Ok(rtool::consolidation_rates(
                    into_read(csv_file)?,
                    &target,
                    out,
                    options,
                )?)
            })?;
            summary(output.as_deref(), &outcome);
        }
        Args::Export {
            rates,
            targets,
            out_dir,
        } => {
            let (csv_file, options) = rate_options(rates, Some(2))?;
            let targets: Vec<_> = targets.iter().map(String::as_str).collect();
            let tables = rtool::export(into_read(csv_file)?, &targets, options)?;
            write_tables(&out_dir, &tables)?;
        }
        Args::ByCountry { rates, out_dir } => {
            let (csv_file, options) = rate_options(rates, None)?;
            let tables = rtool::by_country(into_read(csv_file)?, options)?;
            write_tables(&out_dir, &tables)?;
        }
        Args::NormalizeHeaders {
            delimiter,
            output,
            csv_file,
        } => {
            let outcome = with_output(output.as_deref(), |out| {
                let csv = std::fs::File::open(&csv_file).with_context(|| {
                    format!("Could not read from CSV file at '{}'", csv_file.display())
                })?;
                Ok(rtool::normalize_headers(
                    std::io::BufReader::new(csv),
                    out,
                    rtool::normalize_headers::Options { delimiter },
                )?)
            })?;
            eprintln!(
                "Normalized {} headers into dates, {} rows written to {}",
                outcome.rewritten,
                outcome.rows,
                display_output(output.as_deref())
            );
        }
        Args::DefaultConfig => {
            println!("{}", rtool::Config::default().to_ron()?);
        }
    };
    Ok(())
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_module("rtool", log::LevelFilter::Info);
    }
    builder.format_timestamp_millis().init();
}

fn rate_options(
    options::RateArgs {
        config,
        from,
        to,
        delimiter,
        decimal_separator,
        round,
        csv_file,
    }: RateArgs,
    default_round: Option<u32>,
) -> anyhow::Result<(Vec<PathBuf>, rtool::rates::Options)> {
    let config = config
        .map(|path| {
            rtool::Config::load(&path)
                .with_context(|| format!("Could not load configuration from '{}'", path.display()))
        })
        .transpose()?
        .unwrap_or_default();
    Ok((
        csv_file,
        rtool::rates::Options {
            config,
            date_from: from,
            date_to: to,
            delimiter,
            decimal_separator,
            round: round.or(default_round),
        },
    ))
}

/// Run `f` with a writer for `output`, or stdout. The output file is only created once `f` succeeded.
fn with_output<T>(
    output: Option<&Path>,
    f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut buf = Vec::new();
    let res = f(&mut buf)?;
    match output {
        Some(path) => std::fs::write(path, &buf)
            .with_context(|| format!("Could not write output to '{}'", path.display()))?,
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&buf)?;
            stdout.flush()?;
        }
    }
    Ok(res)
}

fn write_tables(out_dir: &Path, tables: &[rtool::rates::Table]) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Could not create output directory '{}'", out_dir.display()))?;
    for table in tables {
        let path = out_dir.join(&table.name);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Could not create '{}'", path.display()))?;
        table
            .write(std::io::BufWriter::new(file))
            .with_context(|| format!("Could not write table to '{}'", path.display()))?;
        summary(Some(&path), &table.outcome);
    }
    Ok(())
}

fn summary(output: Option<&Path>, outcome: &rtool::rates::Outcome) {
    eprintln!(
        "Saved {} rows in {} currency blocks to {} ({} input rows, {} skipped)",
        outcome.rows,
        outcome.blocks,
        display_output(output),
        outcome.input_rows,
        outcome.skipped.rows()
    );
}

fn display_output(output: Option<&Path>) -> String {
    output
        .map(|path| format!("'{}'", path.display()))
        .unwrap_or_else(|| "stdout".into())
}

fn into_read(file_paths: Vec<PathBuf>) -> anyhow::Result<impl Iterator<Item = impl std::io::Read>> {
    Ok(file_paths
        .iter()
        .map(|p| {
            std::fs::read(p)
                .with_context(|| format!("Could not read from CSV file at '{}'", p.display()))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(std::io::Cursor::new))
}
