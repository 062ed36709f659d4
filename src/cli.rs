//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_INPUT_DELIMITER};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    self, INDICATORS, REINVEST, indicator_specs, parse_months, rebalance_months,
    validate_indicator_config, validate_reinvest_config,
};
use crate::domain::error::ReinvestorError;
use crate::domain::frame::DEFAULT_INDEX_NAME;
use crate::domain::indicator::{IndicatorType, OutputMode};
use crate::domain::reinvest::{ReinvestRun, simulate_frame};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::output_port::OutputPort;

#[derive(Parser, Debug)]
#[command(
    name = "reinvestor",
    about = "Technical indicators and reinvestment simulation over CSV time series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate periodic reinvestment of an equity curve
    Reinvest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        /// Comma-separated trigger months, e.g. 1,4,7,10
        #[arg(short, long)]
        months: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Compute the configured indicators over an OHLC file
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReinvestJob {
    pub input: String,
    pub output: String,
    pub rebalance_months: Vec<u32>,
    pub delimiter: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorJob {
    pub input: String,
    pub output_stem: String,
    pub indicators: Vec<IndicatorType>,
    pub delimiter: u8,
}

impl IndicatorJob {
    /// `<stem>_<slug>.csv` for one indicator.
    pub fn output_for(&self, indicator: &IndicatorType) -> String {
        format!("{}_{}.csv", self.output_stem, indicator.slug())
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Reinvest {
            config,
            input,
            output,
            months,
            dry_run,
        } => run_reinvest(
            config.as_ref(),
            input.as_deref(),
            output.as_deref(),
            months.as_deref(),
            dry_run,
        ),
        Command::Indicators {
            config,
            input,
            output,
            dry_run,
        } => run_indicators(&config, input.as_deref(), output.as_deref(), dry_run),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// `reinvest_` prefixed onto the input file name, in the input's directory.
pub fn default_reinvest_output(input: &str) -> String {
    let path = Path::new(input);
    match path.file_name() {
        Some(name) => path
            .with_file_name(format!("reinvest_{}", name.to_string_lossy()))
            .to_string_lossy()
            .into_owned(),
        None => format!("reinvest_{input}"),
    }
}

/// Output path with its `.csv` extension removed.
pub fn output_stem(path: &str) -> String {
    let p = Path::new(path);
    match p.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {
            p.with_extension("").to_string_lossy().into_owned()
        }
        _ => path.to_string(),
    }
}

fn config_delimiter(
    config: Option<&dyn ConfigPort>,
    section: &str,
) -> Result<u8, ReinvestorError> {
    match config {
        Some(c) => Ok(config_validation::delimiter(c, section)?.unwrap_or(DEFAULT_INPUT_DELIMITER)),
        None => Ok(DEFAULT_INPUT_DELIMITER),
    }
}

/// Resolves a reinvestment run from an optional config plus flag overrides.
/// Flags win over config values.
pub fn build_reinvest_job(
    config: Option<&dyn ConfigPort>,
    input: Option<&str>,
    output: Option<&str>,
    months: Option<&str>,
) -> Result<ReinvestJob, ReinvestorError> {
    if let Some(c) = config {
        validate_reinvest_config(c)?;
    }

    let input = input
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.get_string(REINVEST, "input")))
        .ok_or_else(|| ReinvestorError::ConfigMissing {
            section: REINVEST.to_string(),
            key: "input".to_string(),
        })?;

    let output = output
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.get_string(REINVEST, "output")))
        .unwrap_or_else(|| default_reinvest_output(&input));

    let rebalance_months = match (months, config) {
        (Some(raw), _) => {
            let items: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            parse_months(&items)?
        }
        (None, Some(c)) => rebalance_months(c)?,
        (None, None) => config_validation::DEFAULT_REBALANCE_MONTHS.to_vec(),
    };

    Ok(ReinvestJob {
        input,
        output,
        rebalance_months,
        delimiter: config_delimiter(config, REINVEST)?,
    })
}

pub fn build_indicator_job(
    config: &dyn ConfigPort,
    input: Option<&str>,
    output: Option<&str>,
) -> Result<IndicatorJob, ReinvestorError> {
    validate_indicator_config(config)?;

    let input = input
        .map(str::to_string)
        .or_else(|| config.get_string(INDICATORS, "input"))
        .ok_or_else(|| ReinvestorError::ConfigMissing {
            section: INDICATORS.to_string(),
            key: "input".to_string(),
        })?;

    let output_stem = output
        .map(str::to_string)
        .or_else(|| config.get_string(INDICATORS, "output"))
        .map(|o| output_stem(&o))
        .unwrap_or_else(|| output_stem(&input));

    Ok(IndicatorJob {
        input,
        output_stem,
        indicators: indicator_specs(config)?,
        delimiter: config_delimiter(Some(config), INDICATORS)?,
    })
}

/// Reads the equity file, simulates and writes the augmented table.
pub fn run_reinvest_pipeline(
    job: &ReinvestJob,
    data_port: &dyn DataPort,
    output_port: &dyn OutputPort,
) -> Result<ReinvestRun, ReinvestorError> {
    let frame = data_port.read_frame(&job.input, DEFAULT_INDEX_NAME)?;
    let (out, run) = simulate_frame(&frame, &job.rebalance_months, OutputMode::Append)?;
    output_port.write_frame(&out, &job.output)?;
    Ok(run)
}

/// Reads the OHLC file once and writes one table per indicator. Returns
/// `(indicator, destination, rows)` for every file written.
pub fn run_indicator_pipeline(
    job: &IndicatorJob,
    data_port: &dyn DataPort,
    output_port: &dyn OutputPort,
) -> Result<Vec<(IndicatorType, String, usize)>, ReinvestorError> {
    let frame = data_port.read_frame(&job.input, DEFAULT_INDEX_NAME)?;
    let mut written = Vec::with_capacity(job.indicators.len());
    for indicator in &job.indicators {
        let out = indicator.apply(&frame, OutputMode::Append)?;
        if out.is_empty() {
            log::warn!("{indicator}: no complete rows in {}", job.input);
        }
        let destination = job.output_for(indicator);
        output_port.write_frame(&out, &destination)?;
        written.push((indicator.clone(), destination, out.len()));
    }
    Ok(written)
}

fn run_reinvest(
    config_path: Option<&PathBuf>,
    input: Option<&str>,
    output: Option<&str>,
    months: Option<&str>,
    dry_run: bool,
) -> ExitCode {
    let adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => Some(a),
                Err(code) => return code,
            }
        }
        None => None,
    };

    let job = match build_reinvest_job(
        adapter.as_ref().map(|a| a as &dyn ConfigPort),
        input,
        output,
        months,
    ) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if dry_run {
        eprintln!("Input:            {}", job.input);
        eprintln!("Output:           {}", job.output);
        eprintln!("Rebalance months: {:?}", job.rebalance_months);
        eprintln!("\nDry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    let csv = CsvAdapter::new(PathBuf::new()).with_input_delimiter(job.delimiter);
    let run = match run_reinvest_pipeline(&job, &csv, &csv) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    log::info!(
        "{} periods, {} rebalances, final equity {:.4}",
        run.steps.len(),
        run.rebalance_count(),
        run.final_equity().unwrap_or(1.0)
    );
    eprintln!("Results written to: {}", job.output);
    ExitCode::SUCCESS
}

fn run_indicators(
    config_path: &Path,
    input: Option<&str>,
    output: Option<&str>,
    dry_run: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let job = match build_indicator_job(&adapter, input, output) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if dry_run {
        eprintln!("Input: {}", job.input);
        eprintln!("\nIndicators to compute:");
        for indicator in &job.indicators {
            eprintln!("  {:<22} -> {}", indicator.to_string(), job.output_for(indicator));
        }
        eprintln!("\nDry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    let csv = CsvAdapter::new(PathBuf::new()).with_input_delimiter(job.delimiter);
    match run_indicator_pipeline(&job, &csv, &csv) {
        Ok(written) => {
            for (indicator, destination, rows) in &written {
                eprintln!("  {indicator}: {rows} rows -> {destination}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
