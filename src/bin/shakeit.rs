//! ShakeIt CLI - Command-line interface for ShakeIt Core
//!
//! Commands:
//! - replay: Replay a captured session into resolution reports (batch mode)
//! - run: Process records from stdin as they arrive (streaming mode)
//! - validate: Validate sensor record schema
//! - doctor: Diagnose configuration and environment
//! - schema: Print schema information

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use shakeit_core::encoder::{ResolutionEncoder, ResolutionReport};
use shakeit_core::schema::{SensorEventAdapter, SensorRecord, SCHEMA_VERSION};
use shakeit_core::{ShakeConfig, ShakeProcessor, PRODUCER_NAME, SHAKEIT_VERSION};

/// ShakeIt - Directional shake detection from accelerometer streams
#[derive(Parser)]
#[command(name = "shakeit")]
#[command(author = "Bit Rhythmic Inc")]
#[command(version = SHAKEIT_VERSION)]
#[command(about = "Detect directional shake gestures in accelerometer data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Detector settings shared by the processing commands
#[derive(clap::Args)]
struct DetectorArgs {
    /// Load configuration from a JSON file (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of active axes (2 or 3)
    #[arg(long)]
    axes: Option<u8>,

    /// Noise threshold; values strictly above pass
    #[arg(long)]
    threshold: Option<f64>,

    /// Nominal sample rate in Hz
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Auto-cancel episodes open longer than this many milliseconds
    #[arg(long)]
    episode_timeout_ms: Option<u64>,

    /// Drop idle energy older than this many milliseconds
    #[arg(long)]
    stale_after_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured session into resolution reports (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Process records from stdin as they arrive (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Flush output after each report (`--flush false` to buffer)
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        flush: bool,

        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Validate sensor record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (shakeit.sensor_event.v1)
    Input,
    /// Output schema (shakeit.resolution.v1)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ShakeCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            detector,
        } => cmd_replay(&input, &output, input_format, output_format, &detector),
        Commands::Run {
            output_format,
            flush,
            detector,
        } => cmd_run(output_format, flush, &detector),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn build_config(args: &DetectorArgs) -> Result<ShakeConfig, ShakeCliError> {
    let mut config = match &args.config {
        Some(path) => ShakeConfig::from_json(&fs::read_to_string(path)?)?,
        None => ShakeConfig::default(),
    };

    if let Some(axes) = args.axes {
        config.axes = shakeit_core::AxisSet::try_from(axes)?;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(hz) = args.sample_rate {
        config.sample_interval_hz = hz;
    }
    if let Some(timeout_ms) = args.episode_timeout_ms {
        config.episode_timeout_ms = Some(timeout_ms);
    }
    if let Some(stale_ms) = args.stale_after_ms {
        config.stale_after_ms = Some(stale_ms);
    }

    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> Result<String, ShakeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, format: &InputFormat) -> Result<Vec<SensorRecord>, ShakeCliError> {
    let records = match format {
        InputFormat::Ndjson => SensorEventAdapter::parse_ndjson(data)?,
        InputFormat::Json => SensorEventAdapter::parse_array(data)?,
    };
    Ok(records)
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    detector: &DetectorArgs,
) -> Result<(), ShakeCliError> {
    let config = build_config(detector)?;
    let input_data = read_input(input)?;
    let records = parse_records(&input_data, &input_format)?;

    if records.is_empty() {
        return Err(ShakeCliError::NoRecords);
    }

    let mut processor = ShakeProcessor::new(config)?;
    let resolutions = processor.process_records(&records)?;

    let encoder = ResolutionEncoder::new();
    let reports: Vec<ResolutionReport> = resolutions.iter().map(|r| encoder.encode(r)).collect();

    if processor.is_sensor_unavailable() {
        tracing::warn!("session reported the accelerometer as unavailable");
    }

    let output_data = format_output(&reports, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    flush: bool,
    detector: &DetectorArgs,
) -> Result<(), ShakeCliError> {
    let config = build_config(detector)?;
    let mut processor = ShakeProcessor::new(config)?;
    let encoder = ResolutionEncoder::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut previous: Option<SensorRecord> = None;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let record: SensorRecord = serde_json::from_str(trimmed).map_err(|e| {
            ShakeCliError::ParseError(format!("Failed to parse record: {}", e))
        })?;

        // Ordering is checked pairwise since the stream is unbounded
        if let Some(prev) = previous.take() {
            SensorEventAdapter::validate_stream(&[prev, record.clone()])?;
        }

        if let Some(resolution) = processor.process_record(&record)? {
            let report = encoder.encode(&resolution);
            let output = format_output(std::slice::from_ref(&report), &output_format)?;
            write!(stdout, "{}", output)?;
            if flush {
                stdout.flush()?;
            }
        }

        previous = Some(record);
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), ShakeCliError> {
    let input_data = read_input(input)?;
    let records = parse_records(&input_data, &input_format)?;

    let errors: Vec<ValidationErrorDetail> = SensorEventAdapter::collect_errors(&records)
        .into_iter()
        .map(|(index, e)| ValidationErrorDetail {
            index,
            kind: records.get(index).map(|r| r.kind_name().to_string()),
            error: e.to_string(),
        })
        .collect();

    let invalid: std::collections::BTreeSet<usize> = errors.iter().map(|e| e.index).collect();
    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - invalid.len(),
        invalid_records: invalid.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validated {} records", report.total_records);
        println!("  valid:   {}", report.valid_records);
        println!("  invalid: {}", report.invalid_records);
        for detail in &report.errors {
            println!("  [{}] {}", detail.index, detail.error);
        }
    }

    if report.invalid_records > 0 {
        return Err(ShakeCliError::ValidationFailed(report.invalid_records));
    }
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), ShakeCliError> {
    let mut checks = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, SHAKEIT_VERSION),
    });

    let default_config = ShakeConfig::default();
    checks.push(DoctorCheck {
        name: "defaults".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "{} axes, threshold {}, {} Hz",
            default_config.axes.count(),
            default_config.threshold,
            default_config.sample_interval_hz
        ),
    });

    if let Some(path) = config {
        let check = match fs::read_to_string(path) {
            Ok(contents) => match ShakeConfig::from_json(&contents) {
                Ok(cfg) => {
                    let bounded = cfg.episode_timeout_ms.is_some() || cfg.stale_after_ms.is_some();
                    DoctorCheck {
                        name: "config".to_string(),
                        status: if bounded {
                            CheckStatus::Ok
                        } else {
                            CheckStatus::Warning
                        },
                        message: if bounded {
                            format!("{} is valid", path.display())
                        } else {
                            format!(
                                "{} is valid; no episode timeout or staleness bound set, \
                                 an unfinished episode can leak into the next",
                                path.display()
                            )
                        },
                    }
                }
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read {}: {}", path.display(), e),
            },
        };
        checks.push(check);
    }

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is piped (ready for `shakeit run`)".to_string(),
        }
    };
    checks.push(stdin_check);

    let failed = checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SHAKEIT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}", report.producer, report.version);
        for check in &report.checks {
            let marker = match check.status {
                CheckStatus::Ok => "ok",
                CheckStatus::Warning => "warn",
                CheckStatus::Error => "FAIL",
            };
            println!("  [{}] {}: {}", marker, check.name, check.message);
        }
    }

    if failed {
        return Err(ShakeCliError::DoctorFailed);
    }
    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), ShakeCliError> {
    match (schema_type, json_schema) {
        (SchemaType::Input, true) => println!("{}", get_input_json_schema()),
        (SchemaType::Output, true) => println!("{}", get_output_json_schema()),
        (SchemaType::Input, false) => {
            println!("{}", SCHEMA_VERSION);
            println!("  schema_version  string   \"{}\"", SCHEMA_VERSION);
            println!("  timestamp       string   RFC 3339");
            println!("  kind            string   sample | begin | end | cancel | sensor_unavailable");
            println!("  x, y            number   (sample) acceleration in g");
            println!("  z               number   (sample, optional) acceleration in g");
            println!("  error           string   (sample, optional) sensor error; reading is dropped");
        }
        (SchemaType::Output, false) => {
            println!("{}", shakeit_core::encoder::REPORT_VERSION);
            println!("  schema_version       string");
            println!("  producer             object   name, version, instance_id");
            println!("  episode_id           string   UUID v4");
            println!("  axis                 string   x | y | z");
            println!("  totals               object   x, y, z accumulated energy");
            println!("  samples_accumulated  integer");
            println!("  began_at_ms          integer");
            println!("  ended_at_ms          integer");
        }
    }
    Ok(())
}

fn format_output(
    reports: &[ResolutionReport],
    format: &OutputFormat,
) -> Result<String, ShakeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut output = String::new();
            for report in reports {
                output.push_str(&serde_json::to_string(report)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "type": "object",
        "required": ["schema_version", "timestamp", "kind"],
        "properties": {
            "schema_version": { "const": SCHEMA_VERSION },
            "timestamp": { "type": "string", "format": "date-time" },
            "kind": {
                "enum": ["sample", "begin", "end", "cancel", "sensor_unavailable"]
            },
            "x": { "type": "number" },
            "y": { "type": "number" },
            "z": { "type": "number" },
            "error": { "type": "string" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": shakeit_core::encoder::REPORT_VERSION,
        "type": "object",
        "required": [
            "schema_version", "producer", "episode_id", "axis", "totals",
            "samples_accumulated", "began_at_ms", "ended_at_ms"
        ],
        "properties": {
            "schema_version": { "type": "string" },
            "producer": {
                "type": "object",
                "required": ["name", "version", "instance_id"]
            },
            "episode_id": { "type": "string", "format": "uuid" },
            "axis": { "enum": ["x", "y", "z"] },
            "totals": {
                "type": "object",
                "properties": {
                    "x": { "type": "number" },
                    "y": { "type": "number" },
                    "z": { "type": "number" }
                }
            },
            "samples_accumulated": { "type": "integer" },
            "began_at_ms": { "type": "integer" },
            "ended_at_ms": { "type": "integer" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum ShakeCliError {
    Io(io::Error),
    Shake(shakeit_core::ShakeError),
    Json(serde_json::Error),
    Validation(shakeit_core::schema::ValidationError),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for ShakeCliError {
    fn from(e: io::Error) -> Self {
        ShakeCliError::Io(e)
    }
}

impl From<shakeit_core::ShakeError> for ShakeCliError {
    fn from(e: shakeit_core::ShakeError) -> Self {
        ShakeCliError::Shake(e)
    }
}

impl From<serde_json::Error> for ShakeCliError {
    fn from(e: serde_json::Error) -> Self {
        ShakeCliError::Json(e)
    }
}

impl From<shakeit_core::schema::ValidationError> for ShakeCliError {
    fn from(e: shakeit_core::schema::ValidationError) -> Self {
        ShakeCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ShakeCliError> for CliError {
    fn from(e: ShakeCliError) -> Self {
        match e {
            ShakeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ShakeCliError::Shake(shakeit_core::ShakeError::InvalidConfiguration(msg)) => {
                CliError {
                    code: "INVALID_CONFIGURATION".to_string(),
                    message: msg,
                    hint: Some("Use --axes 2|3 and a positive --threshold".to_string()),
                }
            }
            ShakeCliError::Shake(shakeit_core::ShakeError::SensorUnavailable) => CliError {
                code: "SENSOR_UNAVAILABLE".to_string(),
                message: "Samples recorded after the accelerometer was reported unavailable"
                    .to_string(),
                hint: Some("Trim the session at the sensor_unavailable record".to_string()),
            },
            ShakeCliError::Shake(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches shakeit.sensor_event.v1 schema".to_string()),
            },
            ShakeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ShakeCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'shakeit validate' for details".to_string()),
            },
            ShakeCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ShakeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            ShakeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            ShakeCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    kind: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_flush(args: &[&str]) -> bool {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Run { flush, .. } => flush,
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_run_flushes_by_default() {
        assert!(run_flush(&["shakeit", "run"]));
        assert!(run_flush(&["shakeit", "run", "--flush", "true"]));
    }

    #[test]
    fn test_run_flush_can_be_disabled() {
        assert!(!run_flush(&["shakeit", "run", "--flush", "false"]));
    }
}
