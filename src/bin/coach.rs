//! Coach CLI - Command-line interface for the TCU coach
//!
//! Commands:
//! - analyze: Training load and power profile of an activity
//! - prescribe: Readiness decision and today's workout
//! - workout: Workout for a decision tag
//! - zones: Power zone table for an FTP

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tcu_coach::adapters::{JsonActivitySource, PayloadFormat};
use tcu_coach::load::validate_ftp_override;
use tcu_coach::pipeline::{analyze_activity, prescribe};
use tcu_coach::render;
use tcu_coach::types::{
    ActivityAnalysis, ActivityId, Feeling, Prescription, SleepQuality, UserSubjectiveData,
};
use tcu_coach::workout::generate_from_tag;
use tcu_coach::zones::ZONES;
use tcu_coach::zwo::ZwoEncoder;
use tcu_coach::{ActivitySource, CoachConfig, ReportEncoder, COACH_VERSION};

/// TCU Coach - training load, readiness decisions and structured workouts
#[derive(Parser)]
#[command(name = "coach")]
#[command(version = COACH_VERSION)]
#[command(about = "Turn cycling activity data into today's workout", long_about = None)]
struct Cli {
    /// Coach configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// FTP override in watts (50-600)
    #[arg(long, global = true)]
    ftp: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an activity: TSS, IF and power profile
    Analyze {
        /// Activity payload path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload shape
        #[arg(long, default_value = "strava")]
        source: SourceFormat,

        /// Analyze this activity instead of the latest
        #[arg(long)]
        activity_id: Option<String>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: AnalysisFormat,
    },

    /// Decide today's training and generate the workout
    Prescribe {
        /// Activity payload path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload shape
        #[arg(long, default_value = "strava")]
        source: SourceFormat,

        /// Perceived exertion, 1-10
        #[arg(long)]
        rpe: u8,

        /// Report muscle soreness or pain
        #[arg(long)]
        sore: bool,

        /// Last night's sleep
        #[arg(long, default_value = "average")]
        sleep: SleepArg,

        /// Overall feeling
        #[arg(long, default_value = "ok")]
        feeling: FeelingArg,

        /// Output format
        #[arg(long, default_value = "narrative")]
        output_format: WorkoutFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Generate the workout for a decision tag (RECOVERY, ADAPTIVE_CAP, TECHNIC, TARGET)
    Workout {
        /// Decision tag
        tag: String,

        /// Justification carried into the workout
        #[arg(long, default_value = "")]
        reason: String,

        /// Output format
        #[arg(long, default_value = "narrative")]
        output_format: WorkoutFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Print the power zone table
    Zones {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceFormat {
    /// Strava REST API objects
    Strava,
    /// Activity database proxy rows
    Proxy,
}

impl From<SourceFormat> for PayloadFormat {
    fn from(f: SourceFormat) -> Self {
        match f {
            SourceFormat::Strava => PayloadFormat::Strava,
            SourceFormat::Proxy => PayloadFormat::Proxy,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SleepArg {
    Poor,
    Average,
    Good,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeelingArg {
    Tired,
    Ok,
    Fresh,
}

#[derive(Clone, ValueEnum)]
enum AnalysisFormat {
    /// Single-line JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Markdown report
    Text,
}

#[derive(Clone, ValueEnum)]
enum WorkoutFormat {
    /// Full coaching report (JSON)
    Json,
    /// Pretty-printed coaching report
    JsonPretty,
    /// Step-by-step Markdown
    Narrative,
    /// Markdown table
    Table,
    /// ZWO structured workout file
    Zwo,
}

fn main() -> ExitCode {
    env_logger::init();
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

fn run(cli: Cli) -> Result<(), CoachCliError> {
    let config = load_config(cli.config.as_deref(), cli.ftp)?;

    match cli.command {
        Commands::Analyze {
            input,
            source,
            activity_id,
            output_format,
        } => cmd_analyze(&input, source.into(), activity_id, output_format, &config),

        Commands::Prescribe {
            input,
            source,
            rpe,
            sore,
            sleep,
            feeling,
            output_format,
            output,
        } => {
            let subjective = UserSubjectiveData {
                rpe,
                soreness: sore,
                sleep_quality: match sleep {
                    SleepArg::Poor => SleepQuality::Poor,
                    SleepArg::Average => SleepQuality::Average,
                    SleepArg::Good => SleepQuality::Good,
                },
                feeling: match feeling {
                    FeelingArg::Tired => Feeling::Tired,
                    FeelingArg::Ok => Feeling::Ok,
                    FeelingArg::Fresh => Feeling::Fresh,
                },
            };
            cmd_prescribe(&input, source.into(), subjective, output_format, &output, &config)
        }

        Commands::Workout {
            tag,
            reason,
            output_format,
            output,
        } => cmd_workout(&tag, &reason, output_format, &output, &config),

        Commands::Zones { json } => cmd_zones(&config, json),
    }
}

fn load_config(path: Option<&Path>, ftp: Option<u32>) -> Result<CoachConfig, CoachCliError> {
    let config = match path {
        Some(path) => CoachConfig::from_json(&fs::read_to_string(path)?)?,
        None => CoachConfig::default(),
    };
    match ftp {
        Some(ftp) => Ok(config.with_ftp_override(ftp)?),
        None => Ok(config),
    }
}

fn read_input(input: &Path) -> Result<String, CoachCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(CoachCliError::InteractiveStdin);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), CoachCliError> {
    if output.to_string_lossy() == "-" {
        println!("{data}");
    } else {
        fs::write(output, data)?;
        info!("Wrote {}", output.display());
    }
    Ok(())
}

fn load_analysis(
    input: &Path,
    format: PayloadFormat,
    activity_id: Option<String>,
    config: &CoachConfig,
) -> Result<ActivityAnalysis, CoachCliError> {
    let raw = read_input(input)?;
    let source = JsonActivitySource::from_payload(format.adapter(), &raw)?;

    let activity = match activity_id {
        Some(id) => {
            let id = match id.parse::<i64>() {
                Ok(n) => ActivityId::Numeric(n),
                Err(_) => ActivityId::Text(id),
            };
            source.activity(&id)?
        }
        None => source.latest_activity()?,
    };

    let activity = activity.ok_or(CoachCliError::NoActivity)?;
    Ok(analyze_activity(&activity, None, config)?)
}

fn cmd_analyze(
    input: &Path,
    format: PayloadFormat,
    activity_id: Option<String>,
    output_format: AnalysisFormat,
    config: &CoachConfig,
) -> Result<(), CoachCliError> {
    let analysis = load_analysis(input, format, activity_id, config)?;

    let output = match output_format {
        AnalysisFormat::Json => serde_json::to_string(&analysis)?,
        AnalysisFormat::JsonPretty => serde_json::to_string_pretty(&analysis)?,
        AnalysisFormat::Text => render::activity_summary(
            &analysis.activity,
            &analysis.hard_data,
            analysis.streams.as_ref(),
        ),
    };

    println!("{output}");
    Ok(())
}

fn cmd_prescribe(
    input: &Path,
    format: PayloadFormat,
    subjective: UserSubjectiveData,
    output_format: WorkoutFormat,
    output: &Path,
    config: &CoachConfig,
) -> Result<(), CoachCliError> {
    let analysis = load_analysis(input, format, None, config)?;
    let prescription = prescribe(&analysis.hard_data, &subjective)?;

    let data = match output_format {
        WorkoutFormat::Json | WorkoutFormat::JsonPretty => {
            let encoder = ReportEncoder::new();
            let report = encoder.encode(&analysis, Some(&subjective), Some(&prescription));
            if matches!(output_format, WorkoutFormat::Json) {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            }
        }
        _ => format_workout(&prescription, &output_format, config)?,
    };

    write_output(output, &data)
}

fn cmd_workout(
    tag: &str,
    reason: &str,
    output_format: WorkoutFormat,
    output: &Path,
    config: &CoachConfig,
) -> Result<(), CoachCliError> {
    let workout = generate_from_tag(tag, reason)?;

    let data = match output_format {
        WorkoutFormat::Json => serde_json::to_string(&workout)?,
        WorkoutFormat::JsonPretty => serde_json::to_string_pretty(&workout)?,
        WorkoutFormat::Narrative => render::narrative(&workout),
        WorkoutFormat::Table => render::table(&workout),
        WorkoutFormat::Zwo => ZwoEncoder::new(&config.zwo_author).encode(&workout)?,
    };

    write_output(output, &data)
}

fn format_workout(
    prescription: &Prescription,
    format: &WorkoutFormat,
    config: &CoachConfig,
) -> Result<String, CoachCliError> {
    let workout = &prescription.workout;
    Ok(match format {
        WorkoutFormat::Json => serde_json::to_string(prescription)?,
        WorkoutFormat::JsonPretty => serde_json::to_string_pretty(prescription)?,
        WorkoutFormat::Narrative => render::narrative(workout),
        WorkoutFormat::Table => render::table(workout),
        WorkoutFormat::Zwo => ZwoEncoder::new(&config.zwo_author).encode(workout)?,
    })
}

fn cmd_zones(config: &CoachConfig, json: bool) -> Result<(), CoachCliError> {
    let ftp = config.ftp_override.unwrap_or(config.default_ftp);
    validate_ftp_override(ftp as f64).map_err(|_| CoachCliError::InvalidFtp(ftp))?;

    let rows: Vec<ZoneRow> = ZONES
        .iter()
        .map(|z| ZoneRow {
            zone: z.zone,
            name: z.name,
            min_watts: (ftp as f64 * z.min_pct as f64 / 100.0).round() as u32,
            max_watts: z.max_pct.map(|p| (ftp as f64 * p as f64 / 100.0).round() as u32),
            description: z.description,
        })
        .collect();

    if json {
        let report = ZoneReport { ftp, zones: rows };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("FTP: {ftp} W\n");
    println!("| Zone | Name | Watts | Purpose |");
    println!("| :--- | :--- | :--- | :--- |");
    for row in rows {
        let watts = match row.max_watts {
            Some(max) => format!("{}-{} W", row.min_watts, max),
            None => format!("> {} W", row.min_watts),
        };
        println!("| Z{} | {} | {} | {} |", row.zone, row.name, watts, row.description);
    }
    Ok(())
}

// Error handling

enum CoachCliError {
    Io(io::Error),
    Compute(tcu_coach::ComputeError),
    Json(serde_json::Error),
    NoActivity,
    InteractiveStdin,
    InvalidFtp(u32),
}

impl From<io::Error> for CoachCliError {
    fn from(e: io::Error) -> Self {
        CoachCliError::Io(e)
    }
}

impl From<tcu_coach::ComputeError> for CoachCliError {
    fn from(e: tcu_coach::ComputeError) -> Self {
        CoachCliError::Compute(e)
    }
}

impl From<serde_json::Error> for CoachCliError {
    fn from(e: serde_json::Error) -> Self {
        CoachCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CoachCliError> for CliError {
    fn from(e: CoachCliError) -> Self {
        match e {
            CoachCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CoachCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the activity payload and the --source shape".to_string()),
            },
            CoachCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CoachCliError::NoActivity => CliError {
                code: "NO_ACTIVITY".to_string(),
                message: "No matching activity found in input".to_string(),
                hint: Some("Check --activity-id or fetch recent activities first".to_string()),
            },
            CoachCliError::InteractiveStdin => CliError {
                code: "NO_INPUT".to_string(),
                message: "Refusing to read activity data from a terminal".to_string(),
                hint: Some("Pipe a payload into stdin or pass --input <file>".to_string()),
            },
            CoachCliError::InvalidFtp(ftp) => CliError {
                code: "INVALID_FTP".to_string(),
                message: format!("FTP {ftp} W is outside 50-600 W"),
                hint: Some("Set a realistic FTP with --ftp".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ZoneReport {
    ftp: u32,
    zones: Vec<ZoneRow>,
}

#[derive(serde::Serialize)]
struct ZoneRow {
    zone: u8,
    name: &'static str,
    min_watts: u32,
    max_watts: Option<u32>,
    description: &'static str,
}
