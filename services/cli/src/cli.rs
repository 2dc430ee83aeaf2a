use crate::commands::{run_demographics, run_preview, run_program_export, ProgramFormat};
use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand};
use program_export::config::{parse_utc_offset, AppConfig, ExportSettings};
use program_export::error::AppError;
use program_export::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "program-export",
    about = "Export program applications as CSV or JSON",
    version
)]
struct Cli {
    #[command(flatten)]
    overrides: SettingsArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One CSV covering every version of a program
    Csv(ProgramArgs),
    /// JSON documents for every application to a program
    Json(ProgramArgs),
    /// Cross-program demographics CSV with PII hashed
    Demographics(DatasetArgs),
    /// Sample export for a program version
    Preview(PreviewArgs),
}

/// Per-run overrides of the environment configuration.
#[derive(Args, Debug, Default)]
struct SettingsArgs {
    /// Base URL used for file download links
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Secret used to derive opaque identifiers
    #[arg(long, global = true)]
    secret: Option<String>,
    /// Offset for rendered timestamps, e.g. -07:00
    #[arg(long, global = true, value_parser = parse_offset)]
    utc_offset: Option<FixedOffset>,
    /// Export file uploads as URL lists
    #[arg(long, global = true)]
    multiple_file_upload: bool,
}

impl SettingsArgs {
    fn apply(self, mut settings: ExportSettings) -> ExportSettings {
        if let Some(base_url) = self.base_url {
            settings = settings.with_base_url(base_url);
        }
        if let Some(secret) = self.secret {
            settings = settings.with_secret(secret);
        }
        if let Some(offset) = self.utc_offset {
            settings = settings.with_time_zone(offset);
        }
        if self.multiple_file_upload {
            settings = settings.with_multiple_file_upload(true);
        }
        settings
    }
}

#[derive(Args, Debug)]
pub(crate) struct DatasetArgs {
    /// JSON snapshot of questions, programs, and applications
    #[arg(long)]
    pub(crate) dataset: PathBuf,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ProgramArgs {
    #[command(flatten)]
    pub(crate) source: DatasetArgs,
    /// Any version id of the program to export
    #[arg(long)]
    pub(crate) program: u64,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    #[command(flatten)]
    pub(crate) program: ProgramArgs,
    /// Shape of the sample export
    #[arg(long, value_enum, default_value = "json")]
    pub(crate) format: ProgramFormat,
}

fn parse_offset(raw: &str) -> Result<FixedOffset, String> {
    parse_utc_offset(raw).ok_or_else(|| format!("'{raw}' is not an offset like +HH:MM"))
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let settings = cli.overrides.apply(config.export);

    match cli.command {
        Command::Csv(args) => run_program_export(args, ProgramFormat::Csv, settings),
        Command::Json(args) => run_program_export(args, ProgramFormat::Json, settings),
        Command::Demographics(args) => run_demographics(args, settings),
        Command::Preview(args) => run_preview(args, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "program-export",
            "csv",
            "--dataset",
            "snapshot.json",
            "--program",
            "12",
            "--secret",
            "pepper",
            "--utc-offset",
            "-07:00",
        ])
        .expect("valid arguments");

        let settings = cli.overrides.apply(ExportSettings::default());
        assert_eq!(settings.secret.as_deref(), Some("pepper"));
        assert_eq!(settings.time_zone.local_minus_utc(), -7 * 3600);
        match cli.command {
            Command::Csv(args) => {
                assert_eq!(args.program, 12);
                assert_eq!(args.source.dataset, PathBuf::from("snapshot.json"));
                assert!(args.source.output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn preview_defaults_to_json() {
        let cli = Cli::try_parse_from([
            "program-export",
            "preview",
            "--dataset",
            "snapshot.json",
            "--program",
            "3",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::Preview(args) => {
                assert_eq!(args.format, ProgramFormat::Json);
                assert_eq!(args.program.program, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "program-export",
            "preview",
            "--dataset",
            "snapshot.json",
            "--program",
            "3",
            "--format",
            "csv",
        ])
        .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Command::Preview(PreviewArgs {
                format: ProgramFormat::Csv,
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_offset() {
        let result = Cli::try_parse_from([
            "program-export",
            "demographics",
            "--dataset",
            "snapshot.json",
            "--utc-offset",
            "pacific",
        ]);
        assert!(result.is_err());
    }
}
