use crate::cli::{DatasetArgs, PreviewArgs, ProgramArgs};
use clap::ValueEnum;
use program_export::error::AppError;
use program_export::model::Application;
use program_export::store::{ExportDataset, InMemoryExportStore};
use program_export::{ExportService, ExportSettings};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ProgramFormat {
    Csv,
    Json,
}

fn load(
    dataset: &Path,
    settings: ExportSettings,
) -> Result<(ExportService<InMemoryExportStore>, Vec<Application>), AppError> {
    let (store, applications) = ExportDataset::from_file(dataset)?.into_store()?;
    Ok((ExportService::new(Arc::new(store), settings), applications))
}

fn emit(output: Option<&Path>, contents: &str) -> Result<(), AppError> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)?;
            info!(path = %path.display(), bytes = contents.len(), "wrote export");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub(crate) fn run_program_export(
    args: ProgramArgs,
    format: ProgramFormat,
    settings: ExportSettings,
) -> Result<(), AppError> {
    let (service, applications) = load(&args.source.dataset, settings)?;
    let applications = service.applications_for_program(args.program, &applications)?;
    let contents = match format {
        ProgramFormat::Csv => service.program_all_versions_csv(args.program, &applications)?,
        ProgramFormat::Json => service.program_json(args.program, &applications)?,
    };
    emit(args.source.output.as_deref(), &contents)
}

pub(crate) fn run_demographics(args: DatasetArgs, settings: ExportSettings) -> Result<(), AppError> {
    let (service, applications) = load(&args.dataset, settings)?;
    let contents = service.demographics_csv(&applications)?;
    emit(args.output.as_deref(), &contents)
}

pub(crate) fn run_preview(args: PreviewArgs, settings: ExportSettings) -> Result<(), AppError> {
    let source = &args.program.source;
    let (service, _) = load(&source.dataset, settings)?;
    let contents = match args.format {
        ProgramFormat::Csv => service.preview_program_csv(args.program.program)?,
        ProgramFormat::Json => service.preview_program_json(args.program.program)?,
    };
    emit(source.output.as_deref(), &contents)
}
