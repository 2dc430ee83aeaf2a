use std::collections::HashMap;
use std::io::Write;

use ::csv::WriterBuilder;
use tracing::trace;

use super::format::format_csv_timestamp;
use super::opaque::OpaqueHasher;
use super::schema::{ColumnType, ExportConfig};
use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::{ApplicantQuestion, Application, Path};

const MEETS_ELIGIBILITY: &str = "Meets eligibility";
const DOES_NOT_MEET_ELIGIBILITY: &str = "Doesn't meet eligibility";

/// Streams one row per application under a fixed header.
pub struct CsvExporter<'c, W: Write> {
    writer: ::csv::Writer<W>,
    config: &'c ExportConfig,
    settings: &'c ExportSettings,
    hasher: Option<OpaqueHasher>,
    rows: usize,
}

impl<'c, W: Write> CsvExporter<'c, W> {
    /// Write the header row. Fails before any output when opaque columns lack a secret.
    pub fn new(
        sink: W,
        config: &'c ExportConfig,
        settings: &'c ExportSettings,
    ) -> Result<Self, ExportError> {
        let hasher = if config.has_opaque_columns() {
            Some(OpaqueHasher::from_settings(settings)?)
        } else {
            None
        };
        let mut writer = WriterBuilder::new().from_writer(sink);
        writer.write_record(config.headers())?;
        Ok(Self {
            writer,
            config,
            settings,
            hasher,
            rows: 0,
        })
    }

    /// Append one application.
    ///
    /// `answers` maps contextualized question paths to questions bound to this
    /// application; paths it lacks render as empty cells.
    pub fn export_record(
        &mut self,
        application: &Application,
        program_name: &str,
        answers: &HashMap<Path, ApplicantQuestion<'_>>,
    ) -> Result<(), ExportError> {
        let mut row = Vec::with_capacity(self.config.columns().len());
        for column in self.config.columns() {
            let cell = match column.column_type {
                ColumnType::ApplicantAnswer | ColumnType::ApplicantOpaque => {
                    let answer = match (&column.question_path, &column.field) {
                        (Some(path), Some(field)) => match answers.get(path) {
                            Some(question) => field.extract(question, self.settings)?,
                            None => String::new(),
                        },
                        _ => String::new(),
                    };
                    if column.column_type == ColumnType::ApplicantOpaque && !answer.is_empty() {
                        self.hash(&answer)?
                    } else {
                        answer
                    }
                }
                ColumnType::ApplicantId => application.applicant_id.to_string(),
                ColumnType::ApplicationId => application.id.to_string(),
                ColumnType::OpaqueId => self.hasher()?.hash_id(application.applicant_id),
                ColumnType::Program => program_name.to_string(),
                ColumnType::Language => application.language.clone(),
                ColumnType::CreateTime => {
                    format_csv_timestamp(application.create_time, self.settings.time_zone)
                }
                ColumnType::SubmitTime => application
                    .submit_time
                    .map(|time| format_csv_timestamp(time, self.settings.time_zone))
                    .unwrap_or_default(),
                ColumnType::SubmitterType => application.submitter_type().as_str().to_string(),
                ColumnType::TiEmail => application.submitter_email.clone().unwrap_or_default(),
                ColumnType::TiEmailOpaque => match &application.submitter_email {
                    Some(email) => self.hash(email)?,
                    None => String::new(),
                },
                ColumnType::TiOrganization => {
                    application.ti_organization.clone().unwrap_or_default()
                }
                ColumnType::EligibilityStatus => match application.eligible {
                    Some(true) => MEETS_ELIGIBILITY.to_string(),
                    Some(false) => DOES_NOT_MEET_ELIGIBILITY.to_string(),
                    None => String::new(),
                },
                ColumnType::Status => application.latest_status.clone().unwrap_or_default(),
                ColumnType::AdminNote => application.admin_note.clone().unwrap_or_default(),
                ColumnType::StatusLastModifiedTime => application
                    .status_last_modified_time
                    .map(|time| format_csv_timestamp(time, self.settings.time_zone))
                    .unwrap_or_default(),
            };
            row.push(cell);
        }

        self.writer.write_record(&row)?;
        self.rows += 1;
        trace!(application_id = application.id, "wrote csv row");
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the sink.
    pub fn finish(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|err| ExportError::Io(err.into_error()))
    }

    fn hasher(&self) -> Result<&OpaqueHasher, ExportError> {
        self.hasher.as_ref().ok_or_else(|| {
            ExportError::Configuration("opaque column exported without a secret".to_string())
        })
    }

    fn hash(&self, value: &str) -> Result<String, ExportError> {
        Ok(self.hasher()?.hash(value))
    }
}

/// Decode a finished in-memory CSV buffer.
pub(crate) fn into_text(buffer: Vec<u8>) -> Result<String, ExportError> {
    String::from_utf8(buffer).map_err(|err| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}
