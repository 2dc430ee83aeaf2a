//! Column model, header naming, and the cross-version question union.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::strategy::{strategy_for, AnswerField};
use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::{
    contextualize, ApplicantData, ApplicantQuestion, Application, Path, ProgramDefinition,
    QuestionDefinition, QuestionTag,
};
use crate::store::HistoricOptionLookup;

/// Source of a CSV column's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    ApplicantAnswer,
    ApplicantOpaque,
    ApplicantId,
    ApplicationId,
    OpaqueId,
    Program,
    Language,
    CreateTime,
    SubmitTime,
    SubmitterType,
    TiEmail,
    TiEmailOpaque,
    TiOrganization,
    EligibilityStatus,
    Status,
    AdminNote,
    StatusLastModifiedTime,
}

/// Broad grouping of [`ColumnType`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    Answer,
    Metadata,
    Opaque,
    Computed,
}

impl ColumnType {
    pub const fn category(self) -> ColumnCategory {
        match self {
            Self::ApplicantAnswer => ColumnCategory::Answer,
            Self::ApplicantOpaque | Self::OpaqueId | Self::TiEmailOpaque => ColumnCategory::Opaque,
            Self::SubmitterType | Self::EligibilityStatus => ColumnCategory::Computed,
            Self::ApplicantId
            | Self::ApplicationId
            | Self::Program
            | Self::Language
            | Self::CreateTime
            | Self::SubmitTime
            | Self::TiEmail
            | Self::TiOrganization
            | Self::Status
            | Self::AdminNote
            | Self::StatusLastModifiedTime => ColumnCategory::Metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub column_type: ColumnType,
    /// Contextualized path of the question an answer column reads from.
    pub question_path: Option<Path>,
    pub field: Option<AnswerField>,
}

impl Column {
    pub fn metadata(header: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            header: header.into(),
            column_type,
            question_path: None,
            field: None,
        }
    }

    pub fn answer(
        header: String,
        column_type: ColumnType,
        question_path: Path,
        field: AnswerField,
    ) -> Self {
        Self {
            header,
            column_type,
            question_path: Some(question_path),
            field: Some(field),
        }
    }

    pub fn category(&self) -> ColumnCategory {
        self.column_type.category()
    }
}

/// Ordered column list with unique headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    columns: Vec<Column>,
}

impl ExportConfig {
    pub fn new(columns: Vec<Column>) -> Result<Self, ExportError> {
        let mut headers = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !headers.insert(column.header.as_str()) {
                return Err(ExportError::Configuration(format!(
                    "duplicate column header '{}'",
                    column.header
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.header.as_str())
    }

    pub fn has_opaque_columns(&self) -> bool {
        self.columns
            .iter()
            .any(|column| column.category() == ColumnCategory::Opaque)
    }
}

fn display_scalar(key: &str) -> &str {
    match key {
        "currency_cents" => "currency",
        "name_suffix" => "suffix",
        "file_key_list" => "file_urls",
        "service_areas" => "service_area",
        other => other,
    }
}

/// Human readable header for a scalar path.
///
/// `applicant.household_members[0].member_name.first_name` becomes
/// `household members[0] - member name (first_name)`.
pub fn format_header(path: &Path, option_admin_name: Option<&str>) -> String {
    let scalar = path.key_name();
    let mut parts = vec![match option_admin_name {
        Some(option) => format!("({scalar} - {option})"),
        None => format!("({})", display_scalar(scalar)),
    }];

    let root = Path::applicant();
    let mut current = path.parent();
    while !current.is_empty() && current != root {
        parts.push(current.key_name().replace('_', " "));
        current = current.parent();
    }

    let mut header = String::new();
    for (position, part) in parts.iter().enumerate().rev() {
        header.push_str(part);
        if position > 1 {
            header.push_str(" - ");
        } else if position == 1 {
            header.push(' ');
        }
    }
    header
}

pub(crate) fn find_version<'a>(
    versions: &'a [ProgramDefinition],
    version_id: u64,
) -> Result<&'a ProgramDefinition, ExportError> {
    versions
        .iter()
        .find(|program| program.id == version_id)
        .ok_or_else(|| {
            ExportError::MissingReference(format!("program version {version_id}"))
        })
}

/// Every exportable question across all versions, one per contextualized path.
///
/// Applications are merged first so repeated entities that only exist in
/// answers get columns; each version is then merged with empty data. The
/// first question seen for a path wins and the result is sorted by path text.
pub fn unify_questions<'a>(
    versions: &'a [ProgramDefinition],
    applications: &'a [Application],
) -> Result<Vec<ApplicantQuestion<'a>>, ExportError> {
    let mut seen: HashMap<Path, ApplicantQuestion<'a>> = HashMap::new();
    let mut merge = |questions: Vec<ApplicantQuestion<'a>>| {
        for question in questions {
            if question.question_type().is_exported() {
                seen.entry(question.path().clone()).or_insert(question);
            }
        }
    };

    for application in applications {
        let program = find_version(versions, application.program_version_id)?;
        merge(contextualize(program, &application.applicant_data));
    }
    for program in versions {
        merge(contextualize(program, ApplicantData::empty_ref()));
    }

    let mut questions: Vec<_> = seen.into_values().collect();
    questions.sort_by_cached_key(|question| question.path().to_string());
    debug!(questions = questions.len(), "unified question schema");
    Ok(questions)
}

/// Bound questions of an application's own version, keyed by path.
pub fn answers_by_path<'a>(
    versions: &'a [ProgramDefinition],
    application: &'a Application,
) -> Result<HashMap<Path, ApplicantQuestion<'a>>, ExportError> {
    let program = find_version(versions, application.program_version_id)?;
    Ok(contextualize(program, &application.applicant_data)
        .into_iter()
        .map(|question| (question.path().clone(), question))
        .collect())
}

fn leading_columns(show_eligibility: bool) -> Vec<Column> {
    let mut columns = vec![
        Column::metadata("Applicant ID", ColumnType::ApplicantId),
        Column::metadata("Application ID", ColumnType::ApplicationId),
        Column::metadata("Applicant Language", ColumnType::Language),
        Column::metadata("Create Time", ColumnType::CreateTime),
        Column::metadata("Submit Time", ColumnType::SubmitTime),
        Column::metadata("Submitter Type", ColumnType::SubmitterType),
        Column::metadata("TI Email", ColumnType::TiEmail),
        Column::metadata("TI Organization", ColumnType::TiOrganization),
    ];
    if show_eligibility {
        columns.push(Column::metadata(
            "Eligibility Status",
            ColumnType::EligibilityStatus,
        ));
    }
    columns.push(Column::metadata("Status", ColumnType::Status));
    columns
}

fn trailing_columns() -> Vec<Column> {
    vec![
        Column::metadata("Admin Note", ColumnType::AdminNote),
        Column::metadata("Status Last Modified Time", ColumnType::StatusLastModifiedTime),
    ]
}

/// Columns for the all-versions program CSV.
pub fn program_export_config(
    questions: &[ApplicantQuestion<'_>],
    show_eligibility: bool,
    settings: &ExportSettings,
    historic: &dyn HistoricOptionLookup,
) -> Result<ExportConfig, ExportError> {
    let mut columns = leading_columns(show_eligibility);
    for question in questions {
        columns.extend(strategy_for(question.question_type()).columns(
            question,
            ColumnType::ApplicantAnswer,
            settings,
            historic,
        )?);
    }
    columns.extend(trailing_columns());
    ExportConfig::new(columns)
}

/// Demographic questions usable as top-level export columns.
pub fn demographic_questions(questions: &[QuestionDefinition]) -> Vec<&QuestionDefinition> {
    questions
        .iter()
        .filter(|question| {
            if question.is_repeated() {
                debug!(question = %question.name, "repeated demographic question not exported");
                return false;
            }
            question.question_type().is_exported()
                && (question.has_tag(QuestionTag::Demographic)
                    || question.has_tag(QuestionTag::DemographicPii))
        })
        .collect()
}

/// Columns for the cross-program demographics CSV.
///
/// `DEMOGRAPHIC_PII` questions are hashed; the rest are exported as answered.
pub fn demographics_export_config(
    questions: &[&QuestionDefinition],
    settings: &ExportSettings,
    historic: &dyn HistoricOptionLookup,
) -> Result<ExportConfig, ExportError> {
    let mut columns = vec![
        Column::metadata("Opaque ID", ColumnType::OpaqueId),
        Column::metadata("Program", ColumnType::Program),
        Column::metadata("Submitter Type", ColumnType::SubmitterType),
        Column::metadata("TI Email (Opaque)", ColumnType::TiEmailOpaque),
        Column::metadata("TI Organization", ColumnType::TiOrganization),
        Column::metadata("Create Time", ColumnType::CreateTime),
        Column::metadata("Submit Time", ColumnType::SubmitTime),
        Column::metadata("Status", ColumnType::Status),
    ];
    for definition in questions {
        let column_type = if definition.has_tag(QuestionTag::DemographicPii) {
            ColumnType::ApplicantOpaque
        } else {
            ColumnType::ApplicantAnswer
        };
        let exemplar = ApplicantQuestion::top_level(definition, ApplicantData::empty_ref());
        columns.extend(strategy_for(definition.question_type()).columns(
            &exemplar,
            column_type,
            settings,
            historic,
        )?);
    }
    ExportConfig::new(columns)
}
