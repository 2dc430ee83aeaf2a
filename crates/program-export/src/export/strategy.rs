//! Per-question-type rules for turning a bound question into columns and JSON entries.

use chrono::NaiveDate;
use serde_json::Value;

use super::format::{
    cents_to_dollars, date_from_epoch_millis, file_url, format_cents, format_coordinate,
    format_e164, format_iso_date, format_service_areas, parse_iso_date, ServiceAreaInclusion,
};
use super::schema::{format_header, Column, ColumnType};
use super::value::ExportValue;
use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::{ApplicantQuestion, Path, QuestionType, Scalar};
use crate::store::HistoricOptionLookup;

const SERVICE_AREA_KEY: &str = "service_area";
const CURRENCY_DOLLARS_KEY: &str = "currency_dollars";
const FILE_URLS_KEY: &str = "file_urls";

/// Extraction rules for one family of question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    Address,
    Currency,
    Date,
    Email,
    FileUpload,
    Id,
    MultiSelect,
    Name,
    Number,
    Phone,
    SingleSelect,
    Text,
    /// Enumerator and static questions contribute nothing.
    Skip,
}

pub fn strategy_for(question_type: QuestionType) -> ExtractionStrategy {
    match question_type {
        QuestionType::Address => ExtractionStrategy::Address,
        QuestionType::Checkbox => ExtractionStrategy::MultiSelect,
        QuestionType::Currency => ExtractionStrategy::Currency,
        QuestionType::Date => ExtractionStrategy::Date,
        QuestionType::Dropdown | QuestionType::RadioButton => ExtractionStrategy::SingleSelect,
        QuestionType::Email => ExtractionStrategy::Email,
        QuestionType::Enumerator | QuestionType::Static => ExtractionStrategy::Skip,
        QuestionType::FileUpload => ExtractionStrategy::FileUpload,
        QuestionType::Id => ExtractionStrategy::Id,
        QuestionType::Name => ExtractionStrategy::Name,
        QuestionType::Number => ExtractionStrategy::Number,
        QuestionType::Phone => ExtractionStrategy::Phone,
        QuestionType::Text => ExtractionStrategy::Text,
    }
}

/// How one CSV cell is read from a bound question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerField {
    /// The stored scalar as text.
    Text(Scalar),
    /// Latitude or longitude.
    Coordinate(Scalar),
    WellKnownId,
    ServiceAreas,
    CurrencyDollars,
    Date,
    Number,
    Selection,
    /// Tri-state of one multi-select option, keyed by admin name.
    SelectionOption(String),
    FileKeyUrl,
    FileUrls,
}

impl AnswerField {
    pub fn extract(
        &self,
        question: &ApplicantQuestion<'_>,
        settings: &ExportSettings,
    ) -> Result<String, ExportError> {
        let text = match self {
            AnswerField::Text(scalar) => question.read_string(*scalar)?,
            AnswerField::Coordinate(scalar) => question.read_f64(*scalar)?.map(format_coordinate),
            AnswerField::WellKnownId => question
                .read_i64(Scalar::WellKnownId)?
                .map(|id| id.to_string()),
            AnswerField::ServiceAreas => {
                read_service_areas(question)?.map(|areas| format_service_areas(&areas))
            }
            AnswerField::CurrencyDollars => {
                question.read_i64(Scalar::CurrencyCents)?.map(format_cents)
            }
            AnswerField::Date => read_date(question)?.map(format_iso_date),
            AnswerField::Number => question.read_i64(Scalar::Number)?.map(|n| n.to_string()),
            AnswerField::Selection => selected_admin_name(question)?,
            AnswerField::SelectionOption(admin_name) => {
                Some(selection_state(question, admin_name)?.as_str().to_string())
            }
            AnswerField::FileKeyUrl => question
                .read_string(Scalar::FileKey)?
                .map(|key| file_url(&settings.base_url, &key)),
            AnswerField::FileUrls => {
                let urls = file_urls(question, settings)?;
                (!urls.is_empty()).then(|| urls.join(", "))
            }
        };
        Ok(text.unwrap_or_default())
    }
}

/// Per-option state of a multi-select answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Selected,
    NotSelected,
    NotAnswered,
    NotAnOptionAtProgramVersion,
}

impl SelectionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Selected => "SELECTED",
            Self::NotSelected => "NOT_SELECTED",
            Self::NotAnswered => "NOT_ANSWERED",
            Self::NotAnOptionAtProgramVersion => "NOT_AN_OPTION_AT_PROGRAM_VERSION",
        }
    }
}

pub fn selection_state(
    question: &ApplicantQuestion<'_>,
    option_admin_name: &str,
) -> Result<SelectionState, ExportError> {
    let Some(selected) = question.read_id_list(Scalar::Selections)? else {
        return Ok(SelectionState::NotAnswered);
    };
    let Some(option) = question
        .definition()
        .options()
        .iter()
        .find(|option| option.admin_name == option_admin_name)
    else {
        return Ok(SelectionState::NotAnOptionAtProgramVersion);
    };
    if selected.contains(&option.id) {
        Ok(SelectionState::Selected)
    } else {
        Ok(SelectionState::NotSelected)
    }
}

impl ExtractionStrategy {
    pub fn is_skip(self) -> bool {
        self == ExtractionStrategy::Skip
    }

    /// Columns contributed by `question`, all tagged with `column_type`.
    pub fn columns(
        self,
        question: &ApplicantQuestion<'_>,
        column_type: ColumnType,
        settings: &ExportSettings,
        historic: &dyn HistoricOptionLookup,
    ) -> Result<Vec<Column>, ExportError> {
        let column = |key: &str, field: AnswerField| {
            Column::answer(
                format_header(&question.path().join(key), None),
                column_type,
                question.path().clone(),
                field,
            )
        };
        let text = |scalar: Scalar| column(scalar.key(), AnswerField::Text(scalar));

        let columns = match self {
            ExtractionStrategy::Address => Scalar::ADDRESS
                .iter()
                .map(|scalar| match scalar {
                    Scalar::ServiceAreas => column(scalar.key(), AnswerField::ServiceAreas),
                    Scalar::Latitude | Scalar::Longitude => {
                        column(scalar.key(), AnswerField::Coordinate(*scalar))
                    }
                    Scalar::WellKnownId => column(scalar.key(), AnswerField::WellKnownId),
                    other => text(*other),
                })
                .collect(),
            ExtractionStrategy::Currency => vec![column(
                Scalar::CurrencyCents.key(),
                AnswerField::CurrencyDollars,
            )],
            ExtractionStrategy::Date => vec![column(Scalar::Date.key(), AnswerField::Date)],
            ExtractionStrategy::Email => vec![text(Scalar::Email)],
            ExtractionStrategy::FileUpload if settings.multiple_file_upload_enabled => {
                vec![column(Scalar::FileKeyList.key(), AnswerField::FileUrls)]
            }
            ExtractionStrategy::FileUpload => vec![
                column(Scalar::FileKey.key(), AnswerField::FileKeyUrl),
                column(Scalar::FileKeyList.key(), AnswerField::FileUrls),
            ],
            ExtractionStrategy::Id => vec![text(Scalar::Id)],
            ExtractionStrategy::MultiSelect => {
                let selections = question.scalar_path(Scalar::Selections);
                let mut admin_names =
                    historic.historic_option_admin_names(&question.definition().name)?;
                if admin_names.is_empty() {
                    admin_names = question
                        .definition()
                        .options()
                        .iter()
                        .map(|option| option.admin_name.clone())
                        .collect();
                }
                admin_names
                    .into_iter()
                    .map(|admin_name| {
                        Column::answer(
                            format_header(&selections, Some(&admin_name)),
                            column_type,
                            question.path().clone(),
                            AnswerField::SelectionOption(admin_name),
                        )
                    })
                    .collect()
            }
            ExtractionStrategy::Name => Scalar::NAME.iter().map(|scalar| text(*scalar)).collect(),
            ExtractionStrategy::Number => {
                vec![column(Scalar::Number.key(), AnswerField::Number)]
            }
            ExtractionStrategy::Phone => {
                vec![text(Scalar::PhoneNumber), text(Scalar::CountryCode)]
            }
            ExtractionStrategy::SingleSelect => {
                vec![column(Scalar::Selection.key(), AnswerField::Selection)]
            }
            ExtractionStrategy::Text => vec![text(Scalar::Text)],
            ExtractionStrategy::Skip => Vec::new(),
        };
        Ok(columns)
    }

    /// Answer entries for the JSON document, keyed by applicant path.
    pub fn json_entries(
        self,
        question: &ApplicantQuestion<'_>,
        settings: &ExportSettings,
    ) -> Result<Vec<(Path, ExportValue)>, ExportError> {
        let at = |key: &str| question.path().join(key);
        let string = |scalar: Scalar| -> Result<(Path, ExportValue), ExportError> {
            Ok((
                at(scalar.key()),
                ExportValue::string_or_null(question.read_string(scalar)?),
            ))
        };

        let entries = match self {
            ExtractionStrategy::Address => {
                let mut entries = Scalar::ADDRESS
                    .iter()
                    .filter(|scalar| **scalar != Scalar::ServiceAreas)
                    .map(|scalar| string(*scalar))
                    .collect::<Result<Vec<_>, _>>()?;
                let areas = read_service_areas(question)?.map(|areas| format_service_areas(&areas));
                entries.push((at(SERVICE_AREA_KEY), ExportValue::string_or_null(areas)));
                entries
            }
            ExtractionStrategy::Currency => {
                let dollars = question
                    .read_i64(Scalar::CurrencyCents)?
                    .map_or(ExportValue::Null, |cents| {
                        ExportValue::Float(cents_to_dollars(cents))
                    });
                vec![(at(CURRENCY_DOLLARS_KEY), dollars)]
            }
            ExtractionStrategy::Date => {
                let date = read_date(question)?.map(format_iso_date);
                vec![(at(Scalar::Date.key()), ExportValue::string_or_null(date))]
            }
            ExtractionStrategy::Email => vec![string(Scalar::Email)?],
            ExtractionStrategy::FileUpload if settings.multiple_file_upload_enabled => {
                let value = if question.is_answered() {
                    ExportValue::list(file_urls(question, settings)?)
                } else {
                    ExportValue::Null
                };
                vec![(at(FILE_URLS_KEY), value)]
            }
            ExtractionStrategy::FileUpload => {
                let url = question
                    .read_string(Scalar::FileKey)?
                    .map(|key| file_url(&settings.base_url, &key));
                vec![(at(Scalar::FileKey.key()), ExportValue::string_or_null(url))]
            }
            ExtractionStrategy::Id => vec![string(Scalar::Id)?],
            ExtractionStrategy::MultiSelect => {
                let selected = selected_admin_names(question)?.unwrap_or_default();
                vec![(at(Scalar::Selections.key()), ExportValue::list(selected))]
            }
            ExtractionStrategy::Name => Scalar::NAME
                .iter()
                .map(|scalar| string(*scalar))
                .collect::<Result<Vec<_>, _>>()?,
            ExtractionStrategy::Number => {
                let number = question
                    .read_i64(Scalar::Number)?
                    .map_or(ExportValue::Null, ExportValue::Integer);
                vec![(at(Scalar::Number.key()), number)]
            }
            ExtractionStrategy::Phone => {
                let number = question.read_string(Scalar::PhoneNumber)?;
                let country = question.read_string(Scalar::CountryCode)?;
                let value = match (number, country) {
                    (Some(number), Some(country)) => {
                        let formatted = format_e164(&number, &country).map_err(|err| {
                            relocate(err, &question.scalar_path(Scalar::PhoneNumber))
                        })?;
                        ExportValue::String(formatted)
                    }
                    _ => ExportValue::Null,
                };
                vec![(at(Scalar::PhoneNumber.key()), value)]
            }
            ExtractionStrategy::SingleSelect => {
                let selection = selected_admin_name(question)?;
                vec![(
                    at(Scalar::Selection.key()),
                    ExportValue::string_or_null(selection),
                )]
            }
            ExtractionStrategy::Text => vec![string(Scalar::Text)?],
            ExtractionStrategy::Skip => Vec::new(),
        };
        Ok(entries)
    }
}

fn relocate(error: ExportError, path: &Path) -> ExportError {
    match error {
        ExportError::InvalidAnswer { reason, .. } => ExportError::InvalidAnswer {
            path: path.to_string(),
            reason,
        },
        other => other,
    }
}

fn read_service_areas(
    question: &ApplicantQuestion<'_>,
) -> Result<Option<Vec<ServiceAreaInclusion>>, ExportError> {
    let path = question.scalar_path(Scalar::ServiceAreas);
    let Some(raw) = question.data().value_at(&path) else {
        return Ok(None);
    };
    serde_json::from_value(raw.clone())
        .map(Some)
        .map_err(|err| ExportError::InvalidAnswer {
            path: path.to_string(),
            reason: err.to_string(),
        })
}

fn read_date(question: &ApplicantQuestion<'_>) -> Result<Option<NaiveDate>, ExportError> {
    let path = question.scalar_path(Scalar::Date);
    let parsed = match question.data().value_at(&path) {
        None => return Ok(None),
        Some(Value::Number(millis)) => millis.as_i64().and_then(date_from_epoch_millis),
        Some(Value::String(raw)) => parse_iso_date(raw),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| ExportError::InvalidAnswer {
        path: path.to_string(),
        reason: "expected an ISO date or epoch milliseconds".to_string(),
    })
}

fn admin_name_for(question: &ApplicantQuestion<'_>, option_id: u64) -> Result<String, ExportError> {
    question
        .definition()
        .option_admin_name(option_id)
        .map(str::to_string)
        .ok_or_else(|| ExportError::InvalidAnswer {
            path: question.path().to_string(),
            reason: format!("option {option_id} is not defined for this question"),
        })
}

fn selected_admin_name(question: &ApplicantQuestion<'_>) -> Result<Option<String>, ExportError> {
    let Some(id) = question.read_i64(Scalar::Selection)? else {
        return Ok(None);
    };
    let id = u64::try_from(id).map_err(|_| ExportError::InvalidAnswer {
        path: question.scalar_path(Scalar::Selection).to_string(),
        reason: format!("option id {id} is negative"),
    })?;
    admin_name_for(question, id).map(Some)
}

fn selected_admin_names(
    question: &ApplicantQuestion<'_>,
) -> Result<Option<Vec<String>>, ExportError> {
    let Some(ids) = question.read_id_list(Scalar::Selections)? else {
        return Ok(None);
    };
    ids.into_iter()
        .map(|id| admin_name_for(question, id))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn file_urls(
    question: &ApplicantQuestion<'_>,
    settings: &ExportSettings,
) -> Result<Vec<String>, ExportError> {
    let keys = if settings.multiple_file_upload_enabled {
        question
            .read_string_list(Scalar::FileKeyList)?
            .unwrap_or_default()
    } else {
        question.read_string(Scalar::FileKey)?.into_iter().collect()
    };
    Ok(keys
        .iter()
        .map(|key| file_url(&settings.base_url, key))
        .collect())
}
