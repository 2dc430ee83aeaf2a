//! Per-application JSON documents with a stable, schema-complete shape.

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::format::format_json_timestamp;
use super::schema::find_version;
use super::strategy::strategy_for;
use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::answer::put_at;
use crate::model::{
    contextualize, ApplicantData, ApplicantQuestion, Application, LifecycleStage, Path,
    ProgramDefinition,
};

const QUESTION_TYPE_KEY: &str = "question_type";

/// Whether an application was submitted to the live version of its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionState {
    Current,
    Obsolete,
}

impl RevisionState {
    pub fn from_stage(stage: LifecycleStage) -> Result<Self, ExportError> {
        match stage {
            LifecycleStage::Active => Ok(Self::Current),
            LifecycleStage::Obsolete => Ok(Self::Obsolete),
            other => Err(ExportError::UnsupportedState(other.as_str().to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Obsolete => "OBSOLETE",
        }
    }
}

/// Null-valued skeleton covering every question of every version.
///
/// Kept serialized and re-parsed per application so each document starts
/// from an independent deep copy.
#[derive(Debug, Clone)]
pub struct JsonTemplate {
    document: String,
}

impl JsonTemplate {
    pub fn build(
        versions: &[ProgramDefinition],
        settings: &ExportSettings,
    ) -> Result<Self, ExportError> {
        let mut root = Value::Object(Map::new());
        for program in versions {
            for question in contextualize(program, ApplicantData::empty_ref()) {
                write_question(&mut root, &question, settings)?;
            }
        }
        Ok(Self {
            document: serde_json::to_string(&root)?,
        })
    }

    pub fn instantiate(&self) -> Result<Value, ExportError> {
        Ok(serde_json::from_str(&self.document)?)
    }
}

pub(crate) fn application_path(path: &Path) -> Result<Path, ExportError> {
    path.as_nested_entities_path()
        .as_application_path()
        .ok_or_else(|| {
            ExportError::Configuration(format!("answer path '{path}' is not rooted at applicant"))
        })
}

fn write_question(
    document: &mut Value,
    question: &ApplicantQuestion<'_>,
    settings: &ExportSettings,
) -> Result<(), ExportError> {
    let question_type = question.question_type();
    let strategy = strategy_for(question_type);
    if strategy.is_skip() {
        return Ok(());
    }

    let base = application_path(question.path())?;
    put_at(
        document,
        &base.join(QUESTION_TYPE_KEY),
        Value::from(question_type.external_name()),
    );
    for (path, value) in strategy.json_entries(question, settings)? {
        put_at(document, &application_path(&path)?, value.into_json());
    }
    Ok(())
}

fn optional(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}

/// Builds JSON documents for applications across program versions.
#[derive(Debug, Clone, Copy)]
pub struct JsonExporter<'s> {
    settings: &'s ExportSettings,
}

impl<'s> JsonExporter<'s> {
    pub fn new(settings: &'s ExportSettings) -> Self {
        Self { settings }
    }

    /// One document per application, in input order.
    pub fn export_documents(
        &self,
        versions: &[ProgramDefinition],
        applications: &[Application],
    ) -> Result<Vec<Value>, ExportError> {
        let template = JsonTemplate::build(versions, self.settings)?;
        let documents = applications
            .iter()
            .map(|application| {
                let program = find_version(versions, application.program_version_id)?;
                self.export_application(&template, application, program)
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(documents = documents.len(), "built json export");
        Ok(documents)
    }

    pub fn export(
        &self,
        versions: &[ProgramDefinition],
        applications: &[Application],
    ) -> Result<String, ExportError> {
        let documents = self.export_documents(versions, applications)?;
        Ok(serde_json::to_string(&documents)?)
    }

    /// Overlay one application's answers onto a fresh copy of `template`.
    pub fn export_application(
        &self,
        template: &JsonTemplate,
        application: &Application,
        program: &ProgramDefinition,
    ) -> Result<Value, ExportError> {
        let revision_state = RevisionState::from_stage(application.lifecycle_stage)?;
        let mut document = template.instantiate()?;

        for question in contextualize(program, &application.applicant_data) {
            write_question(&mut document, &question, self.settings)?;
        }

        let zone = self.settings.time_zone;
        let fields = [
            ("program_name", Value::from(program.admin_name.clone())),
            ("program_version_id", Value::from(program.id)),
            ("applicant_id", Value::from(application.applicant_id)),
            ("application_id", Value::from(application.id)),
            ("language", Value::from(application.language.clone())),
            (
                "create_time",
                Value::from(format_json_timestamp(application.create_time, zone)),
            ),
            (
                "submit_time",
                optional(
                    application
                        .submit_time
                        .map(|time| format_json_timestamp(time, zone)),
                ),
            ),
            (
                "submitter_type",
                Value::from(application.submitter_type().as_str()),
            ),
            (
                "ti_email",
                Value::from(application.submitter_email.clone().unwrap_or_default()),
            ),
            (
                "ti_organization",
                Value::from(application.ti_organization.clone().unwrap_or_default()),
            ),
            ("status", optional(application.latest_status.clone())),
            ("application_note", optional(application.admin_note.clone())),
            ("revision_state", Value::from(revision_state.as_str())),
        ];
        for (key, value) in fields {
            put_at(&mut document, &Path::parse(key), value);
        }

        debug!(application_id = application.id, "built json document");
        Ok(document)
    }
}
