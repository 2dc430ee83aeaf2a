use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::csv::{into_text, CsvExporter};
use super::json::JsonExporter;
use super::sampler::QuestionSampler;
use super::schema::{
    answers_by_path, demographic_questions, demographics_export_config, find_version,
    program_export_config, unify_questions,
};
use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::{ApplicantQuestion, Application, Path};
use crate::store::ExportStore;

/// Facade over the CSV, JSON, and preview exporters.
pub struct ExportService<S> {
    store: Arc<S>,
    settings: ExportSettings,
}

impl<S> ExportService<S>
where
    S: ExportStore + 'static,
{
    pub fn new(store: Arc<S>, settings: ExportSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Applications submitted to any version of `program_id`.
    pub fn applications_for_program(
        &self,
        program_id: u64,
        applications: &[Application],
    ) -> Result<Vec<Application>, ExportError> {
        let versions = self.store.all_versions(program_id)?;
        Ok(applications
            .iter()
            .filter(|application| {
                versions
                    .iter()
                    .any(|program| program.id == application.program_version_id)
            })
            .cloned()
            .collect())
    }

    /// One CSV covering every version of the program, one row per application.
    pub fn program_all_versions_csv(
        &self,
        program_id: u64,
        applications: &[Application],
    ) -> Result<String, ExportError> {
        let versions = self.store.all_versions(program_id)?;
        let current = self.store.current_version(program_id)?;
        let questions = unify_questions(&versions, applications)?;
        let config = program_export_config(
            &questions,
            current.eligibility_enabled,
            &self.settings,
            self.store.as_ref(),
        )?;

        let mut exporter = CsvExporter::new(Vec::new(), &config, &self.settings)?;
        for application in applications {
            let program = find_version(&versions, application.program_version_id)?;
            let answers = answers_by_path(&versions, application)?;
            exporter.export_record(application, &program.admin_name, &answers)?;
        }
        info!(
            program_id,
            versions = versions.len(),
            columns = config.columns().len(),
            rows = exporter.rows(),
            "exported program csv"
        );
        into_text(exporter.finish()?)
    }

    /// JSON array of application documents for every version of the program.
    pub fn program_json(
        &self,
        program_id: u64,
        applications: &[Application],
    ) -> Result<String, ExportError> {
        let versions = self.store.all_versions(program_id)?;
        let exported = JsonExporter::new(&self.settings).export(&versions, applications)?;
        info!(program_id, applications = applications.len(), "exported program json");
        Ok(exported)
    }

    /// Cross-program CSV of demographic answers with PII hashed.
    pub fn demographics_csv(&self, applications: &[Application]) -> Result<String, ExportError> {
        let catalog = self.store.demographic_questions()?;
        let questions = demographic_questions(&catalog);
        let config = demographics_export_config(&questions, &self.settings, self.store.as_ref())?;

        let mut exporter = CsvExporter::new(Vec::new(), &config, &self.settings)?;
        for application in applications {
            let program = self.store.program_version(application.program_version_id)?;
            let answers: HashMap<Path, ApplicantQuestion<'_>> = questions
                .iter()
                .map(|definition| {
                    let question =
                        ApplicantQuestion::top_level(definition, &application.applicant_data);
                    (question.path().clone(), question)
                })
                .collect();
            exporter.export_record(application, &program.admin_name, &answers)?;
        }
        info!(
            questions = questions.len(),
            rows = exporter.rows(),
            "exported demographics csv"
        );
        into_text(exporter.finish()?)
    }

    /// Pretty-printed sample document for one program version.
    pub fn preview_program_json(&self, program_id: u64) -> Result<String, ExportError> {
        let program = self.store.program_version(program_id)?;
        let document = QuestionSampler::new(&self.settings).preview_program(&program)?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Answer columns of one program version with a row of sample cells.
    pub fn preview_program_csv(&self, program_id: u64) -> Result<String, ExportError> {
        let program = self.store.program_version(program_id)?;
        QuestionSampler::new(&self.settings).preview_program_csv(&program, self.store.as_ref())
    }
}
