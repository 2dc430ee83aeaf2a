use std::collections::HashMap;
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::migration::{resolve_program, StoredProgram, StoredQuestion};
use super::{DemographicQuestionSource, HistoricOptionLookup, ProgramStore, StoreError};
use crate::error::ExportError;
use crate::model::{Application, ProgramDefinition, QuestionDefinition, QuestionTag};

/// Serialized snapshot of questions, program versions, and applications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportDataset {
    #[serde(default)]
    pub questions: Vec<StoredQuestion>,
    #[serde(default)]
    pub programs: Vec<StoredProgram>,
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl ExportDataset {
    pub fn from_json_str(raw: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<FsPath>) -> Result<Self, ExportError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Validate the snapshot into a store, handing back the applications.
    pub fn into_store(self) -> Result<(InMemoryExportStore, Vec<Application>), ExportError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let catalog: HashMap<u64, QuestionDefinition> = questions
            .iter()
            .map(|question| (question.id, question.clone()))
            .collect();
        let programs = self
            .programs
            .into_iter()
            .map(|program| resolve_program(program, &catalog))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            questions = questions.len(),
            programs = programs.len(),
            applications = self.applications.len(),
            "loaded export dataset"
        );
        Ok((
            InMemoryExportStore::new(programs, questions),
            self.applications,
        ))
    }
}

/// Store backed by fully resolved in-memory definitions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExportStore {
    programs: Vec<ProgramDefinition>,
    questions: Vec<QuestionDefinition>,
}

impl InMemoryExportStore {
    pub fn new(mut programs: Vec<ProgramDefinition>, mut questions: Vec<QuestionDefinition>) -> Self {
        programs.sort_by_key(|program| program.id);
        questions.sort_by_key(|question| question.id);
        Self {
            programs,
            questions,
        }
    }

    /// Every question definition known to the store, including those only embedded in programs.
    fn all_question_versions(&self) -> impl Iterator<Item = &QuestionDefinition> {
        self.questions
            .iter()
            .chain(self.programs.iter().flat_map(|program| program.questions()))
    }
}

impl ProgramStore for InMemoryExportStore {
    fn all_versions(&self, program_id: u64) -> Result<Vec<ProgramDefinition>, StoreError> {
        let anchor = self.program_version(program_id)?;
        Ok(self
            .programs
            .iter()
            .filter(|program| program.admin_name == anchor.admin_name)
            .cloned()
            .collect())
    }

    fn program_version(&self, version_id: u64) -> Result<ProgramDefinition, StoreError> {
        self.programs
            .iter()
            .find(|program| program.id == version_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("program version {version_id}")))
    }
}

impl HistoricOptionLookup for InMemoryExportStore {
    fn historic_option_admin_names(&self, question_name: &str) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = Vec::new();
        let mut versions: Vec<&QuestionDefinition> = self
            .all_question_versions()
            .filter(|question| question.name == question_name)
            .collect();
        versions.sort_by_key(|question| question.id);
        for question in versions {
            for option in question.options() {
                if !names.contains(&option.admin_name) {
                    names.push(option.admin_name.clone());
                }
            }
        }
        Ok(names)
    }
}

impl DemographicQuestionSource for InMemoryExportStore {
    /// Latest version of every question carrying a demographic tag.
    fn demographic_questions(&self) -> Result<Vec<QuestionDefinition>, StoreError> {
        let mut latest: Vec<QuestionDefinition> = Vec::new();
        for question in self.all_question_versions().filter(|question| {
            question.has_tag(QuestionTag::Demographic) || question.has_tag(QuestionTag::DemographicPii)
        }) {
            match latest.iter_mut().find(|known| known.name == question.name) {
                Some(known) if known.id < question.id => *known = question.clone(),
                Some(_) => {}
                None => latest.push(question.clone()),
            }
        }
        Ok(latest)
    }
}
