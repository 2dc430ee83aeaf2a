//! Read-side collaborators the exporters depend on.

mod memory;
mod migration;

pub use memory::{ExportDataset, InMemoryExportStore};
pub use migration::{StoredBlock, StoredProgram, StoredQuestion};

use crate::error::ExportError;
use crate::model::{ProgramDefinition, QuestionDefinition};

/// Lookup of program versions.
pub trait ProgramStore: Send + Sync {
    /// Every version of the program that `program_id` belongs to, oldest first.
    fn all_versions(&self, program_id: u64) -> Result<Vec<ProgramDefinition>, StoreError>;
    fn program_version(&self, version_id: u64) -> Result<ProgramDefinition, StoreError>;

    /// Newest version of the program that `program_id` belongs to.
    fn current_version(&self, program_id: u64) -> Result<ProgramDefinition, StoreError> {
        self.all_versions(program_id)?
            .into_iter()
            .max_by_key(|program| program.id)
            .ok_or_else(|| StoreError::NotFound(format!("program {program_id}")))
    }
}

/// Option admin names a multi-select question has carried across all of its versions.
pub trait HistoricOptionLookup: Send + Sync {
    fn historic_option_admin_names(&self, question_name: &str) -> Result<Vec<String>, StoreError>;
}

/// Questions tagged for the demographics export.
pub trait DemographicQuestionSource: Send + Sync {
    fn demographic_questions(&self) -> Result<Vec<QuestionDefinition>, StoreError>;
}

/// Everything the export service reads.
pub trait ExportStore: ProgramStore + HistoricOptionLookup + DemographicQuestionSource {}

impl<T> ExportStore for T where T: ProgramStore + HistoricOptionLookup + DemographicQuestionSource {}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
}

impl From<StoreError> for ExportError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ExportError::MissingReference(what),
        }
    }
}
