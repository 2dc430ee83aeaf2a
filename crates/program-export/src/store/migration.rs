use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExportError;
use crate::model::{
    BlockDefinition, ProgramDefinition, QuestionDefinition, QuestionKind, QuestionOption,
    QuestionTag, QuestionType,
};

const DEFAULT_LOCALES: [&str; 2] = ["en_US", "en-US"];

/// Question row as persisted, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub id: u64,
    pub name: String,
    pub question_type: String,
    #[serde(default)]
    pub enumerator_id: Option<u64>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<QuestionTag>,
    #[serde(default)]
    pub question_options: Vec<QuestionOption>,
    /// Older rows carry only localized option labels.
    #[serde(default)]
    pub legacy_question_options: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBlock {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub question_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProgram {
    pub id: u64,
    pub admin_name: String,
    #[serde(default)]
    pub eligibility_enabled: bool,
    pub blocks: Vec<StoredBlock>,
}

impl StoredQuestion {
    /// Fill `question_options` from legacy localized labels when the row predates them.
    ///
    /// Returns true when the row changed. Running it again is a no-op.
    pub fn migrate_legacy_options(&mut self) -> bool {
        if !self.question_options.is_empty() || self.legacy_question_options.is_empty() {
            return false;
        }
        let labels = DEFAULT_LOCALES
            .iter()
            .find_map(|locale| self.legacy_question_options.get(*locale))
            .or_else(|| self.legacy_question_options.values().next());
        let Some(labels) = labels else {
            return false;
        };

        self.question_options = labels
            .iter()
            .enumerate()
            .map(|(index, label)| QuestionOption {
                id: index as u64,
                admin_name: label.clone(),
                label: label.clone(),
            })
            .collect();
        self.legacy_question_options.clear();
        true
    }
}

impl TryFrom<StoredQuestion> for QuestionDefinition {
    type Error = ExportError;

    fn try_from(mut stored: StoredQuestion) -> Result<Self, Self::Error> {
        if stored.migrate_legacy_options() {
            info!(question = %stored.name, "migrated legacy question options");
        }
        let question_type: QuestionType = stored.question_type.parse()?;
        let options = std::mem::take(&mut stored.question_options);
        let kind = match question_type {
            QuestionType::Address => QuestionKind::Address,
            QuestionType::Checkbox => QuestionKind::Checkbox { options },
            QuestionType::Currency => QuestionKind::Currency,
            QuestionType::Date => QuestionKind::Date,
            QuestionType::Dropdown => QuestionKind::Dropdown { options },
            QuestionType::Email => QuestionKind::Email,
            QuestionType::Enumerator => QuestionKind::Enumerator {
                entity_type: stored.entity_type.unwrap_or_else(|| "entity".to_string()),
            },
            QuestionType::FileUpload => QuestionKind::FileUpload,
            QuestionType::Id => QuestionKind::Id,
            QuestionType::Name => QuestionKind::Name,
            QuestionType::Number => QuestionKind::Number,
            QuestionType::Phone => QuestionKind::Phone,
            QuestionType::RadioButton => QuestionKind::RadioButton { options },
            QuestionType::Static => QuestionKind::Static,
            QuestionType::Text => QuestionKind::Text,
        };

        let definition = QuestionDefinition {
            id: stored.id,
            name: stored.name,
            kind,
            enumerator_id: stored.enumerator_id,
            tags: stored.tags,
        };
        if !definition.name_key().chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(ExportError::Configuration(format!(
                "question {} name '{}' has no letters to form an answer path",
                definition.id, definition.name
            )));
        }
        Ok(definition)
    }
}

/// Resolve a stored program against the validated question catalog.
pub(crate) fn resolve_program(
    stored: StoredProgram,
    questions: &HashMap<u64, QuestionDefinition>,
) -> Result<ProgramDefinition, ExportError> {
    let blocks = stored
        .blocks
        .into_iter()
        .map(|block| {
            let resolved = block
                .question_ids
                .iter()
                .map(|id| {
                    questions.get(id).cloned().ok_or_else(|| {
                        ExportError::MissingReference(format!(
                            "question {id} referenced by program {}",
                            stored.id
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BlockDefinition::new(block.id, block.name, resolved))
        })
        .collect::<Result<Vec<_>, ExportError>>()?;

    Ok(ProgramDefinition::new(stored.id, stored.admin_name, blocks)
        .with_eligibility(stored.eligibility_enabled))
}
