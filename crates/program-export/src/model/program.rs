use super::question::QuestionDefinition;

/// A screen of questions within one program version.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    pub id: u64,
    pub name: String,
    pub questions: Vec<QuestionDefinition>,
}

impl BlockDefinition {
    pub fn new(id: u64, name: impl Into<String>, questions: Vec<QuestionDefinition>) -> Self {
        Self {
            id,
            name: name.into(),
            questions,
        }
    }
}

/// One immutable version of a program.
///
/// Versions of the same program share `admin_name`; `id` identifies the version.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDefinition {
    pub id: u64,
    pub admin_name: String,
    pub blocks: Vec<BlockDefinition>,
    pub eligibility_enabled: bool,
}

impl ProgramDefinition {
    pub fn new(id: u64, admin_name: impl Into<String>, blocks: Vec<BlockDefinition>) -> Self {
        Self {
            id,
            admin_name: admin_name.into(),
            blocks,
            eligibility_enabled: false,
        }
    }

    pub fn with_eligibility(mut self, enabled: bool) -> Self {
        self.eligibility_enabled = enabled;
        self
    }

    /// Questions in block order.
    pub fn questions(&self) -> impl Iterator<Item = &QuestionDefinition> {
        self.blocks.iter().flat_map(|block| block.questions.iter())
    }

    pub fn question_by_id(&self, question_id: u64) -> Option<&QuestionDefinition> {
        self.questions().find(|question| question.id == question_id)
    }

    /// Questions collected by the enumerator with `enumerator_id`.
    pub fn repeated_questions(
        &self,
        enumerator_id: u64,
    ) -> impl Iterator<Item = &QuestionDefinition> {
        self.questions()
            .filter(move |question| question.enumerator_id == Some(enumerator_id))
    }
}
