use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Closed set of question types an applicant can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Address,
    Checkbox,
    Currency,
    Date,
    Dropdown,
    Email,
    Enumerator,
    #[serde(rename = "FILEUPLOAD")]
    FileUpload,
    Id,
    Name,
    Number,
    Phone,
    RadioButton,
    Static,
    Text,
}

impl QuestionType {
    pub const ALL: [QuestionType; 15] = [
        Self::Address,
        Self::Checkbox,
        Self::Currency,
        Self::Date,
        Self::Dropdown,
        Self::Email,
        Self::Enumerator,
        Self::FileUpload,
        Self::Id,
        Self::Name,
        Self::Number,
        Self::Phone,
        Self::RadioButton,
        Self::Static,
        Self::Text,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "ADDRESS",
            Self::Checkbox => "CHECKBOX",
            Self::Currency => "CURRENCY",
            Self::Date => "DATE",
            Self::Dropdown => "DROPDOWN",
            Self::Email => "EMAIL",
            Self::Enumerator => "ENUMERATOR",
            Self::FileUpload => "FILEUPLOAD",
            Self::Id => "ID",
            Self::Name => "NAME",
            Self::Number => "NUMBER",
            Self::Phone => "PHONE",
            Self::RadioButton => "RADIO_BUTTON",
            Self::Static => "STATIC",
            Self::Text => "TEXT",
        }
    }

    /// Name used for the `question_type` field of API consumers.
    pub const fn external_name(self) -> &'static str {
        match self {
            Self::Checkbox => "MULTI_SELECT",
            Self::Dropdown | Self::RadioButton => "SINGLE_SELECT",
            Self::FileUpload => "FILE_UPLOAD",
            other => other.as_str(),
        }
    }

    /// Enumerator and static questions never carry an exportable answer.
    pub const fn is_exported(self) -> bool {
        !matches!(self, Self::Enumerator | Self::Static)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|question_type| question_type.as_str() == normalized)
            .ok_or_else(|| {
                ExportError::Configuration(format!("unrecognized question type '{value}'"))
            })
    }
}

/// Tags that pull a question into the cross-program demographics export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionTag {
    Demographic,
    DemographicPii,
}

/// A selectable option of a single or multi-select question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: u64,
    pub admin_name: String,
    #[serde(default)]
    pub label: String,
}

impl QuestionOption {
    pub fn new(id: u64, admin_name: impl Into<String>) -> Self {
        let admin_name = admin_name.into();
        Self {
            id,
            label: admin_name.clone(),
            admin_name,
        }
    }
}

/// Type-specific configuration, one variant per [`QuestionType`].
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Address,
    Checkbox { options: Vec<QuestionOption> },
    Currency,
    Date,
    Dropdown { options: Vec<QuestionOption> },
    Email,
    Enumerator { entity_type: String },
    FileUpload,
    Id,
    Name,
    Number,
    Phone,
    RadioButton { options: Vec<QuestionOption> },
    Static,
    Text,
}

impl QuestionKind {
    pub const fn question_type(&self) -> QuestionType {
        match self {
            Self::Address => QuestionType::Address,
            Self::Checkbox { .. } => QuestionType::Checkbox,
            Self::Currency => QuestionType::Currency,
            Self::Date => QuestionType::Date,
            Self::Dropdown { .. } => QuestionType::Dropdown,
            Self::Email => QuestionType::Email,
            Self::Enumerator { .. } => QuestionType::Enumerator,
            Self::FileUpload => QuestionType::FileUpload,
            Self::Id => QuestionType::Id,
            Self::Name => QuestionType::Name,
            Self::Number => QuestionType::Number,
            Self::Phone => QuestionType::Phone,
            Self::RadioButton { .. } => QuestionType::RadioButton,
            Self::Static => QuestionType::Static,
            Self::Text => QuestionType::Text,
        }
    }

    /// Options for select questions; empty for every other type.
    pub fn options(&self) -> &[QuestionOption] {
        match self {
            Self::Checkbox { options }
            | Self::Dropdown { options }
            | Self::RadioButton { options } => options,
            _ => &[],
        }
    }
}

/// Immutable, versioned definition of one applicant prompt.
///
/// `name` is the stable key shared by every version of the question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDefinition {
    pub id: u64,
    pub name: String,
    pub kind: QuestionKind,
    pub enumerator_id: Option<u64>,
    pub tags: Vec<QuestionTag>,
}

impl QuestionDefinition {
    pub fn new(id: u64, name: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            enumerator_id: None,
            tags: Vec::new(),
        }
    }

    pub fn repeated_under(mut self, enumerator_id: u64) -> Self {
        self.enumerator_id = Some(enumerator_id);
        self
    }

    pub fn tagged(mut self, tag: QuestionTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    pub fn options(&self) -> &[QuestionOption] {
        self.kind.options()
    }

    pub fn is_repeated(&self) -> bool {
        self.enumerator_id.is_some()
    }

    pub fn has_tag(&self, tag: QuestionTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Path segment derived from the name: letters and spaces kept, spaces become underscores.
    pub fn name_key(&self) -> String {
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .map(|c| {
                if c.is_whitespace() {
                    '_'
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    }

    pub fn option_admin_name(&self, option_id: u64) -> Option<&str> {
        self.options()
            .iter()
            .find(|option| option.id == option_id)
            .map(|option| option.admin_name.as_str())
    }
}
