use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path::{split_index, Path};
use super::program::ProgramDefinition;
use super::question::{QuestionDefinition, QuestionKind, QuestionType};
use crate::error::ExportError;

/// Leaf keys under a question path where answer values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Street,
    Line2,
    City,
    State,
    Zip,
    Corrected,
    Latitude,
    Longitude,
    WellKnownId,
    ServiceAreas,
    CurrencyCents,
    Date,
    Email,
    EntityName,
    FileKey,
    FileKeyList,
    FirstName,
    MiddleName,
    LastName,
    NameSuffix,
    Id,
    Number,
    PhoneNumber,
    CountryCode,
    Selection,
    Selections,
    Text,
}

impl Scalar {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::Line2 => "line2",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Corrected => "corrected",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::WellKnownId => "well_known_id",
            Self::ServiceAreas => "service_areas",
            Self::CurrencyCents => "currency_cents",
            Self::Date => "date",
            Self::Email => "email",
            Self::EntityName => "entity_name",
            Self::FileKey => "file_key",
            Self::FileKeyList => "file_key_list",
            Self::FirstName => "first_name",
            Self::MiddleName => "middle_name",
            Self::LastName => "last_name",
            Self::NameSuffix => "name_suffix",
            Self::Id => "id",
            Self::Number => "number",
            Self::PhoneNumber => "phone_number",
            Self::CountryCode => "country_code",
            Self::Selection => "selection",
            Self::Selections => "selections",
            Self::Text => "text",
        }
    }

    pub const ADDRESS: [Scalar; 10] = [
        Self::Street,
        Self::Line2,
        Self::City,
        Self::State,
        Self::Zip,
        Self::Corrected,
        Self::Latitude,
        Self::Longitude,
        Self::WellKnownId,
        Self::ServiceAreas,
    ];

    pub const NAME: [Scalar; 4] = [
        Self::FirstName,
        Self::MiddleName,
        Self::LastName,
        Self::NameSuffix,
    ];

    /// Scalars whose presence marks a question of `question_type` as answered.
    pub fn for_type(question_type: QuestionType) -> &'static [Scalar] {
        match question_type {
            QuestionType::Address => &Self::ADDRESS,
            QuestionType::Checkbox => &[Self::Selections],
            QuestionType::Currency => &[Self::CurrencyCents],
            QuestionType::Date => &[Self::Date],
            QuestionType::Dropdown | QuestionType::RadioButton => &[Self::Selection],
            QuestionType::Email => &[Self::Email],
            QuestionType::Enumerator | QuestionType::Static => &[],
            QuestionType::FileUpload => &[Self::FileKey, Self::FileKeyList],
            QuestionType::Id => &[Self::Id],
            QuestionType::Name => &Self::NAME,
            QuestionType::Number => &[Self::Number],
            QuestionType::Phone => &[Self::PhoneNumber, Self::CountryCode],
            QuestionType::Text => &[Self::Text],
        }
    }
}

/// Answer tree of one application, rooted at `{"applicant": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantData(Value);

static EMPTY: ApplicantData = ApplicantData(Value::Null);

impl ApplicantData {
    pub fn new(root: Value) -> Self {
        Self(root)
    }

    /// Shared empty answer tree used when expanding a version without an application.
    pub fn empty_ref() -> &'static ApplicantData {
        &EMPTY
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    /// Value stored at `path`; JSON nulls read as absent.
    pub fn value_at(&self, path: &Path) -> Option<&Value> {
        value_at(&self.0, path)
    }

    pub fn has_value(&self, path: &Path) -> bool {
        self.value_at(path).is_some()
    }

    pub fn put(&mut self, path: &Path, value: Value) {
        put_at(&mut self.0, path, value);
    }

    pub fn read_string(&self, path: &Path) -> Result<Option<String>, ExportError> {
        match self.value_at(path) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
            Some(other) => Err(invalid(path, format!("expected a string, found {other}"))),
        }
    }

    pub fn read_i64(&self, path: &Path) -> Result<Option<i64>, ExportError> {
        match self.value_at(path) {
            None => Ok(None),
            Some(Value::Number(number)) => number
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(path, format!("expected an integer, found {number}"))),
            Some(Value::String(text)) => text
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(path, format!("expected an integer, found '{text}'"))),
            Some(other) => Err(invalid(path, format!("expected an integer, found {other}"))),
        }
    }

    pub fn read_f64(&self, path: &Path) -> Result<Option<f64>, ExportError> {
        match self.value_at(path) {
            None => Ok(None),
            Some(Value::Number(number)) => number
                .as_f64()
                .map(Some)
                .ok_or_else(|| invalid(path, format!("expected a number, found {number}"))),
            Some(Value::String(text)) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| invalid(path, format!("expected a number, found '{text}'"))),
            Some(other) => Err(invalid(path, format!("expected a number, found {other}"))),
        }
    }

    /// Option ids stored as a JSON array of integers.
    pub fn read_id_list(&self, path: &Path) -> Result<Option<Vec<u64>>, ExportError> {
        let Some(value) = self.value_at(path) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| invalid(path, format!("expected a list, found {value}")))?;
        items
            .iter()
            .map(|item| match item {
                Value::Number(number) => number
                    .as_u64()
                    .ok_or_else(|| invalid(path, format!("invalid option id {number}"))),
                Value::String(text) => text
                    .parse::<u64>()
                    .map_err(|_| invalid(path, format!("invalid option id '{text}'"))),
                other => Err(invalid(path, format!("invalid option id {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub fn read_string_list(&self, path: &Path) -> Result<Option<Vec<String>>, ExportError> {
        let Some(value) = self.value_at(path) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| invalid(path, format!("expected a list, found {value}")))?;
        items
            .iter()
            .map(|item| match item {
                Value::String(text) => Ok(text.clone()),
                other => Err(invalid(path, format!("expected a string entry, found {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Number of repeated entities stored under an enumerator path.
    pub fn entity_count(&self, path: &Path) -> usize {
        self.value_at(&path.without_array_reference())
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

fn invalid(path: &Path, reason: String) -> ExportError {
    ExportError::InvalidAnswer {
        path: path.to_string(),
        reason,
    }
}

pub(crate) fn value_at<'v>(root: &'v Value, path: &Path) -> Option<&'v Value> {
    let mut cursor = root;
    for segment in path.segments() {
        let (key, index) = split_index(segment);
        cursor = cursor.get(key)?;
        if let Some(raw) = index {
            cursor = cursor.get(raw.parse::<usize>().ok()?)?;
        }
    }
    Some(cursor).filter(|value| !value.is_null())
}

/// Write `value` at `path`, creating intermediate objects and array slots.
pub(crate) fn put_at(root: &mut Value, path: &Path, value: Value) {
    let mut cursor = root;
    for segment in path.segments() {
        let (key, index) = split_index(segment);
        cursor = child_mut(cursor, key);
        if let Some(index) = index.and_then(|raw| raw.parse::<usize>().ok()) {
            cursor = element_mut(cursor, index);
        }
    }
    *cursor = value;
}

fn child_mut<'v>(parent: &'v mut Value, key: &str) -> &'v mut Value {
    if !parent.is_object() {
        *parent = Value::Object(Map::new());
    }
    match parent {
        Value::Object(map) => map.entry(key.to_string()).or_insert(Value::Null),
        other => other,
    }
}

fn element_mut(parent: &mut Value, index: usize) -> &mut Value {
    if !parent.is_array() {
        *parent = Value::Array(Vec::new());
    }
    match parent {
        Value::Array(items) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        other => other,
    }
}

/// A question definition bound to the answer tree and its contextualized path.
#[derive(Debug, Clone)]
pub struct ApplicantQuestion<'a> {
    definition: &'a QuestionDefinition,
    path: Path,
    data: &'a ApplicantData,
}

impl<'a> ApplicantQuestion<'a> {
    pub fn new(definition: &'a QuestionDefinition, path: Path, data: &'a ApplicantData) -> Self {
        Self {
            definition,
            path,
            data,
        }
    }

    /// Bind a non-repeated question at `applicant.<name_key>`.
    pub fn top_level(definition: &'a QuestionDefinition, data: &'a ApplicantData) -> Self {
        let path = Path::applicant().join(&definition.name_key());
        Self::new(definition, path, data)
    }

    pub fn definition(&self) -> &'a QuestionDefinition {
        self.definition
    }

    pub fn question_type(&self) -> QuestionType {
        self.definition.question_type()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &'a ApplicantData {
        self.data
    }

    pub fn scalar_path(&self, scalar: Scalar) -> Path {
        self.path.join(scalar.key())
    }

    pub fn read_string(&self, scalar: Scalar) -> Result<Option<String>, ExportError> {
        self.data.read_string(&self.scalar_path(scalar))
    }

    pub fn read_i64(&self, scalar: Scalar) -> Result<Option<i64>, ExportError> {
        self.data.read_i64(&self.scalar_path(scalar))
    }

    pub fn read_f64(&self, scalar: Scalar) -> Result<Option<f64>, ExportError> {
        self.data.read_f64(&self.scalar_path(scalar))
    }

    pub fn read_id_list(&self, scalar: Scalar) -> Result<Option<Vec<u64>>, ExportError> {
        self.data.read_id_list(&self.scalar_path(scalar))
    }

    pub fn read_string_list(&self, scalar: Scalar) -> Result<Option<Vec<String>>, ExportError> {
        self.data.read_string_list(&self.scalar_path(scalar))
    }

    pub fn is_answered(&self) -> bool {
        Scalar::for_type(self.question_type())
            .iter()
            .any(|scalar| self.data.has_value(&self.scalar_path(*scalar)))
    }
}

/// Bind every question of `program` to `data`, expanding repeated entities.
///
/// Enumerators appear before the questions they collect; one copy of each
/// repeated question is produced per stored entity.
pub fn contextualize<'a>(
    program: &'a ProgramDefinition,
    data: &'a ApplicantData,
) -> Vec<ApplicantQuestion<'a>> {
    let mut questions = Vec::new();
    for question in program.questions().filter(|question| !question.is_repeated()) {
        expand(program, question, &Path::applicant(), data, &mut questions);
    }
    questions
}

fn expand<'a>(
    program: &'a ProgramDefinition,
    question: &'a QuestionDefinition,
    parent: &Path,
    data: &'a ApplicantData,
    out: &mut Vec<ApplicantQuestion<'a>>,
) {
    let path = parent.join(&question.name_key());
    out.push(ApplicantQuestion::new(question, path.clone(), data));

    if let QuestionKind::Enumerator { .. } = question.kind {
        for index in 0..data.entity_count(&path) {
            let entity = path.at_index(index);
            for child in program
                .repeated_questions(question.id)
                .filter(|child| child.id != question.id)
            {
                expand(program, child, &entity, data, out);
            }
        }
    }
}
