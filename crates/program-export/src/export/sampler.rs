//! Fabricated answers used to preview export shapes before any real submissions exist.

use ::csv::WriterBuilder;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::csv::into_text;
use super::json::JsonExporter;
use super::schema::ColumnType;
use super::strategy::strategy_for;
use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::model::{
    ApplicantData, ApplicantQuestion, Application, LifecycleStage, Path, ProgramDefinition,
    QuestionDefinition, QuestionKind, Scalar,
};
use crate::store::HistoricOptionLookup;

const SAMPLE_TIMESTAMP: i64 = 1_709_069_741;

/// Writes a plausible answer for each question type.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSampler<'s> {
    settings: &'s ExportSettings,
}

impl<'s> QuestionSampler<'s> {
    pub fn new(settings: &'s ExportSettings) -> Self {
        Self { settings }
    }

    /// Store a sample answer for `definition` under `path`.
    pub fn sample_answer(
        &self,
        definition: &QuestionDefinition,
        path: &Path,
        data: &mut ApplicantData,
    ) {
        let mut put = |scalar: Scalar, value: Value| data.put(&path.join(scalar.key()), value);
        match &definition.kind {
            QuestionKind::Address => {
                put(Scalar::Street, json!("742 Evergreen Terrace"));
                put(Scalar::City, json!("Springfield"));
                put(Scalar::State, json!("OR"));
                put(Scalar::Zip, json!("97403"));
                put(Scalar::Corrected, json!("Corrected"));
                put(Scalar::Latitude, json!(44.0462));
                put(Scalar::Longitude, json!(-123.0236));
                put(Scalar::WellKnownId, json!(4326));
                put(
                    Scalar::ServiceAreas,
                    json!([
                        {"service_area_id": "springfieldCounty", "state": "IN_AREA", "timestamp": SAMPLE_TIMESTAMP},
                        {"service_area_id": "portland", "state": "NOT_IN_AREA", "timestamp": SAMPLE_TIMESTAMP}
                    ]),
                );
            }
            QuestionKind::Checkbox { options } => {
                let ids: Vec<u64> = options.iter().take(2).map(|option| option.id).collect();
                put(Scalar::Selections, json!(ids));
            }
            QuestionKind::Currency => put(Scalar::CurrencyCents, json!(12345)),
            QuestionKind::Date => put(Scalar::Date, json!("2023-01-02")),
            QuestionKind::Dropdown { options } | QuestionKind::RadioButton { options } => {
                if let Some(option) = options.first() {
                    put(Scalar::Selection, json!(option.id));
                }
            }
            QuestionKind::Email => put(Scalar::Email, json!("homer.simpson@springfield.gov")),
            QuestionKind::FileUpload => {
                if self.settings.multiple_file_upload_enabled {
                    put(Scalar::FileKeyList, json!(["my-file-key-1", "my-file-key-2"]));
                } else {
                    put(Scalar::FileKey, json!("my-file-key-1"));
                }
            }
            QuestionKind::Id => put(Scalar::Id, json!("12345")),
            QuestionKind::Name => {
                put(Scalar::FirstName, json!("Homer"));
                put(Scalar::MiddleName, json!("Jay"));
                put(Scalar::LastName, json!("Simpson"));
                put(Scalar::NameSuffix, json!("Jr."));
            }
            QuestionKind::Number => put(Scalar::Number, json!(12321)),
            QuestionKind::Phone => {
                put(Scalar::PhoneNumber, json!("(214)-367-3764"));
                put(Scalar::CountryCode, json!("US"));
            }
            QuestionKind::Text => put(Scalar::Text, json!("Sample text answer")),
            QuestionKind::Enumerator { .. } | QuestionKind::Static => {}
        }
    }

    /// Header and cell pairs a sampled answer would produce in the program CSV.
    pub fn sample_csv_cells(
        &self,
        definition: &QuestionDefinition,
        historic: &dyn HistoricOptionLookup,
    ) -> Result<Vec<(String, String)>, ExportError> {
        if definition.is_repeated() {
            return Ok(Vec::new());
        }
        let (path, data) = self.sampled(definition);
        let question = ApplicantQuestion::new(definition, path, &data);
        strategy_for(definition.question_type())
            .columns(&question, ColumnType::ApplicantAnswer, self.settings, historic)?
            .into_iter()
            .map(|column| -> Result<(String, String), ExportError> {
                let cell = match &column.field {
                    Some(field) => field.extract(&question, self.settings)?,
                    None => String::new(),
                };
                Ok((column.header, cell))
            })
            .collect()
    }

    /// Header row plus one sample row covering the answer columns of `program`.
    pub fn preview_program_csv(
        &self,
        program: &ProgramDefinition,
        historic: &dyn HistoricOptionLookup,
    ) -> Result<String, ExportError> {
        let mut headers = Vec::new();
        let mut cells = Vec::new();
        for definition in program.questions() {
            for (header, cell) in self.sample_csv_cells(definition, historic)? {
                headers.push(header);
                cells.push(cell);
            }
        }

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&headers)?;
        writer.write_record(&cells)?;
        let buffer = writer
            .into_inner()
            .map_err(|err| ExportError::Io(err.into_error()))?;
        into_text(buffer)
    }

    /// A full JSON document for `program` filled with sample answers.
    pub fn preview_program(&self, program: &ProgramDefinition) -> Result<Value, ExportError> {
        let mut data = ApplicantData::default();
        for definition in program.questions().filter(|question| !question.is_repeated()) {
            let path = Path::applicant().join(&definition.name_key());
            self.sample_answer(definition, &path, &mut data);
        }

        let sample_time = DateTime::<Utc>::from_timestamp(SAMPLE_TIMESTAMP, 0).unwrap_or_default();
        let application = Application {
            id: 1,
            applicant_id: 1,
            program_version_id: program.id,
            language: "en-US".to_string(),
            create_time: sample_time,
            submit_time: Some(sample_time),
            submitter_email: None,
            ti_organization: None,
            lifecycle_stage: LifecycleStage::Active,
            latest_status: None,
            status_last_modified_time: None,
            admin_note: None,
            eligible: None,
            applicant_data: data,
        };

        let programs = std::slice::from_ref(program);
        JsonExporter::new(self.settings)
            .export_documents(programs, std::slice::from_ref(&application))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ExportError::MissingReference(format!("preview for program {}", program.id))
            })
    }

    fn sampled(&self, definition: &QuestionDefinition) -> (Path, ApplicantData) {
        let path = Path::applicant().join(&definition.name_key());
        let mut data = ApplicantData::default();
        self.sample_answer(definition, &path, &mut data);
        (path, data)
    }
}
