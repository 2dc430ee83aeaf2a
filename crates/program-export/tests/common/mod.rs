#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use program_export::model::{
    ApplicantData, Application, BlockDefinition, LifecycleStage, ProgramDefinition,
    QuestionDefinition, QuestionKind, QuestionOption,
};
use program_export::store::InMemoryExportStore;
use program_export::{ExportService, ExportSettings};
use serde_json::Value;

pub fn instant(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid fixture instant")
}

pub fn application(id: u64, version_id: u64, answers: Value) -> Application {
    Application {
        id,
        applicant_id: id + 100,
        program_version_id: version_id,
        language: "en-US".to_string(),
        create_time: instant(2024, 3, 1, 9, 0),
        submit_time: Some(instant(2024, 3, 1, 9, 30)),
        submitter_email: None,
        ti_organization: None,
        lifecycle_stage: LifecycleStage::Active,
        latest_status: None,
        status_last_modified_time: None,
        admin_note: None,
        eligible: None,
        applicant_data: ApplicantData::new(answers),
    }
}

pub fn program(id: u64, questions: Vec<QuestionDefinition>) -> ProgramDefinition {
    ProgramDefinition::new(
        id,
        "utility-assistance",
        vec![BlockDefinition::new(1, "screen one", questions)],
    )
}

pub fn text(id: u64, name: &str) -> QuestionDefinition {
    QuestionDefinition::new(id, name, QuestionKind::Text)
}

pub fn colors(id: u64, options: &[(u64, &str)]) -> QuestionDefinition {
    QuestionDefinition::new(
        id,
        "colors",
        QuestionKind::Checkbox {
            options: options
                .iter()
                .map(|(option_id, name)| QuestionOption::new(*option_id, *name))
                .collect(),
        },
    )
}

/// NAME + CURRENCY program with an enumerator nobody answers.
pub fn name_and_income_program(id: u64) -> ProgramDefinition {
    program(
        id,
        vec![
            QuestionDefinition::new(1, "applicant name", QuestionKind::Name),
            QuestionDefinition::new(2, "monthly income", QuestionKind::Currency),
            QuestionDefinition::new(
                3,
                "household members",
                QuestionKind::Enumerator {
                    entity_type: "member".to_string(),
                },
            ),
            QuestionDefinition::new(4, "member income", QuestionKind::Currency).repeated_under(3),
        ],
    )
}

pub fn service(
    programs: Vec<ProgramDefinition>,
    questions: Vec<QuestionDefinition>,
    settings: ExportSettings,
) -> ExportService<InMemoryExportStore> {
    ExportService::new(
        Arc::new(InMemoryExportStore::new(programs, questions)),
        settings,
    )
}

/// Header plus data rows of a CSV export.
pub fn parse_csv(raw: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new().from_reader(raw.as_bytes());
    let headers = reader
        .headers()
        .expect("csv header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("csv record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (headers, rows)
}

pub fn cell<'a>(headers: &[String], row: &'a [String], header: &str) -> &'a str {
    let index = headers
        .iter()
        .position(|candidate| candidate == header)
        .unwrap_or_else(|| panic!("missing column {header}"));
    &row[index]
}
