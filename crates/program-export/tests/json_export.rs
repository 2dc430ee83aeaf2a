mod common;

use chrono::FixedOffset;
use common::{application, colors, name_and_income_program, program, service, text};
use program_export::model::LifecycleStage;
use program_export::{ExportError, ExportSettings};
use serde_json::{json, Value};

fn documents(raw: &str) -> Vec<Value> {
    serde_json::from_str(raw).expect("json array of documents")
}

#[test]
fn program_json_carries_metadata_and_typed_answers() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let applications = vec![application(
        7,
        1,
        json!({
            "applicant": {
                "applicant_name": {"first_name": "Ada", "last_name": "Lovelace"},
                "monthly_income": {"currency_cents": 12345}
            }
        }),
    )];

    let exported = documents(&service.program_json(1, &applications).expect("json export"));
    assert_eq!(exported.len(), 1);
    let document = &exported[0];

    assert_eq!(document["program_name"], "utility-assistance");
    assert_eq!(document["program_version_id"], 1);
    assert_eq!(document["applicant_id"], 107);
    assert_eq!(document["application_id"], 7);
    assert_eq!(document["language"], "en-US");
    assert_eq!(document["submitter_type"], "APPLICANT");
    assert_eq!(document["revision_state"], "CURRENT");
    assert_eq!(document["ti_email"], "");
    assert_eq!(document["ti_organization"], "");
    assert_eq!(document["status"], Value::Null);

    let name = &document["application"]["applicant_name"];
    assert_eq!(name["question_type"], "NAME");
    assert_eq!(name["first_name"], "Ada");
    assert_eq!(name["middle_name"], Value::Null);
    assert_eq!(name["last_name"], "Lovelace");

    let income = &document["application"]["monthly_income"];
    assert_eq!(income["question_type"], "CURRENCY");
    assert_eq!(income["currency_dollars"], 123.45);

    let application_keys = document["application"]
        .as_object()
        .expect("application object");
    assert!(
        !application_keys.contains_key("household_members"),
        "unanswered enumerators contribute no key"
    );
}

#[test]
fn intermediary_fields_carry_submitter_details() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let mut assisted = application(3, 1, json!({"applicant": {}}));
    assisted.submitter_email = Some("helper@example.org".to_string());
    assisted.ti_organization = Some("Food Bank".to_string());

    let exported = documents(&service.program_json(1, &[assisted]).expect("json export"));
    assert_eq!(exported[0]["submitter_type"], "TRUSTED_INTERMEDIARY");
    assert_eq!(exported[0]["ti_email"], "helper@example.org");
    assert_eq!(exported[0]["ti_organization"], "Food Bank");
}

#[test]
fn paths_from_other_versions_are_present_as_null() {
    let v1 = program(1, vec![text(1, "x")]);
    let v2 = program(2, vec![text(1, "x"), text(2, "z")]);
    let service = service(vec![v1, v2], Vec::new(), ExportSettings::default());
    let applications = vec![application(
        1,
        1,
        json!({"applicant": {"x": {"text": "hello"}}}),
    )];

    let exported = documents(&service.program_json(1, &applications).expect("json export"));
    let answers = &exported[0]["application"];

    assert_eq!(answers["x"]["text"], "hello");
    assert_eq!(answers["z"]["question_type"], "TEXT");
    assert!(answers["z"]
        .as_object()
        .expect("z object")
        .get("text")
        .is_some_and(Value::is_null));
}

#[test]
fn multi_select_lists_selected_admin_names() {
    let service = service(
        vec![program(1, vec![colors(10, &[(1, "red"), (2, "blue")])])],
        Vec::new(),
        ExportSettings::default(),
    );
    let applications = vec![
        application(1, 1, json!({"applicant": {"colors": {"selections": [2, 1]}}})),
        application(2, 1, json!({"applicant": {}})),
    ];

    let exported = documents(&service.program_json(1, &applications).expect("json export"));
    assert_eq!(exported[0]["application"]["colors"]["question_type"], "MULTI_SELECT");
    assert_eq!(exported[0]["application"]["colors"]["selections"], json!(["blue", "red"]));
    assert_eq!(exported[1]["application"]["colors"]["selections"], json!([]));
}

#[test]
fn repeated_entities_nest_under_entities() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let applications = vec![application(
        1,
        1,
        json!({
            "applicant": {
                "household_members": [
                    {"entity_name": "Kid", "member_income": {"currency_cents": 500}}
                ]
            }
        }),
    )];

    let exported = documents(&service.program_json(1, &applications).expect("json export"));
    let member = &exported[0]["application"]["household_members"]["entities"][0];
    assert_eq!(member["member_income"]["question_type"], "CURRENCY");
    assert_eq!(member["member_income"]["currency_dollars"], 5.0);
}

#[test]
fn timestamps_use_configured_offset() {
    let eastern = FixedOffset::west_opt(5 * 3600).expect("valid offset");
    let service = service(
        vec![name_and_income_program(1)],
        Vec::new(),
        ExportSettings::default().with_time_zone(eastern),
    );
    let mut unsubmitted = application(1, 1, json!({"applicant": {}}));
    unsubmitted.submit_time = None;

    let exported = documents(&service.program_json(1, &[unsubmitted]).expect("json export"));
    assert_eq!(exported[0]["create_time"], "2024-03-01T04:00:00-05:00");
    assert_eq!(exported[0]["submit_time"], Value::Null);
}

#[test]
fn obsolete_versions_are_flagged_and_drafts_rejected() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());

    let mut obsolete = application(1, 1, json!({"applicant": {}}));
    obsolete.lifecycle_stage = LifecycleStage::Obsolete;
    let exported = documents(&service.program_json(1, &[obsolete]).expect("json export"));
    assert_eq!(exported[0]["revision_state"], "OBSOLETE");

    let mut draft = application(2, 1, json!({"applicant": {}}));
    draft.lifecycle_stage = LifecycleStage::Draft;
    let error = service
        .program_json(1, &[draft])
        .expect_err("draft applications are not exportable");
    assert!(matches!(error, ExportError::UnsupportedState(_)));
}

#[test]
fn preview_renders_sample_answers() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());

    let preview: Value =
        serde_json::from_str(&service.preview_program_json(1).expect("preview")).expect("json");
    assert_eq!(preview["application"]["applicant_name"]["first_name"], "Homer");
    assert_eq!(preview["application"]["monthly_income"]["currency_dollars"], 123.45);
    assert!(preview["application"]
        .as_object()
        .expect("application object")
        .get("household_members")
        .is_none());
}

#[test]
fn unknown_program_is_missing_reference() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let error = service.program_json(404, &[]).expect_err("no such program");
    assert!(matches!(error, ExportError::MissingReference(_)));
}
