mod common;

use common::{application, cell, colors, name_and_income_program, parse_csv, program, service, text};
use program_export::export::OpaqueHasher;
use program_export::model::{QuestionDefinition, QuestionKind, QuestionTag};
use program_export::{ExportError, ExportSettings};
use serde_json::json;

#[test]
fn program_csv_has_metadata_answers_and_trailing_columns() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let applications = vec![application(
        7,
        1,
        json!({
            "applicant": {
                "applicant_name": {
                    "first_name": "Homer",
                    "middle_name": "Jay",
                    "last_name": "Simpson"
                },
                "monthly_income": {"currency_cents": 12345}
            }
        }),
    )];

    let exported = service
        .program_all_versions_csv(1, &applications)
        .expect("csv export");
    let (headers, rows) = parse_csv(&exported);

    assert_eq!(
        headers,
        vec![
            "Applicant ID",
            "Application ID",
            "Applicant Language",
            "Create Time",
            "Submit Time",
            "Submitter Type",
            "TI Email",
            "TI Organization",
            "Status",
            "applicant name (first_name)",
            "applicant name (middle_name)",
            "applicant name (last_name)",
            "applicant name (suffix)",
            "monthly income (currency)",
            "Admin Note",
            "Status Last Modified Time",
        ]
    );
    assert_eq!(rows.len(), 1, "one row per application");

    let row = &rows[0];
    assert_eq!(cell(&headers, row, "Applicant ID"), "107");
    assert_eq!(cell(&headers, row, "Application ID"), "7");
    assert_eq!(cell(&headers, row, "Submit Time"), "2024/03/01 9:30:00 AM");
    assert_eq!(cell(&headers, row, "Submitter Type"), "APPLICANT");
    assert_eq!(cell(&headers, row, "applicant name (first_name)"), "Homer");
    assert_eq!(cell(&headers, row, "applicant name (middle_name)"), "Jay");
    assert_eq!(cell(&headers, row, "applicant name (last_name)"), "Simpson");
    assert_eq!(cell(&headers, row, "applicant name (suffix)"), "");
    assert_eq!(cell(&headers, row, "monthly income (currency)"), "123.45");
}

#[test]
fn zero_cents_render_as_zero_dollars() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let applications = vec![application(
        1,
        1,
        json!({"applicant": {"monthly_income": {"currency_cents": 0}}}),
    )];

    let (headers, rows) =
        parse_csv(&service.program_all_versions_csv(1, &applications).expect("csv export"));
    assert_eq!(cell(&headers, &rows[0], "monthly income (currency)"), "0.00");
}

#[test]
fn columns_are_the_union_of_all_versions() {
    let v1 = program(1, vec![text(1, "x"), text(2, "y")]);
    let v2 = program(2, vec![text(2, "y"), text(3, "z")]);
    let service = service(vec![v1, v2], Vec::new(), ExportSettings::default());
    let applications = vec![
        application(1, 1, json!({"applicant": {"x": {"text": "only in v1"}}})),
        application(2, 2, json!({"applicant": {"z": {"text": "only in v2"}}})),
    ];

    let (headers, rows) =
        parse_csv(&service.program_all_versions_csv(2, &applications).expect("csv export"));

    let positions: Vec<usize> = ["x (text)", "y (text)", "z (text)"]
        .iter()
        .map(|header| {
            assert_eq!(
                headers.iter().filter(|candidate| candidate == header).count(),
                1,
                "{header} appears exactly once"
            );
            headers
                .iter()
                .position(|candidate| candidate == header)
                .expect("header present")
        })
        .collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "answer columns sorted by path: {positions:?}"
    );
    assert_eq!(cell(&headers, &rows[0], "x (text)"), "only in v1");
    assert_eq!(cell(&headers, &rows[0], "z (text)"), "");
    assert_eq!(cell(&headers, &rows[1], "x (text)"), "");
    assert_eq!(cell(&headers, &rows[1], "z (text)"), "only in v2");
}

#[test]
fn checkbox_columns_report_four_states() {
    let v1 = program(1, vec![colors(10, &[(1, "red"), (2, "blue")])]);
    let v2 = program(2, vec![colors(11, &[(1, "red"), (3, "green")])]);
    let service = service(vec![v1, v2], Vec::new(), ExportSettings::default());
    let applications = vec![
        application(1, 1, json!({"applicant": {"colors": {"selections": [2]}}})),
        application(2, 2, json!({"applicant": {}})),
        application(3, 2, json!({"applicant": {"colors": {"selections": []}}})),
    ];

    let (headers, rows) =
        parse_csv(&service.program_all_versions_csv(1, &applications).expect("csv export"));
    let states = |row: &[String]| {
        ["red", "blue", "green"].map(|option| {
            cell(&headers, row, &format!("colors (selections - {option})")).to_string()
        })
    };

    assert_eq!(
        states(&rows[0]),
        ["NOT_SELECTED", "SELECTED", "NOT_AN_OPTION_AT_PROGRAM_VERSION"]
    );
    assert_eq!(
        states(&rows[1]),
        ["NOT_ANSWERED", "NOT_ANSWERED", "NOT_ANSWERED"]
    );
    assert_eq!(
        states(&rows[2]),
        ["NOT_SELECTED", "NOT_AN_OPTION_AT_PROGRAM_VERSION", "NOT_SELECTED"]
    );
}

#[test]
fn repeated_entities_get_indexed_columns() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let applications = vec![application(
        1,
        1,
        json!({
            "applicant": {
                "household_members": [
                    {"entity_name": "Kid", "member_income": {"currency_cents": 500}},
                    {"entity_name": "Partner", "member_income": {"currency_cents": 250000}}
                ]
            }
        }),
    )];

    let (headers, rows) =
        parse_csv(&service.program_all_versions_csv(1, &applications).expect("csv export"));
    assert_eq!(
        cell(&headers, &rows[0], "household members[0] - member income (currency)"),
        "5.00"
    );
    assert_eq!(
        cell(&headers, &rows[0], "household members[1] - member income (currency)"),
        "2500.00"
    );
    assert!(!headers.iter().any(|header| header.contains("entity_name")));
}

#[test]
fn eligibility_column_follows_current_version() {
    let with_eligibility = name_and_income_program(1).with_eligibility(true);
    let service = service(vec![with_eligibility], Vec::new(), ExportSettings::default());
    let mut eligible = application(1, 1, json!({"applicant": {}}));
    eligible.eligible = Some(true);

    let (headers, rows) =
        parse_csv(&service.program_all_versions_csv(1, &[eligible]).expect("csv export"));
    assert_eq!(cell(&headers, &rows[0], "Eligibility Status"), "Meets eligibility");
}

#[test]
fn eligibility_column_is_the_same_through_any_version_id() {
    let older = program(1, vec![text(1, "x")]);
    let current = program(2, vec![text(1, "x")]).with_eligibility(true);
    let service = service(vec![older, current], Vec::new(), ExportSettings::default());
    let mut eligible = application(1, 1, json!({"applicant": {"x": {"text": "hi"}}}));
    eligible.eligible = Some(false);

    let via_older = service
        .program_all_versions_csv(1, std::slice::from_ref(&eligible))
        .expect("csv export");
    let via_current = service
        .program_all_versions_csv(2, std::slice::from_ref(&eligible))
        .expect("csv export");
    assert_eq!(via_older, via_current);

    let (headers, rows) = parse_csv(&via_older);
    assert_eq!(
        cell(&headers, &rows[0], "Eligibility Status"),
        "Doesn't meet eligibility"
    );
}

#[test]
fn cells_with_delimiters_are_quoted() {
    let service = service(
        vec![program(1, vec![text(1, "x")])],
        Vec::new(),
        ExportSettings::default(),
    );
    let tricky = "Apt 4, \"rear\"\nentrance";
    let applications = vec![application(1, 1, json!({"applicant": {"x": {"text": tricky}}}))];

    let exported = service
        .program_all_versions_csv(1, &applications)
        .expect("csv export");
    assert!(
        exported.contains("\"Apt 4, \"\"rear\"\"\nentrance\""),
        "quotes doubled inside a quoted cell: {exported}"
    );

    let (headers, rows) = parse_csv(&exported);
    assert_eq!(rows.len(), 1);
    assert_eq!(cell(&headers, &rows[0], "x (text)"), tricky);
}

#[test]
fn application_for_unknown_version_is_missing_reference() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let stray = application(1, 99, json!({"applicant": {}}));

    let error = service
        .program_all_versions_csv(1, &[stray])
        .expect_err("version 99 is not part of the program");
    assert!(matches!(error, ExportError::MissingReference(_)));
}

#[test]
fn malformed_answer_aborts_the_export() {
    let service = service(vec![name_and_income_program(1)], Vec::new(), ExportSettings::default());
    let applications = vec![
        application(1, 1, json!({"applicant": {"monthly_income": {"currency_cents": 100}}})),
        application(2, 1, json!({"applicant": {"monthly_income": {"currency_cents": "lots"}}})),
    ];

    let error = service
        .program_all_versions_csv(1, &applications)
        .expect_err("non-numeric cents");
    assert!(matches!(error, ExportError::InvalidAnswer { .. }));
}

fn demographic_catalog() -> Vec<QuestionDefinition> {
    vec![
        QuestionDefinition::new(50, "age", QuestionKind::Number).tagged(QuestionTag::Demographic),
        QuestionDefinition::new(51, "contact email", QuestionKind::Email)
            .tagged(QuestionTag::DemographicPii),
    ]
}

#[test]
fn demographics_hash_pii_and_identifiers() {
    let settings = ExportSettings::default().with_secret("pepper");
    let service = service(vec![program(1, Vec::new())], demographic_catalog(), settings);
    let mut submitted = application(
        4,
        1,
        json!({"applicant": {"age": {"number": 33}, "contact_email": {"email": "a@b.org"}}}),
    );
    submitted.submitter_email = Some("helper@example.org".to_string());

    let (headers, rows) = parse_csv(&service.demographics_csv(&[submitted]).expect("demographics"));
    let hasher = OpaqueHasher::new("pepper").expect("secret");
    let row = &rows[0];

    assert_eq!(cell(&headers, row, "Opaque ID"), hasher.hash("104"));
    assert_eq!(cell(&headers, row, "Program"), "utility-assistance");
    assert_eq!(cell(&headers, row, "Submitter Type"), "TRUSTED_INTERMEDIARY");
    assert_eq!(
        cell(&headers, row, "TI Email (Opaque)"),
        hasher.hash("helper@example.org")
    );
    assert_eq!(cell(&headers, row, "age (number)"), "33");
    assert_eq!(cell(&headers, row, "contact email (email)"), hasher.hash("a@b.org"));
}

#[test]
fn opaque_values_change_with_the_secret() {
    let submitted = application(4, 1, json!({"applicant": {"age": {"number": 33}}}));
    let export_with = |secret: &str| {
        let settings = ExportSettings::default().with_secret(secret);
        let service = service(vec![program(1, Vec::new())], demographic_catalog(), settings);
        let (headers, rows) =
            parse_csv(&service.demographics_csv(&[submitted.clone()]).expect("demographics"));
        cell(&headers, &rows[0], "Opaque ID").to_string()
    };

    assert_eq!(export_with("one"), export_with("one"));
    assert_ne!(export_with("one"), export_with("two"));
}

#[test]
fn demographics_without_secret_is_a_configuration_error() {
    let service = service(
        vec![program(1, Vec::new())],
        demographic_catalog(),
        ExportSettings::default(),
    );
    let error = service
        .demographics_csv(&[application(1, 1, json!({"applicant": {}}))])
        .expect_err("secret required");
    assert!(matches!(error, ExportError::Configuration(_)));
}
