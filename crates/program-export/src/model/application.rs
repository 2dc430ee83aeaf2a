use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::answer::ApplicantData;

/// Lifecycle of the program version an application was submitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStage {
    Draft,
    Active,
    Obsolete,
    Deleted,
}

impl LifecycleStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Obsolete => "OBSOLETE",
            Self::Deleted => "DELETED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitterType {
    Applicant,
    TrustedIntermediary,
}

impl SubmitterType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applicant => "APPLICANT",
            Self::TrustedIntermediary => "TRUSTED_INTERMEDIARY",
        }
    }
}

/// A submitted application together with its answer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub applicant_id: u64,
    pub program_version_id: u64,
    #[serde(default = "default_language")]
    pub language: String,
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub submit_time: Option<DateTime<Utc>>,
    /// Email of the trusted intermediary that submitted on the applicant's behalf.
    #[serde(default)]
    pub submitter_email: Option<String>,
    #[serde(default)]
    pub ti_organization: Option<String>,
    pub lifecycle_stage: LifecycleStage,
    #[serde(default)]
    pub latest_status: Option<String>,
    #[serde(default)]
    pub status_last_modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin_note: Option<String>,
    #[serde(default)]
    pub eligible: Option<bool>,
    #[serde(default)]
    pub applicant_data: ApplicantData,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Application {
    pub fn submitter_type(&self) -> SubmitterType {
        if self.submitter_email.is_some() {
            SubmitterType::TrustedIntermediary
        } else {
            SubmitterType::Applicant
        }
    }
}
