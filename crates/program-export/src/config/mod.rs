use std::env;
use std::fmt;

use chrono::{FixedOffset, Offset, Utc};

/// Top-level configuration for export runs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub export: ExportSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("EXPORT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9000".to_string())
            .trim_end_matches('/')
            .to_string();

        let multiple_file_upload_enabled = match env::var("EXPORT_MULTIPLE_FILE_UPLOAD") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "EXPORT_MULTIPLE_FILE_UPLOAD",
                value: raw,
            })?,
            Err(_) => false,
        };

        let secret = env::var("EXPORT_SECRET_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let raw_offset = env::var("EXPORT_UTC_OFFSET").unwrap_or_else(|_| "+00:00".to_string());
        let time_zone =
            parse_utc_offset(&raw_offset).ok_or(ConfigError::InvalidOffset { value: raw_offset })?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            export: ExportSettings {
                base_url,
                multiple_file_upload_enabled,
                secret,
                time_zone,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Knobs that shape exported values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    /// Prefix for applicant file download links.
    pub base_url: String,
    pub multiple_file_upload_enabled: bool,
    /// Secret salt for opaque identifiers; required only when an opaque column is exported.
    pub secret: Option<String>,
    /// Zone used to render CSV and JSON timestamps.
    pub time_zone: FixedOffset,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            multiple_file_upload_enabled: false,
            secret: None,
            time_zone: utc(),
        }
    }
}

impl ExportSettings {
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_multiple_file_upload(mut self, enabled: bool) -> Self {
        self.multiple_file_upload_enabled = enabled;
        self
    }

    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidOffset { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidOffset { value } => write!(
                f,
                "EXPORT_UTC_OFFSET must look like +HH:MM or -HH:MM, got '{}'",
                value
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be true or false, got '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `Z`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Some(utc());
    }

    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("EXPORT_BASE_URL");
        env::remove_var("EXPORT_MULTIPLE_FILE_UPLOAD");
        env::remove_var("EXPORT_SECRET_KEY");
        env::remove_var("EXPORT_UTC_OFFSET");
        env::remove_var("APP_LOG_LEVEL");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.export.base_url, "http://localhost:9000");
        assert!(!config.export.multiple_file_upload_enabled);
        assert!(config.export.secret.is_none());
        assert_eq!(config.export.time_zone.local_minus_utc(), 0);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn reads_export_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EXPORT_BASE_URL", "https://civic.example.org/");
        env::set_var("EXPORT_MULTIPLE_FILE_UPLOAD", "true");
        env::set_var("EXPORT_SECRET_KEY", "pepper");
        env::set_var("EXPORT_UTC_OFFSET", "-07:00");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.export.base_url, "https://civic.example.org");
        assert!(config.export.multiple_file_upload_enabled);
        assert_eq!(config.export.secret.as_deref(), Some("pepper"));
        assert_eq!(config.export.time_zone.local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn rejects_malformed_offset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EXPORT_UTC_OFFSET", "pacific");
        let error = AppConfig::load().expect_err("offset must be numeric");
        reset_env();
        assert!(matches!(error, ConfigError::InvalidOffset { .. }));
    }

    #[test]
    fn parses_offset_forms() {
        assert_eq!(parse_utc_offset("Z").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(
            parse_utc_offset("+0530").map(|o| o.local_minus_utc()),
            Some(5 * 3600 + 30 * 60)
        );
        assert!(parse_utc_offset("+5").is_none());
        assert!(parse_utc_offset("+01:75").is_none());
    }
}
