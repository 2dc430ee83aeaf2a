pub mod csv;
pub mod format;
pub mod json;
pub mod opaque;
pub mod sampler;
pub mod schema;
pub mod service;
pub mod strategy;
pub mod value;

pub use self::csv::CsvExporter;
pub use json::{JsonExporter, JsonTemplate, RevisionState};
pub use opaque::OpaqueHasher;
pub use sampler::QuestionSampler;
pub use schema::{Column, ColumnCategory, ColumnType, ExportConfig};
pub use service::ExportService;
pub use strategy::{strategy_for, AnswerField, ExtractionStrategy, SelectionState};
pub use value::ExportValue;
