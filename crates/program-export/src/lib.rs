pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod store;
pub mod telemetry;

pub use config::{AppConfig, ExportSettings};
pub use error::{AppError, ExportError};
pub use export::service::ExportService;
