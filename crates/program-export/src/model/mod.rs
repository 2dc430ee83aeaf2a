pub mod answer;
pub mod application;
pub mod path;
pub mod program;
pub mod question;

pub use answer::{contextualize, ApplicantData, ApplicantQuestion, Scalar};
pub use application::{Application, LifecycleStage, SubmitterType};
pub use path::Path;
pub use program::{BlockDefinition, ProgramDefinition};
pub use question::{QuestionDefinition, QuestionKind, QuestionOption, QuestionTag, QuestionType};
