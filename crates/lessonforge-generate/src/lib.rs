//! Bundle expansion for Lessonforge seed plans.
//!
//! This crate turns a validated `SeedPlan` into a flat `ContentBundle`,
//! expanding question series along the way, and writes run artifacts
//! (bundle JSON, one CSV per record kind and a generation report).

pub mod bundle;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod series;
pub mod summary;

pub use bundle::{
    ContentBundle, ExerciseRecord, LessonRecord, ModuleItemRecord, ModuleRecord, QuestionRecord,
    QuestionSource,
};
pub use engine::{GenerationEngine, GenerationResult, build_bundle};
pub use errors::{GenerationError, Result};
pub use model::{GenerateOptions, GenerationIssue, GenerationReport};
pub use series::expand_series;
pub use summary::{ContentSummary, CourseSummary, summarize};
