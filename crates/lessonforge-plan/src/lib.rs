//! Seed plan contracts, loading and validation.
//!
//! A seed plan is the authored form of a content pack: courses with their
//! modules, micro lessons, quizzes, literal questions and procedural question
//! series.

pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, Result, ValidationIssue, ValidationReport};
pub use load::{load_plan, load_plan_value};
pub use model::{
    CorrectWhen, CoursePlan, INDEX_PLACEHOLDER, LevelThreshold, LinearDifficulty, MAX_SERIES_LEN,
    ModulePlan,
    ParityShapes, QuestionSeries, QuizPlan, SeedPlan, SeriesOption, SeriesRange, SeriesShape,
};
pub use schema::{plan_json_schema, plan_json_schema_value};
pub use validate::{ValidatedPlan, validate_plan, validate_plan_json, validate_plan_semantics};
