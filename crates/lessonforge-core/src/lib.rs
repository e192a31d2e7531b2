//! Core content contracts for Lessonforge.
//!
//! This crate defines the learning-content records (courses, modules, micro
//! lessons, exercises, quizzes and questions), their field-level validation,
//! and the answer grading rules shared by the generator, the store and the CLI.

pub mod chemistry;
pub mod content;
pub mod error;
pub mod grading;
pub mod slug;
pub mod validation;

pub use chemistry::{ChemicalEquation, EquationTerm, is_balanced, parse_equation};
pub use content::{
    CodeTests, Course, CourseDifficulty, CourseModule, DEFAULT_TOLERANCE, DifficultyLevel,
    Exercise, ExerciseData, MicroLesson, ModuleItem, ModuleItemKind, OutputValidation,
    QuestionOption, QuestionType, Quiz, QuizQuestion, SandboxConstraints, SequenceItem,
};
pub use error::{Error, Result};
pub use grading::Answer;
pub use slug::slugify;
pub use validation::{
    ContentIssue, DIFFICULTY_RANGE, DISCRIMINATION_RANGE, GUESSING_RANGE, validate_course,
    validate_exercise, validate_micro_lesson, validate_module, validate_question, validate_quiz,
};

/// Current contract version for seed packs and bundles.
pub const CONTENT_VERSION: &str = "0.1";
