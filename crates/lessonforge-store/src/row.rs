//! Table rows derived from bundle records.

use serde_json::{Value, json};

use lessonforge_core::{Course, ModuleItem, Quiz, QuizQuestion};
use lessonforge_generate::{ExerciseRecord, LessonRecord, ModuleRecord};

use crate::errors::{Result, StoreError};

/// A column value as bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i32>),
    Id(i64),
    Float(Option<f64>),
    Bool(bool),
    Json(Value),
}

impl SqlValue {
    fn text(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }

    fn opt_text(value: &Option<String>) -> Self {
        SqlValue::Text(value.clone())
    }
}

/// One row to find by natural key and insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub table: &'static str,
    pub keys: Vec<(&'static str, SqlValue)>,
    pub columns: Vec<(&'static str, SqlValue)>,
}

impl RowSpec {
    /// Human readable natural key, for logs and errors.
    pub fn key_label(&self) -> String {
        self.keys
            .iter()
            .map(|(name, value)| format!("{name}={}", display_value(value)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn course_row(course: &Course) -> Result<RowSpec> {
    Ok(RowSpec {
        table: "courses",
        keys: vec![("slug", SqlValue::text(&course.slug))],
        columns: vec![
            ("title", SqlValue::text(&course.title)),
            ("description", SqlValue::opt_text(&course.description)),
            (
                "difficulty_level",
                SqlValue::Text(course.difficulty_level.map(|level| level.as_str().to_string())),
            ),
            (
                "certification_track",
                SqlValue::opt_text(&course.certification_track),
            ),
            (
                "estimated_hours",
                SqlValue::Int(opt_int("estimated_hours", course.estimated_hours)?),
            ),
            ("published", SqlValue::Bool(course.published)),
            ("sequence_order", SqlValue::Int(Some(course.sequence_order))),
            (
                "learning_objectives",
                SqlValue::Json(json!(course.learning_objectives)),
            ),
            ("prerequisites", SqlValue::Json(json!(course.prerequisites))),
        ],
    })
}

pub fn module_row(course_id: i64, record: &ModuleRecord) -> Result<RowSpec> {
    let module = &record.module;
    Ok(RowSpec {
        table: "course_modules",
        keys: vec![
            ("course_id", SqlValue::Id(course_id)),
            ("slug", SqlValue::text(&module.slug)),
        ],
        columns: vec![
            ("title", SqlValue::text(&module.title)),
            ("description", SqlValue::opt_text(&module.description)),
            ("sequence_order", SqlValue::Int(Some(record.sequence_order()))),
            (
                "estimated_minutes",
                SqlValue::Int(opt_int("estimated_minutes", module.estimated_minutes)?),
            ),
            (
                "learning_objectives",
                SqlValue::Json(json!(module.learning_objectives)),
            ),
            ("published", SqlValue::Bool(module.published)),
        ],
    })
}

pub fn quiz_row(quiz: &Quiz) -> Result<RowSpec> {
    Ok(RowSpec {
        table: "quizzes",
        keys: vec![("title", SqlValue::text(&quiz.title))],
        columns: vec![
            ("description", SqlValue::opt_text(&quiz.description)),
            (
                "time_limit_minutes",
                SqlValue::Int(opt_int("time_limit_minutes", quiz.time_limit_minutes)?),
            ),
            (
                "passing_score",
                SqlValue::Int(Some(int("passing_score", quiz.passing_score)?)),
            ),
            (
                "max_attempts",
                SqlValue::Int(opt_int("max_attempts", quiz.max_attempts)?),
            ),
            ("shuffle_questions", SqlValue::Bool(quiz.shuffle_questions)),
            (
                "show_correct_answers",
                SqlValue::Bool(quiz.show_correct_answers),
            ),
            ("quiz_type", SqlValue::opt_text(&quiz.quiz_type)),
        ],
    })
}

pub fn module_item_row(module_id: i64, item_id: i64, item: &ModuleItem) -> RowSpec {
    RowSpec {
        table: "module_items",
        keys: vec![
            ("course_module_id", SqlValue::Id(module_id)),
            ("item_type", SqlValue::text(item.item_kind.as_str())),
            ("item_id", SqlValue::Id(item_id)),
        ],
        columns: vec![
            ("sequence_order", SqlValue::Int(Some(item.sequence_order))),
            ("required", SqlValue::Bool(item.required)),
        ],
    }
}

pub fn lesson_row(module_id: i64, lesson: &LessonRecord) -> Result<RowSpec> {
    Ok(RowSpec {
        table: "micro_lessons",
        keys: vec![("slug", SqlValue::text(&lesson.slug))],
        columns: vec![
            ("course_module_id", SqlValue::Id(module_id)),
            ("title", SqlValue::text(&lesson.title)),
            ("content", SqlValue::text(&lesson.content)),
            ("sequence_order", SqlValue::Int(Some(lesson.sequence_order))),
            (
                "estimated_minutes",
                SqlValue::Int(Some(int("estimated_minutes", lesson.estimated_minutes)?)),
            ),
            ("difficulty", SqlValue::text(lesson.difficulty.as_str())),
            ("key_concepts", SqlValue::Json(json!(lesson.key_concepts))),
            (
                "prerequisite_slugs",
                SqlValue::Json(json!(lesson.prerequisite_slugs)),
            ),
            ("published", SqlValue::Bool(lesson.published)),
        ],
    })
}

pub fn exercise_row(lesson_id: i64, exercise: &ExerciseRecord) -> Result<RowSpec> {
    Ok(RowSpec {
        table: "exercises",
        keys: vec![
            ("micro_lesson_id", SqlValue::Id(lesson_id)),
            ("sequence_order", SqlValue::Int(Some(exercise.sequence_order))),
        ],
        columns: vec![
            ("exercise_type", SqlValue::text(exercise.data.kind())),
            (
                "exercise_data",
                SqlValue::Json(serde_json::to_value(&exercise.data)?),
            ),
        ],
    })
}

pub fn question_row(quiz_id: i64, question: &QuizQuestion) -> Result<RowSpec> {
    let question_data = json!({
        "options": question.options,
        "multiple_correct": question.multiple_correct,
        "sequence_items": question.sequence_items,
    });

    Ok(RowSpec {
        table: "quiz_questions",
        keys: vec![
            ("quiz_id", SqlValue::Id(quiz_id)),
            ("question_text", SqlValue::text(&question.question_text)),
        ],
        columns: vec![
            (
                "question_type",
                SqlValue::text(question.question_type.as_str()),
            ),
            ("question_data", SqlValue::Json(question_data)),
            ("correct_answer", SqlValue::opt_text(&question.correct_answer)),
            ("explanation", SqlValue::opt_text(&question.explanation)),
            ("points", SqlValue::Int(Some(question.points))),
            ("difficulty", SqlValue::Float(Some(question.difficulty))),
            ("discrimination", SqlValue::Float(Some(question.discrimination))),
            ("guessing", SqlValue::Float(Some(question.guessing))),
            (
                "difficulty_level",
                SqlValue::Text(question.difficulty_level.map(|level| level.as_str().to_string())),
            ),
            ("topic", SqlValue::opt_text(&question.topic)),
            ("skill_dimension", SqlValue::opt_text(&question.skill_dimension)),
            ("tags", SqlValue::Json(json!(question.tags))),
            ("tolerance", SqlValue::Float(question.tolerance)),
            ("sequence_order", SqlValue::Int(question.sequence_order)),
        ],
    })
}

fn int(field: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::OutOfRange {
        field,
        value: u64::from(value),
    })
}

fn opt_int(field: &'static str, value: Option<u32>) -> Result<Option<i32>> {
    value.map(|value| int(field, value)).transpose()
}

fn display_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(Some(text)) => text.clone(),
        SqlValue::Int(Some(number)) => number.to_string(),
        SqlValue::Id(id) => id.to_string(),
        SqlValue::Float(Some(number)) => number.to_string(),
        SqlValue::Bool(flag) => flag.to_string(),
        SqlValue::Json(value) => value.to_string(),
        SqlValue::Text(None) | SqlValue::Int(None) | SqlValue::Float(None) => "null".to_string(),
    }
}
