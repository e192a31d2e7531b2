use crate::chemistry::{is_balanced, parse_equation};
use crate::content::{
    Course, CourseModule, Exercise, ExerciseData, MicroLesson, QuestionType, Quiz, QuizQuestion,
};

/// Field-level problem found on a single content record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIssue {
    pub code: &'static str,
    /// Field path relative to the record (e.g. `options`, `exercises/0/tests`).
    pub field: String,
    pub message: String,
}

impl ContentIssue {
    fn new(code: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            message: message.into(),
        }
    }
}

pub const DIFFICULTY_RANGE: (f64, f64) = (-3.0, 3.0);
pub const DISCRIMINATION_RANGE: (f64, f64) = (0.1, 3.0);
pub const GUESSING_RANGE: (f64, f64) = (0.0, 0.5);

/// Validate a course record.
pub fn validate_course(course: &Course) -> Vec<ContentIssue> {
    let mut issues = Vec::new();
    check_slug(&course.slug, "slug", &mut issues);
    if course.title.trim().is_empty() {
        issues.push(ContentIssue::new("blank_title", "title", "course title is required"));
    }
    issues
}

/// Validate a course module record.
pub fn validate_module(module: &CourseModule) -> Vec<ContentIssue> {
    let mut issues = Vec::new();
    check_slug(&module.slug, "slug", &mut issues);
    if module.title.trim().is_empty() {
        issues.push(ContentIssue::new("blank_title", "title", "module title is required"));
    }
    issues
}

/// Validate a quiz record.
pub fn validate_quiz(quiz: &Quiz) -> Vec<ContentIssue> {
    let mut issues = Vec::new();
    if quiz.title.trim().is_empty() {
        issues.push(ContentIssue::new("blank_title", "title", "quiz title is required"));
    }
    if quiz.passing_score > 100 {
        issues.push(ContentIssue::new(
            "passing_score_range",
            "passing_score",
            format!("passing_score {} must be between 0 and 100", quiz.passing_score),
        ));
    }
    if quiz.time_limit_minutes == Some(0) {
        issues.push(ContentIssue::new(
            "time_limit_zero",
            "time_limit_minutes",
            "time_limit_minutes must be positive when set",
        ));
    }
    issues
}

/// Validate a micro lesson and its exercises.
pub fn validate_micro_lesson(lesson: &MicroLesson) -> Vec<ContentIssue> {
    let mut issues = Vec::new();
    if let Some(slug) = &lesson.slug {
        check_slug(slug, "slug", &mut issues);
    }
    if lesson.title.trim().is_empty() {
        issues.push(ContentIssue::new("blank_title", "title", "lesson title is required"));
    }
    if lesson.content.trim().is_empty() {
        issues.push(ContentIssue::new(
            "blank_content",
            "content",
            "lesson content is required",
        ));
    }
    if lesson.estimated_minutes == 0 {
        issues.push(ContentIssue::new(
            "estimated_minutes_zero",
            "estimated_minutes",
            "estimated_minutes must be positive",
        ));
    }
    for (idx, exercise) in lesson.exercises.iter().enumerate() {
        for mut issue in validate_exercise(exercise) {
            issue.field = format!("exercises/{idx}/{}", issue.field);
            issues.push(issue);
        }
    }
    issues
}

/// Validate the payload of an exercise.
pub fn validate_exercise(exercise: &Exercise) -> Vec<ContentIssue> {
    let mut issues = Vec::new();
    match &exercise.data {
        ExerciseData::Mcq {
            question,
            options,
            correct_answer,
            ..
        } => {
            require_text(question, "question", &mut issues);
            if options.is_empty() {
                issues.push(ContentIssue::new(
                    "options_empty",
                    "options",
                    "mcq exercise needs at least one option",
                ));
            } else if *correct_answer >= options.len() {
                issues.push(ContentIssue::new(
                    "correct_answer_out_of_range",
                    "correct_answer",
                    format!(
                        "correct_answer {} is out of range for {} options",
                        correct_answer,
                        options.len()
                    ),
                ));
            }
        }
        ExerciseData::ShortAnswer {
            question, answer, ..
        } => {
            require_text(question, "question", &mut issues);
            require_text(answer, "answer", &mut issues);
        }
        ExerciseData::Terminal {
            command,
            timeout_sec,
            ..
        } => {
            require_text(command, "command", &mut issues);
            check_timeout(*timeout_sec, &mut issues);
        }
        ExerciseData::Sandbox {
            run,
            timeout_sec,
            constraints,
            ..
        } => {
            require_text(run, "run", &mut issues);
            check_timeout(*timeout_sec, &mut issues);
            if constraints.cpus == 0 || constraints.mem_mb == 0 {
                issues.push(ContentIssue::new(
                    "constraints_zero",
                    "constraints",
                    "sandbox cpus and mem_mb must be positive",
                ));
            }
        }
        ExerciseData::Code { files, tests, .. } => {
            if files.is_empty() {
                issues.push(ContentIssue::new(
                    "files_empty",
                    "files",
                    "code exercise needs at least one file",
                ));
            }
            require_text(&tests.run, "tests/run", &mut issues);
        }
    }
    issues
}

/// Validate a quiz question's answer key and scoring metadata.
pub fn validate_question(question: &QuizQuestion) -> Vec<ContentIssue> {
    let mut issues = Vec::new();

    require_text(&question.question_text, "question_text", &mut issues);

    if question.points <= 0 {
        issues.push(ContentIssue::new(
            "points_not_positive",
            "points",
            format!("points must be greater than 0 (got {})", question.points),
        ));
    }

    check_range(question.difficulty, DIFFICULTY_RANGE, "difficulty", &mut issues);
    check_range(
        question.discrimination,
        DISCRIMINATION_RANGE,
        "discrimination",
        &mut issues,
    );
    check_range(question.guessing, GUESSING_RANGE, "guessing", &mut issues);

    match question.question_type {
        QuestionType::Mcq => validate_mcq(question, &mut issues),
        QuestionType::Sequence => validate_sequence(question, &mut issues),
        QuestionType::Numerical => {
            if let Some(tolerance) = question.tolerance {
                if tolerance < 0.0 || !tolerance.is_finite() {
                    issues.push(ContentIssue::new(
                        "tolerance_negative",
                        "tolerance",
                        "tolerance must be greater than or equal to 0",
                    ));
                }
            }
            if let Some(answer) = require_answer(question, &mut issues) {
                if answer.trim().parse::<f64>().is_err() {
                    issues.push(ContentIssue::new(
                        "answer_not_numeric",
                        "correct_answer",
                        format!("numerical answer '{answer}' is not a number"),
                    ));
                }
            }
        }
        QuestionType::EquationBalance => {
            if let Some(answer) = require_answer(question, &mut issues) {
                match parse_equation(answer).and_then(|eq| is_balanced(&eq)) {
                    Ok(true) => {}
                    Ok(false) => issues.push(ContentIssue::new(
                        "equation_unbalanced",
                        "correct_answer",
                        format!("answer '{answer}' is not balanced"),
                    )),
                    Err(err) => issues.push(ContentIssue::new(
                        "equation_invalid",
                        "correct_answer",
                        err.to_string(),
                    )),
                }
            }
        }
        QuestionType::FillBlank | QuestionType::Command | QuestionType::TrueFalse => {
            require_answer(question, &mut issues);
        }
    }

    issues
}

fn validate_mcq(question: &QuizQuestion, issues: &mut Vec<ContentIssue>) {
    if question.options.is_empty() {
        issues.push(ContentIssue::new(
            "options_empty",
            "options",
            "mcq question needs options",
        ));
        return;
    }

    if question.options.iter().any(|option| option.text.trim().is_empty()) {
        issues.push(ContentIssue::new(
            "option_blank",
            "options",
            "mcq options must have text",
        ));
    }

    let correct = question.correct_option_count();
    if question.multiple_correct {
        if correct < 2 {
            issues.push(ContentIssue::new(
                "multiple_correct_too_few",
                "multiple_correct",
                "should have at least 2 correct options when multiple_correct is true",
            ));
        }
    } else if correct != 1 {
        issues.push(ContentIssue::new(
            "single_correct_count",
            "options",
            format!("single-answer mcq needs exactly one correct option (found {correct})"),
        ));
    }
}

fn validate_sequence(question: &QuizQuestion, issues: &mut Vec<ContentIssue>) {
    if question.sequence_items.is_empty() {
        issues.push(ContentIssue::new(
            "sequence_items_empty",
            "sequence_items",
            "sequence question needs sequence_items",
        ));
        return;
    }
    for (idx, item) in question.sequence_items.iter().enumerate() {
        if item.id.trim().is_empty() || item.text.trim().is_empty() {
            issues.push(ContentIssue::new(
                "sequence_item_incomplete",
                format!("sequence_items/{idx}"),
                format!("item {idx} must have 'id' and 'text' fields"),
            ));
        }
    }
    if let Some(answer) = require_answer(question, issues) {
        for id in answer.split(',').map(str::trim) {
            if !question.sequence_items.iter().any(|item| item.id == id) {
                issues.push(ContentIssue::new(
                    "sequence_unknown_id",
                    "correct_answer",
                    format!("answer references unknown item id '{id}'"),
                ));
            }
        }
    }
}

fn require_answer<'a>(
    question: &'a QuizQuestion,
    issues: &mut Vec<ContentIssue>,
) -> Option<&'a str> {
    match question.correct_answer.as_deref() {
        Some(answer) if !answer.trim().is_empty() => Some(answer),
        _ => {
            issues.push(ContentIssue::new(
                "answer_missing",
                "correct_answer",
                format!(
                    "{} question needs a correct_answer",
                    question.question_type.as_str()
                ),
            ));
            None
        }
    }
}

fn require_text(value: &str, field: &str, issues: &mut Vec<ContentIssue>) {
    if value.trim().is_empty() {
        issues.push(ContentIssue::new(
            "blank_field",
            field,
            format!("{field} must not be blank"),
        ));
    }
}

fn check_range(value: f64, (min, max): (f64, f64), field: &str, issues: &mut Vec<ContentIssue>) {
    if !(min..=max).contains(&value) {
        issues.push(ContentIssue::new(
            "out_of_range",
            field,
            format!("{field} {value} must be between {min} and {max}"),
        ));
    }
}

fn check_timeout(timeout_sec: u32, issues: &mut Vec<ContentIssue>) {
    if timeout_sec == 0 {
        issues.push(ContentIssue::new(
            "timeout_zero",
            "timeout_sec",
            "timeout_sec must be positive",
        ));
    }
}

fn check_slug(slug: &str, field: &str, issues: &mut Vec<ContentIssue>) {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
    if !valid {
        issues.push(ContentIssue::new(
            "invalid_slug",
            field,
            format!("'{slug}' must be lower-case letters, digits and dashes"),
        ));
    }
}
