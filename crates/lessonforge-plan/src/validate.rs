use std::collections::{HashMap, HashSet};

use jsonschema::JSONSchema;
use serde_json::Value;

use lessonforge_core::{
    CONTENT_VERSION, ContentIssue, DIFFICULTY_RANGE, DISCRIMINATION_RANGE, GUESSING_RANGE,
    slugify, validate_course, validate_micro_lesson, validate_module, validate_question,
    validate_quiz,
};

use crate::errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
use crate::model::{
    INDEX_PLACEHOLDER, MAX_SERIES_LEN, ModulePlan, QuestionSeries, QuizPlan, SeedPlan, SeriesShape,
};

/// Validated plan with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub plan: SeedPlan,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a plan JSON document against the plan JSON Schema.
pub fn validate_plan_json(
    plan_json: &Value,
    plan_schema: &Value,
) -> Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(plan_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(plan_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate the plan end-to-end, returning structured issues on failure.
pub fn validate_plan(
    plan_json: &Value,
    plan_schema: &Value,
) -> Result<ValidatedPlan, ValidationReport> {
    let structural = match validate_plan_json(plan_json, plan_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let plan: SeedPlan = match serde_json::from_value(plan_json.clone()) {
        Ok(plan) => plan,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "invalid_plan_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    let semantic = validate_plan_semantics(&plan);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedPlan {
        plan,
        warnings: semantic.warnings,
    })
}

/// Cross-record checks: natural keys, references and series sanity.
pub fn validate_plan_semantics(plan: &SeedPlan) -> ValidationReport {
    let mut report = ValidationReport::default();

    if plan.plan_version != CONTENT_VERSION {
        report.push(ValidationIssue::error(
            "plan_version_mismatch",
            "/plan_version",
            format!(
                "plan_version '{}' is not supported (expected '{}')",
                plan.plan_version, CONTENT_VERSION
            ),
            Some(format!("set plan_version to \"{CONTENT_VERSION}\"")),
        ));
    }

    if plan.courses.is_empty() {
        report.push(ValidationIssue::error(
            "courses_empty",
            "/courses",
            "plan requires at least one course",
            Some("add at least one course".to_string()),
        ));
        return report;
    }

    let mut course_slugs = HashSet::new();
    let mut quiz_titles: HashMap<String, String> = HashMap::new();
    let mut lesson_slugs: HashMap<String, String> = HashMap::new();
    let mut prerequisites: Vec<(String, String)> = Vec::new();

    for (course_idx, course_plan) in plan.courses.iter().enumerate() {
        let course_path = format!("/courses/{course_idx}");
        push_content_issues(&mut report, &course_path, validate_course(&course_plan.course));

        if !course_slugs.insert(course_plan.course.slug.clone()) {
            report.push(ValidationIssue::error(
                "duplicate_course_slug",
                format!("{course_path}/slug"),
                format!("course slug '{}' is used more than once", course_plan.course.slug),
                Some("course slugs must be unique across the plan".to_string()),
            ));
        }

        if course_plan.modules.is_empty() {
            report.push(ValidationIssue::warning(
                "course_without_modules",
                format!("{course_path}/modules"),
                format!("course '{}' has no modules", course_plan.course.slug),
                None,
            ));
        }

        let mut module_slugs = HashSet::new();
        let mut module_orders = HashSet::new();
        for (module_idx, module_plan) in course_plan.modules.iter().enumerate() {
            let module_path = format!("{course_path}/modules/{module_idx}");
            let module = &module_plan.module;
            push_content_issues(&mut report, &module_path, validate_module(module));

            if !module_slugs.insert(module.slug.clone()) {
                report.push(ValidationIssue::error(
                    "duplicate_module_slug",
                    format!("{module_path}/slug"),
                    format!(
                        "module slug '{}' is used more than once in course '{}'",
                        module.slug, course_plan.course.slug
                    ),
                    None,
                ));
            }
            if let Some(order) = module.sequence_order {
                if !module_orders.insert(order) {
                    report.push(ValidationIssue::warning(
                        "duplicate_sequence_order",
                        format!("{module_path}/sequence_order"),
                        format!("module sequence_order {order} is repeated"),
                        None,
                    ));
                }
            }

            validate_module_plan(
                module_plan,
                &module_path,
                &mut lesson_slugs,
                &mut prerequisites,
                &mut quiz_titles,
                &mut report,
            );
        }
    }

    for (path, slug) in prerequisites {
        if !lesson_slugs.contains_key(&slug) {
            report.push(ValidationIssue::warning(
                "unknown_prerequisite",
                path,
                format!("prerequisite lesson '{slug}' is not defined in this plan"),
                Some("prerequisites outside the plan must already exist in the database".to_string()),
            ));
        }
    }

    report
}

fn validate_module_plan(
    module_plan: &ModulePlan,
    module_path: &str,
    lesson_slugs: &mut HashMap<String, String>,
    prerequisites: &mut Vec<(String, String)>,
    quiz_titles: &mut HashMap<String, String>,
    report: &mut ValidationReport,
) {
    if module_plan.micro_lessons.is_empty() && module_plan.quizzes.is_empty() {
        report.push(ValidationIssue::warning(
            "module_empty",
            module_path,
            format!("module '{}' has no lessons or quizzes", module_plan.module.slug),
            None,
        ));
    }

    let mut lesson_orders = HashSet::new();
    for (lesson_idx, lesson) in module_plan.micro_lessons.iter().enumerate() {
        let lesson_path = format!("{module_path}/micro_lessons/{lesson_idx}");
        push_content_issues(report, &lesson_path, validate_micro_lesson(lesson));

        if let Some(order) = lesson.sequence_order {
            if !lesson_orders.insert(order) {
                report.push(ValidationIssue::warning(
                    "duplicate_sequence_order",
                    format!("{lesson_path}/sequence_order"),
                    format!("lesson sequence_order {order} is repeated"),
                    None,
                ));
            }
        }

        let slug = lesson
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&lesson.title));
        if slug.is_empty() {
            report.push(ValidationIssue::error(
                "lesson_slug_empty",
                format!("{lesson_path}/title"),
                format!("cannot derive a slug from title '{}'", lesson.title),
                Some("set an explicit slug".to_string()),
            ));
        } else if let Some(previous) = lesson_slugs.insert(slug.clone(), lesson_path.clone()) {
            report.push(ValidationIssue::error(
                "duplicate_lesson_slug",
                format!("{lesson_path}/slug"),
                format!("lesson slug '{slug}' is already used at {previous}"),
                Some("lesson slugs are global; set an explicit slug".to_string()),
            ));
        }

        for (idx, prerequisite) in lesson.prerequisite_slugs.iter().enumerate() {
            prerequisites.push((
                format!("{lesson_path}/prerequisite_slugs/{idx}"),
                prerequisite.clone(),
            ));
        }

        let mut exercise_orders = HashSet::new();
        for (exercise_idx, exercise) in lesson.exercises.iter().enumerate() {
            if let Some(order) = exercise.sequence_order {
                if !exercise_orders.insert(order) {
                    report.push(ValidationIssue::warning(
                        "duplicate_sequence_order",
                        format!("{lesson_path}/exercises/{exercise_idx}/sequence_order"),
                        format!("exercise sequence_order {order} is repeated"),
                        None,
                    ));
                }
            }
        }
    }

    let mut item_orders = HashSet::new();
    for (quiz_idx, quiz_plan) in module_plan.quizzes.iter().enumerate() {
        let quiz_path = format!("{module_path}/quizzes/{quiz_idx}");
        if let Some(order) = quiz_plan.item_order {
            if !item_orders.insert(order) {
                report.push(ValidationIssue::warning(
                    "duplicate_sequence_order",
                    format!("{quiz_path}/item_order"),
                    format!("module item_order {order} is repeated"),
                    None,
                ));
            }
        }
        if let Some(previous) =
            quiz_titles.insert(quiz_plan.quiz.title.clone(), quiz_path.clone())
        {
            report.push(ValidationIssue::error(
                "duplicate_quiz_title",
                format!("{quiz_path}/title"),
                format!(
                    "quiz title '{}' is already used at {previous}",
                    quiz_plan.quiz.title
                ),
                Some("quiz titles are the quiz natural key".to_string()),
            ));
        }
        validate_quiz_plan(quiz_plan, &quiz_path, report);
    }
}

fn validate_quiz_plan(quiz_plan: &QuizPlan, quiz_path: &str, report: &mut ValidationReport) {
    push_content_issues(report, quiz_path, validate_quiz(&quiz_plan.quiz));

    if quiz_plan.questions.is_empty() && quiz_plan.series.is_empty() {
        report.push(ValidationIssue::warning(
            "quiz_empty",
            quiz_path,
            format!("quiz '{}' has no questions", quiz_plan.quiz.title),
            None,
        ));
    }

    let mut texts: HashMap<String, String> = HashMap::new();
    // Literal questions without an order take their 1-based position.
    let mut orders: HashMap<i64, String> = HashMap::new();

    for (question_idx, question) in quiz_plan.questions.iter().enumerate() {
        let question_path = format!("{quiz_path}/questions/{question_idx}");
        push_content_issues(report, &question_path, validate_question(question));
        if let Some(previous) =
            texts.insert(question.question_text.clone(), question_path.clone())
        {
            report.push(duplicate_question(&question_path, &question.question_text, &previous));
        }
        let order = question
            .sequence_order
            .map(i64::from)
            .unwrap_or(question_idx as i64 + 1);
        if let Some(previous) = orders.insert(order, question_path.clone()) {
            report.push(duplicate_question_order(&question_path, order, &previous));
        }
    }

    for (series_idx, series) in quiz_plan.series.iter().enumerate() {
        let series_path = format!("{quiz_path}/series/{series_idx}");
        if !validate_series(series, &series_path, report) {
            continue;
        }
        for index in series.indices() {
            let text = series.render_text(index);
            let question_path = format!("{series_path}[i={index}]");
            if let Some(previous) = texts.insert(text.clone(), question_path.clone()) {
                report.push(duplicate_question(&question_path, &text, &previous));
            }
            if let Some(previous) = orders.insert(index, question_path.clone()) {
                report.push(duplicate_question_order(&question_path, index, &previous));
            }
        }
    }
}

/// Static checks on a series. Returns false when the series cannot be expanded.
fn validate_series(series: &QuestionSeries, path: &str, report: &mut ValidationReport) -> bool {
    let before = report.errors.len();

    if series.range.start > series.range.end {
        report.push(ValidationIssue::error(
            "series_range_inverted",
            format!("{path}/range"),
            format!(
                "range start {} is greater than end {}",
                series.range.start, series.range.end
            ),
            Some("swap start and end".to_string()),
        ));
    } else if series.len() > MAX_SERIES_LEN {
        report.push(ValidationIssue::error(
            "series_too_large",
            format!("{path}/range"),
            format!(
                "range {}..={} produces more than {MAX_SERIES_LEN} questions",
                series.range.start, series.range.end
            ),
            Some("split the series or narrow the range".to_string()),
        ));
        return false;
    }

    if !series.text_template.contains(INDEX_PLACEHOLDER) {
        report.push(ValidationIssue::error(
            "series_template_placeholder",
            format!("{path}/text_template"),
            format!("text_template must contain '{INDEX_PLACEHOLDER}' to keep question texts unique"),
            None,
        ));
    }

    if series.points <= 0 {
        report.push(ValidationIssue::error(
            "points_not_positive",
            format!("{path}/points"),
            "points must be greater than 0",
            None,
        ));
    }

    if !in_range(series.discrimination, DISCRIMINATION_RANGE) {
        report.push(out_of_range(path, "discrimination", series.discrimination, DISCRIMINATION_RANGE));
    }

    if series.range.start <= series.range.end {
        for index in [series.range.start, series.range.end] {
            let difficulty = series.difficulty_at(index);
            if !in_range(difficulty, DIFFICULTY_RANGE) {
                report.push(ValidationIssue::error(
                    "series_difficulty_range",
                    format!("{path}/difficulty"),
                    format!(
                        "difficulty at i={index} is {difficulty:.2}, outside {:?}",
                        DIFFICULTY_RANGE
                    ),
                    Some("lower step or base".to_string()),
                ));
            }
        }
    }

    for (label, shape) in [("even", &series.shapes.even), ("odd", &series.shapes.odd)] {
        let shape_path = format!("{path}/shapes/{label}");
        match shape {
            SeriesShape::Mcq { options, guessing } => {
                if !in_range(*guessing, GUESSING_RANGE) {
                    report.push(out_of_range(&shape_path, "guessing", *guessing, GUESSING_RANGE));
                }
                if options.is_empty() {
                    report.push(ValidationIssue::error(
                        "series_options_empty",
                        format!("{shape_path}/options"),
                        "mcq shape needs options",
                        None,
                    ));
                    continue;
                }
                for (option_idx, option) in options.iter().enumerate() {
                    if option.text.trim().is_empty() {
                        report.push(ValidationIssue::error(
                            "option_blank",
                            format!("{shape_path}/options/{option_idx}/text"),
                            "mcq options must have text",
                            None,
                        ));
                    }
                    if option.correct_when.divisor() == Some(0) {
                        report.push(ValidationIssue::error(
                            "series_zero_divisor",
                            format!("{shape_path}/options/{option_idx}/correct_when"),
                            "divisor must not be zero",
                            None,
                        ));
                    }
                }
                let wants_even = label == "even";
                let offending = series
                    .indices()
                    .filter(|index| (index.rem_euclid(2) == 0) == wants_even)
                    .find(|index| {
                        options
                            .iter()
                            .filter(|option| option.correct_when.holds(*index))
                            .count()
                            != 1
                    });
                if let Some(index) = offending {
                    report.push(ValidationIssue::error(
                        "series_correct_count",
                        format!("{shape_path}/options"),
                        format!("options do not yield exactly one correct answer at i={index}"),
                        Some("make the correct_when rules mutually exclusive and exhaustive".to_string()),
                    ));
                }
            }
            SeriesShape::Numerical {
                tolerance, guessing, ..
            } => {
                if *tolerance < 0.0 {
                    report.push(ValidationIssue::error(
                        "tolerance_negative",
                        format!("{shape_path}/tolerance"),
                        "tolerance must be greater than or equal to 0",
                        None,
                    ));
                }
                if !in_range(*guessing, GUESSING_RANGE) {
                    report.push(out_of_range(&shape_path, "guessing", *guessing, GUESSING_RANGE));
                }
            }
        }
    }

    report.errors.len() == before
}

fn push_content_issues(report: &mut ValidationReport, base: &str, issues: Vec<ContentIssue>) {
    for issue in issues {
        report.push(ValidationIssue {
            severity: IssueSeverity::Error,
            code: issue.code.to_string(),
            path: format!("{base}/{}", issue.field),
            message: issue.message,
            hint: None,
        });
    }
}

fn duplicate_question(path: &str, text: &str, previous: &str) -> ValidationIssue {
    ValidationIssue::error(
        "duplicate_question_text",
        path,
        format!("question text '{text}' is already used at {previous}"),
        Some("question text is the question natural key within a quiz".to_string()),
    )
}

fn duplicate_question_order(path: &str, order: i64, previous: &str) -> ValidationIssue {
    ValidationIssue::warning(
        "duplicate_sequence_order",
        format!("{path}/sequence_order"),
        format!("question sequence_order {order} is already used at {previous}"),
        Some("series questions use their index as sequence_order".to_string()),
    )
}

fn in_range(value: f64, (min, max): (f64, f64)) -> bool {
    (min..=max).contains(&value)
}

fn out_of_range(path: &str, field: &str, value: f64, (min, max): (f64, f64)) -> ValidationIssue {
    ValidationIssue::error(
        "out_of_range",
        format!("{path}/{field}"),
        format!("{field} {value} must be between {min} and {max}"),
        None,
    )
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
