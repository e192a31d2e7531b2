use std::path::{Path, PathBuf};

use lessonforge_plan::{
    CorrectWhen, PlanError, SeedPlan, SeriesShape, load_plan, load_plan_value,
    plan_json_schema_value, validate_plan, validate_plan_json, validate_plan_semantics,
};

fn pack_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../packs")
        .join(name)
}

fn continuity_json() -> serde_json::Value {
    load_plan_value(&pack_path("calculus-continuity.plan.json")).expect("load continuity pack")
}

fn continuity_plan() -> SeedPlan {
    serde_json::from_value(continuity_json()).expect("parse continuity pack")
}

#[test]
fn continuity_pack_validates() {
    let plan_json = continuity_json();
    let schema = plan_json_schema_value().expect("plan schema");

    let structural = validate_plan_json(&plan_json, &schema).expect("compile schema");
    assert!(structural.errors.is_empty(), "structural errors: {:?}", structural.errors);

    let validated = validate_plan(&plan_json, &schema).expect("plan validation should succeed");
    assert!(validated.warnings.is_empty(), "unexpected warnings: {:?}", validated.warnings);

    let quiz = &validated.plan.courses[0].modules[0].quizzes[0];
    assert_eq!(quiz.series.len(), 1);
    assert_eq!(quiz.series[0].len(), 13);
    assert!(matches!(quiz.series[0].shapes.odd, SeriesShape::Numerical { answer_offset: 67, .. }));
}

#[test]
fn toml_pack_loads() {
    let plan = load_plan(&pack_path("docker-basics.plan.toml")).expect("load toml pack");
    assert_eq!(plan.seed, 7);
    let lesson = &plan.courses[0].modules[0].micro_lessons[0];
    assert_eq!(lesson.exercises[0].data.kind(), "terminal");

    let report = validate_plan_semantics(&plan);
    assert!(report.is_ok(), "errors: {:?}", report.errors);
}

#[test]
fn unknown_extension_is_rejected() {
    let err = load_plan_value(Path::new("content.yaml")).expect_err("yaml is not supported");
    assert!(matches!(err, PlanError::UnsupportedFormat(_)));
}

#[test]
fn schema_violation_reports_pointer() {
    let mut plan_json = continuity_json();
    plan_json["courses"][0]["modules"][0]["quizzes"][0]["series"][0]["range"]["start"] =
        serde_json::json!("sixty-eight");
    let schema = plan_json_schema_value().expect("plan schema");

    let report = validate_plan(&plan_json, &schema).expect_err("schema violation");
    assert!(report.has_code("schema_violation"));
    assert!(
        report
            .errors
            .iter()
            .any(|issue| issue.path.ends_with("/series/0/range/start")),
        "paths: {:?}",
        report.errors
    );
}

#[test]
fn inverted_range_and_missing_placeholder_are_errors() {
    let mut plan = continuity_plan();
    let series = &mut plan.courses[0].modules[0].quizzes[0].series[0];
    series.range.start = 81;
    series.text_template = "Continuity problem".to_string();

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("series_range_inverted"));
    assert!(report.has_code("series_template_placeholder"));
}

#[test]
fn overlapping_correct_rules_are_rejected() {
    let mut plan = continuity_plan();
    let series = &mut plan.courses[0].modules[0].quizzes[0].series[0];
    if let SeriesShape::Mcq { options, .. } = &mut series.shapes.even {
        options[2].correct_when = CorrectWhen::Always;
    }

    let report = validate_plan_semantics(&plan);
    let issue = report
        .errors
        .iter()
        .find(|issue| issue.code == "series_correct_count")
        .expect("correct count issue");
    assert!(issue.message.contains("i=68"));
}

#[test]
fn difficulty_outside_irt_range_is_rejected() {
    let mut plan = continuity_plan();
    plan.courses[0].modules[0].quizzes[0].series[0].difficulty.step = 0.5;

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("series_difficulty_range"));
}

#[test]
fn series_text_colliding_with_literal_question_is_rejected() {
    let mut plan = continuity_plan();
    let quiz = &mut plan.courses[0].modules[0].quizzes[0];
    quiz.questions[0].question_text =
        "Continuity problem #70: Determine if function is continuous at a point".to_string();

    let report = validate_plan_semantics(&plan);
    let issue = report
        .errors
        .iter()
        .find(|issue| issue.code == "duplicate_question_text")
        .expect("duplicate question text");
    assert!(issue.path.ends_with("/series/0[i=70]"));
}

#[test]
fn derived_lesson_slugs_must_be_unique() {
    let mut plan = continuity_plan();
    let lessons = &mut plan.courses[0].modules[0].micro_lessons;
    lessons[1].slug = Some("continuity-at-a-point".to_string());

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("duplicate_lesson_slug"));
}

#[test]
fn unknown_prerequisite_is_a_warning() {
    let mut plan = continuity_plan();
    plan.courses[0].modules[0].micro_lessons[1].prerequisite_slugs =
        vec!["limits-intro".to_string()];

    let report = validate_plan_semantics(&plan);
    assert!(report.is_ok());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].code, "unknown_prerequisite");
    assert_eq!(
        report.warnings[0].path,
        "/courses/0/modules/0/micro_lessons/1/prerequisite_slugs/0"
    );
}

#[test]
fn literal_question_issues_are_prefixed() {
    let mut plan = continuity_plan();
    plan.courses[0].modules[0].quizzes[0].questions[0].correct_answer =
        Some("minus three".to_string());

    let report = validate_plan_semantics(&plan);
    let issue = report
        .errors
        .iter()
        .find(|issue| issue.code == "answer_not_numeric")
        .expect("numeric answer issue");
    assert_eq!(
        issue.path,
        "/courses/0/modules/0/quizzes/0/questions/0/correct_answer"
    );
}

#[test]
fn version_mismatch_is_an_error() {
    let mut plan = continuity_plan();
    plan.plan_version = "9.9".to_string();

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("plan_version_mismatch"));
}

#[test]
fn oversized_series_is_rejected_without_expansion() {
    let mut plan = continuity_plan();
    let series = &mut plan.courses[0].modules[0].quizzes[0].series[0];
    series.range.start = 0;
    series.range.end = i64::MAX / 4;

    let report = validate_plan_semantics(&plan);
    let issue = report
        .errors
        .iter()
        .find(|issue| issue.code == "series_too_large")
        .expect("series too large");
    assert!(issue.path.ends_with("/series/0/range"));
    assert!(!report.has_code("series_correct_count"));
}

#[test]
fn blank_series_option_is_rejected() {
    let mut plan = continuity_plan();
    let series = &mut plan.courses[0].modules[0].quizzes[0].series[0];
    if let SeriesShape::Mcq { options, .. } = &mut series.shapes.even {
        options[3].text = "  ".to_string();
    }

    let report = validate_plan_semantics(&plan);
    let issue = report
        .errors
        .iter()
        .find(|issue| issue.code == "option_blank")
        .expect("blank option");
    assert!(issue.path.ends_with("/series/0/shapes/even/options/3/text"));
}

#[test]
fn zero_divisor_is_rejected() {
    let mut plan = continuity_plan();
    let series = &mut plan.courses[0].modules[0].quizzes[0].series[0];
    if let SeriesShape::Mcq { options, .. } = &mut series.shapes.even {
        options[0].correct_when = CorrectWhen::DivisibleBy { divisor: 0 };
    }

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("series_zero_divisor"));
}

#[test]
fn empty_plan_is_rejected() {
    let mut plan = continuity_plan();
    plan.courses.clear();

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("courses_empty"));
}

#[test]
fn duplicate_course_slug_is_rejected() {
    let mut plan = continuity_plan();
    let copy = plan.courses[0].clone();
    plan.courses.push(copy);

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("duplicate_course_slug"));
}

#[test]
fn duplicate_module_slug_is_rejected() {
    let mut plan = continuity_plan();
    let copy = plan.courses[0].modules[0].clone();
    plan.courses[0].modules.push(copy);

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("duplicate_module_slug"));
}

#[test]
fn duplicate_quiz_title_is_rejected() {
    let mut plan = continuity_plan();
    let quizzes = &mut plan.courses[0].modules[0].quizzes;
    let mut copy = quizzes[0].clone();
    copy.item_order = Some(4);
    quizzes.push(copy);

    let report = validate_plan_semantics(&plan);
    assert!(report.has_code("duplicate_quiz_title"));
}

#[test]
fn empty_module_and_quiz_are_warnings() {
    let mut plan = continuity_plan();
    let modules = &mut plan.courses[0].modules;
    let mut empty = modules[0].clone();
    empty.module.slug = "limits".to_string();
    empty.module.sequence_order = None;
    empty.micro_lessons.clear();
    empty.quizzes.clear();
    modules.push(empty);

    let quiz = &mut modules[0].quizzes[0];
    quiz.questions.clear();
    quiz.series.clear();

    let report = validate_plan_semantics(&plan);
    assert!(report.is_ok(), "errors: {:?}", report.errors);
    assert!(report.has_code("module_empty"));
    assert!(report.has_code("quiz_empty"));
}

#[test]
fn repeated_lesson_order_is_a_warning() {
    let mut plan = continuity_plan();
    plan.courses[0].modules[0].micro_lessons[1].sequence_order = Some(1);

    let report = validate_plan_semantics(&plan);
    assert!(report.is_ok(), "errors: {:?}", report.errors);
    assert!(report.has_code("duplicate_sequence_order"));
    assert_eq!(
        report.warnings[0].path,
        "/courses/0/modules/0/micro_lessons/1/sequence_order"
    );
}

#[test]
fn repeated_quiz_item_order_is_a_warning() {
    let mut plan = continuity_plan();
    let quizzes = &mut plan.courses[0].modules[0].quizzes;
    let mut copy = quizzes[0].clone();
    copy.quiz.title = "Continuity review".to_string();
    quizzes.push(copy);

    let report = validate_plan_semantics(&plan);
    assert!(report.is_ok(), "errors: {:?}", report.errors);
    assert!(
        report
            .warnings
            .iter()
            .any(|issue| issue.code == "duplicate_sequence_order"
                && issue.path == "/courses/0/modules/0/quizzes/1/item_order"),
        "warnings: {:?}",
        report.warnings
    );
}

#[test]
fn literal_question_order_colliding_with_series_index_is_a_warning() {
    let mut plan = continuity_plan();
    plan.courses[0].modules[0].quizzes[0].questions[0].sequence_order = Some(70);

    let report = validate_plan_semantics(&plan);
    assert!(report.is_ok(), "errors: {:?}", report.errors);
    let issue = report
        .warnings
        .iter()
        .find(|issue| issue.code == "duplicate_sequence_order")
        .expect("duplicate order warning");
    assert!(issue.path.ends_with("/series/0[i=70]/sequence_order"));
    assert!(issue.message.contains("/questions/0"));
}
