use std::fs;
use std::path::PathBuf;

use lessonforge_core::QuestionType;
use lessonforge_generate::{
    GenerateOptions, GenerationEngine, GenerationError, QuestionSource, build_bundle, summarize,
};
use lessonforge_plan::{SeedPlan, load_plan};

fn load_pack(name: &str) -> SeedPlan {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../packs")
        .join(name);
    load_plan(&path).expect("load pack")
}

#[test]
fn bundle_orders_literal_questions_before_series() {
    let plan = load_pack("calculus-continuity.plan.json");
    let bundle = build_bundle(&plan).expect("build bundle");

    assert_eq!(bundle.courses.len(), 1);
    assert_eq!(bundle.modules.len(), 1);
    assert_eq!(bundle.quizzes.len(), 1);
    assert_eq!(bundle.module_items.len(), 1);
    assert_eq!(bundle.module_items[0].item.sequence_order, 3);
    assert_eq!(bundle.micro_lessons.len(), 2);
    assert_eq!(bundle.exercises.len(), 2);
    assert_eq!(bundle.questions.len(), 14);

    assert_eq!(bundle.questions[0].source, QuestionSource::Literal);
    assert_eq!(bundle.questions[0].question.sequence_order, Some(1));
    assert_eq!(
        bundle.questions[1].source,
        QuestionSource::Series {
            series: 0,
            index: 68
        }
    );
}

#[test]
fn lesson_slug_is_derived_from_title() {
    let plan = load_pack("calculus-continuity.plan.json");
    let bundle = build_bundle(&plan).expect("build bundle");

    assert_eq!(bundle.micro_lessons[0].slug, "continuity-at-a-point");
    assert_eq!(bundle.micro_lessons[1].slug, "removable-discontinuities");
    assert_eq!(bundle.exercises[0].lesson_slug, "continuity-at-a-point");
}

#[test]
fn duplicate_question_text_fails_the_bundle() {
    let mut plan = load_pack("calculus-continuity.plan.json");
    plan.courses[0].modules[0].quizzes[0].questions[0].question_text =
        "Continuity problem #75: Determine if function is continuous at a point".to_string();

    let err = build_bundle(&plan).expect_err("duplicate text");
    assert!(matches!(err, GenerationError::InvalidPlan(_)));
}

#[test]
fn summary_counts_course_content() {
    let plan = load_pack("calculus-continuity.plan.json");
    let bundle = build_bundle(&plan).expect("build bundle");
    let summary = summarize(&bundle);

    let course = summary
        .course("iit-jee-mathematics-calculus")
        .expect("course summary");
    assert_eq!(course.modules, 1);
    assert_eq!(course.micro_lessons, 2);
    assert_eq!(course.estimated_minutes, 5);
    assert_eq!(course.exercises, 2);
    assert_eq!(course.quizzes, 1);
    assert_eq!(course.questions, 14);
    assert_eq!(course.generated_questions, 13);
    assert_eq!(course.questions_by_type.get("mcq"), Some(&7));
    assert_eq!(course.questions_by_type.get("numerical"), Some(&7));
    assert_eq!(course.questions_by_level.get("medium"), Some(&6));
    assert_eq!(course.questions_by_level.get("hard"), Some(&7));
    assert_eq!(summary.total_questions(), 14);

    let printed = summary.to_string();
    assert!(printed.contains("Questions: 14 (13 generated)"));
}

#[test]
fn run_writes_artifacts() {
    let plan = load_pack("calculus-continuity.plan.json");
    let out_dir = temp_out_dir("artifacts");

    let engine = GenerationEngine::new(GenerateOptions {
        out_dir: out_dir.clone(),
        ..GenerateOptions::default()
    });
    let result = engine.run(&plan).expect("run generation");

    for name in [
        "bundle.json",
        "generation_report.json",
        "courses.csv",
        "course_modules.csv",
        "quizzes.csv",
        "module_items.csv",
        "micro_lessons.csv",
        "exercises.csv",
        "quiz_questions.csv",
    ] {
        assert!(result.run_dir.join(name).exists(), "missing {name}");
    }

    let questions_csv =
        fs::read_to_string(result.run_dir.join("quiz_questions.csv")).expect("read questions csv");
    assert_eq!(questions_csv.lines().count(), 15);
    assert!(questions_csv.starts_with("quiz_title,question_text,question_type"));

    let report = &result.report;
    assert_eq!(report.records.get("quiz_questions"), Some(&14));
    assert_eq!(report.series_expanded, 1);
    assert_eq!(report.generated_questions, 13);
    assert_eq!(
        report.questions_by_type.get(QuestionType::Numerical.as_str()),
        Some(&7)
    );
    assert_eq!(report.warnings_by_code.get("lesson_slug_derived"), Some(&1));
    assert!(report.bytes_written > 0);

    let bundle_json = fs::read_to_string(result.run_dir.join("bundle.json")).expect("read bundle");
    let reread: lessonforge_generate::ContentBundle =
        serde_json::from_str(&bundle_json).expect("parse bundle");
    assert_eq!(reread, result.bundle);
}

#[test]
fn csv_output_is_deterministic() {
    let plan = load_pack("calculus-continuity.plan.json");

    let run = |label: &str| {
        let engine = GenerationEngine::new(GenerateOptions {
            out_dir: temp_out_dir(label),
            ..GenerateOptions::default()
        });
        let result = engine.run(&plan).expect("run generation");
        fs::read_to_string(result.run_dir.join("quiz_questions.csv")).expect("read csv")
    };

    assert_eq!(run("run_a"), run("run_b"));
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "lessonforge_generate_{label}_{}",
        uuid::Uuid::new_v4()
    ));
    fs::create_dir_all(&dir).expect("create temp out dir");
    dir
}
