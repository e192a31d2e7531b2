use std::path::PathBuf;

use lessonforge_core::{Answer, DifficultyLevel, QuestionType};
use lessonforge_generate::{GenerationError, expand_series};
use lessonforge_plan::{QuestionSeries, SeedPlan, load_plan};

fn continuity_series() -> QuestionSeries {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../packs/calculus-continuity.plan.json");
    let plan: SeedPlan = load_plan(&path).expect("load continuity pack");
    plan.courses[0].modules[0].quizzes[0].series[0].clone()
}

#[test]
fn continuity_series_follows_the_seed_loop() {
    let series = continuity_series();
    let questions = expand_series(&series, 42).expect("expand series");
    assert_eq!(questions.len(), 13);

    for (i, question) in (68_i64..=80).zip(&questions) {
        let expected_difficulty = -0.1 + (i - 68) as f64 * 0.08;
        assert!(
            (question.difficulty - expected_difficulty).abs() < 0.005,
            "difficulty at i={i} was {}",
            question.difficulty
        );
        assert_eq!(
            question.question_text,
            format!("Continuity problem #{i}: Determine if function is continuous at a point")
        );
        assert_eq!(question.sequence_order, Some(i as i32));
        assert_eq!(question.points, 3);
        assert_eq!(question.discrimination, 1.4);
        assert_eq!(question.topic.as_deref(), Some("continuity-analysis"));

        let level = if i < 74 {
            DifficultyLevel::Medium
        } else {
            DifficultyLevel::Hard
        };
        assert_eq!(question.difficulty_level, Some(level));

        if i % 2 == 0 {
            assert_eq!(question.question_type, QuestionType::Mcq);
            assert_eq!(question.guessing, 0.25);
            assert_eq!(question.options.len(), 4);
            let correct = question.correct_option().expect("one correct option");
            let expected = if i % 4 == 0 { "Continuous" } else { "Not continuous" };
            assert_eq!(correct.text, expected);
        } else {
            assert_eq!(question.question_type, QuestionType::Numerical);
            assert_eq!(question.correct_answer, Some((i - 67).to_string()));
            assert_eq!(question.tolerance, Some(0.1));
            assert_eq!(question.guessing, 0.0);
            assert!(question.options.is_empty());
        }
    }

    assert_eq!(questions[0].difficulty, -0.1);
    assert_eq!(questions[12].difficulty, 0.86);
}

#[test]
fn generated_questions_grade_their_own_answers() {
    let questions = expand_series(&continuity_series(), 42).expect("expand series");

    let numerical = &questions[1];
    assert!(numerical.is_correct(&Answer::text("2")));
    assert!(numerical.is_correct(&Answer::text("2.05")));
    assert!(!numerical.is_correct(&Answer::text("3")));

    let mcq = &questions[0];
    assert!(mcq.is_correct(&Answer::text("continuous")));
    assert!(!mcq.is_correct(&Answer::text("Cannot determine")));
}

#[test]
fn shuffle_is_seeded_and_keeps_the_answer() {
    let mut series = continuity_series();
    series.shuffle_options = true;

    let first = expand_series(&series, 42).expect("expand series");
    let again = expand_series(&series, 42).expect("expand series again");
    assert_eq!(first, again);

    for (i, question) in (68_i64..=80).zip(&first) {
        if i % 2 == 0 {
            let expected = if i % 4 == 0 { "Continuous" } else { "Not continuous" };
            let correct = question.correct_option().expect("one correct option");
            assert_eq!(correct.text, expected);
            assert_eq!(question.correct_option_count(), 1);
        }
    }
}

#[test]
fn inverted_range_is_rejected() {
    let mut series = continuity_series();
    series.range.start = 90;

    let err = expand_series(&series, 0).expect_err("inverted range");
    assert!(matches!(err, GenerationError::InvalidSeries { .. }));
    assert!(err.to_string().contains("greater than end"));
}

#[test]
fn template_without_placeholder_is_rejected() {
    let mut series = continuity_series();
    series.text_template = "Continuity problem".to_string();

    let err = expand_series(&series, 0).expect_err("no placeholder");
    assert!(err.to_string().contains("placeholder"));
}

#[test]
fn predicates_without_a_correct_option_are_rejected() {
    let mut series = continuity_series();
    if let lessonforge_plan::SeriesShape::Mcq { options, .. } = &mut series.shapes.even {
        options.remove(1);
    }

    let err = expand_series(&series, 0).expect_err("no correct option at i=70");
    assert!(err.to_string().contains("0 correct options at i=70"));
}

#[test]
fn single_index_range_yields_one_question() {
    let mut series = continuity_series();
    series.range.start = 80;
    series.range.end = 80;

    let questions = expand_series(&series, 0).expect("expand series");
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].difficulty, -0.1);
}

#[test]
fn oversized_range_is_rejected_before_expansion() {
    let mut series = continuity_series();
    series.range.start = 0;
    series.range.end = i64::MAX / 4;

    let err = expand_series(&series, 0).expect_err("range too large");
    assert!(matches!(err, GenerationError::InvalidSeries { .. }));
    assert!(err.to_string().contains("more than 10000 questions"));

    series.range.start = i64::MIN;
    series.range.end = i64::MAX;
    assert!(expand_series(&series, 0).is_err());
}

#[test]
fn generated_questions_pass_question_validation() {
    let mut series = continuity_series();
    if let lessonforge_plan::SeriesShape::Mcq { options, .. } = &mut series.shapes.even {
        options[2].text = "   ".to_string();
    }

    let err = expand_series(&series, 0).expect_err("blank option text");
    assert!(err.to_string().contains("i=68"));
    assert!(err.to_string().contains("option_blank"));
}
