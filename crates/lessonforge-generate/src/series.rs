//! Expansion of declarative question series.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use lessonforge_core::{QuestionOption, QuestionType, QuizQuestion, validate_question};
use lessonforge_plan::{INDEX_PLACEHOLDER, MAX_SERIES_LEN, QuestionSeries, SeriesShape};

use crate::errors::{GenerationError, Result};

/// Expand a series into one question per index, in index order.
///
/// Difficulty is rounded to two decimals. When `shuffle_options` is set the
/// option order is a pure function of `seed` and the rendered question text.
pub fn expand_series(series: &QuestionSeries, seed: u64) -> Result<Vec<QuizQuestion>> {
    if series.range.start > series.range.end {
        return Err(invalid(
            series,
            format!(
                "range start {} is greater than end {}",
                series.range.start, series.range.end
            ),
        ));
    }
    if !series.text_template.contains(INDEX_PLACEHOLDER) {
        return Err(invalid(
            series,
            format!("text_template has no '{INDEX_PLACEHOLDER}' placeholder"),
        ));
    }

    if series.len() > MAX_SERIES_LEN {
        return Err(invalid(
            series,
            format!(
                "range {}..={} produces more than {MAX_SERIES_LEN} questions",
                series.range.start, series.range.end
            ),
        ));
    }

    let mut questions = Vec::with_capacity(series.len());
    for index in series.indices() {
        questions.push(question_at(series, index, seed)?);
    }
    Ok(questions)
}

fn question_at(series: &QuestionSeries, index: i64, seed: u64) -> Result<QuizQuestion> {
    let text = series.render_text(index);
    let sequence_order = i32::try_from(index)
        .map_err(|_| invalid(series, format!("index {index} does not fit a sequence order")))?;

    let shape = series.shapes.for_index(index);
    let mut question = match shape {
        SeriesShape::Mcq { .. } => QuizQuestion::new(text, QuestionType::Mcq),
        SeriesShape::Numerical { .. } => QuizQuestion::new(text, QuestionType::Numerical),
    };

    match shape {
        SeriesShape::Mcq { options, guessing } => {
            if options.is_empty() {
                return Err(invalid(series, "mcq shape has no options".to_string()));
            }
            let mut resolved: Vec<QuestionOption> = options
                .iter()
                .map(|option| QuestionOption::new(option.text.clone(), option.correct_when.holds(index)))
                .collect();
            let correct = resolved.iter().filter(|option| option.correct).count();
            if correct != 1 {
                return Err(invalid(
                    series,
                    format!("mcq shape yields {correct} correct options at i={index}"),
                ));
            }
            if series.shuffle_options {
                let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(seed, &question.question_text));
                resolved.shuffle(&mut rng);
            }
            question.options = resolved;
            question.guessing = *guessing;
        }
        SeriesShape::Numerical {
            answer_offset,
            tolerance,
            guessing,
        } => {
            question.correct_answer = Some((index - answer_offset).to_string());
            question.tolerance = Some(*tolerance);
            question.guessing = *guessing;
        }
    }

    question.difficulty = series.difficulty_at(index);
    question.difficulty_level = series.difficulty_level.map(|level| level.level_for(index));
    question.points = series.points;
    question.discrimination = series.discrimination;
    question.topic = series.topic.clone();
    question.skill_dimension = series.skill_dimension.clone();
    question.explanation = series.explanation.clone();
    question.tags = series.tags.clone();
    question.sequence_order = Some(sequence_order);

    if let Some(issue) = validate_question(&question).into_iter().next() {
        return Err(invalid(
            series,
            format!(
                "question at i={index} is invalid: {} ({}): {}",
                issue.field, issue.code, issue.message
            ),
        ));
    }

    Ok(question)
}

fn invalid(series: &QuestionSeries, message: String) -> GenerationError {
    GenerationError::InvalidSeries {
        template: series.text_template.clone(),
        message,
    }
}

/// FNV-1a over the key, starting from the plan seed.
pub(crate) fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
