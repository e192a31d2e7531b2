use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use lessonforge_core::{Course, CourseModule, DifficultyLevel, MicroLesson, Quiz, QuizQuestion};

/// Placeholder replaced by the series index in question templates.
pub const INDEX_PLACEHOLDER: &str = "{i}";

/// Largest number of questions a single series may produce.
pub const MAX_SERIES_LEN: usize = 10_000;

/// Canonical seed plan definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SeedPlan {
    /// Contract version for the plan format.
    pub plan_version: String,
    /// Seed for reproducible option shuffling.
    #[serde(default)]
    pub seed: u64,
    /// Courses described by this plan.
    pub courses: Vec<CoursePlan>,
}

/// A course together with its modules.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CoursePlan {
    #[serde(flatten)]
    pub course: Course,
    #[serde(default)]
    pub modules: Vec<ModulePlan>,
}

/// A course module with lessons and quizzes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModulePlan {
    #[serde(flatten)]
    pub module: CourseModule,
    #[serde(default)]
    pub micro_lessons: Vec<MicroLesson>,
    #[serde(default)]
    pub quizzes: Vec<QuizPlan>,
}

/// A quiz linked into a module, with literal and generated questions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuizPlan {
    #[serde(flatten)]
    pub quiz: Quiz,
    /// Position of the quiz among the module items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_order: Option<i32>,
    /// Whether the module item is required for completion.
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub series: Vec<QuestionSeries>,
}

/// Inclusive integer range driving a question series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesRange {
    pub start: i64,
    pub end: i64,
}

/// `difficulty(i) = base + (i - start) * step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinearDifficulty {
    pub base: f64,
    pub step: f64,
}

/// Difficulty bucket chosen by comparing the index with a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LevelThreshold {
    pub threshold: i64,
    pub below: DifficultyLevel,
    pub at_or_above: DifficultyLevel,
}

impl LevelThreshold {
    pub fn level_for(&self, index: i64) -> DifficultyLevel {
        if index < self.threshold {
            self.below
        } else {
            self.at_or_above
        }
    }
}

/// Predicate deciding whether an option is correct for index `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CorrectWhen {
    Always,
    Never,
    DivisibleBy { divisor: i64 },
    NotDivisibleBy { divisor: i64 },
}

impl CorrectWhen {
    pub fn holds(&self, index: i64) -> bool {
        match *self {
            CorrectWhen::Always => true,
            CorrectWhen::Never => false,
            CorrectWhen::DivisibleBy { divisor } => divisor != 0 && index.rem_euclid(divisor) == 0,
            CorrectWhen::NotDivisibleBy { divisor } => {
                divisor != 0 && index.rem_euclid(divisor) != 0
            }
        }
    }

    pub fn divisor(&self) -> Option<i64> {
        match *self {
            CorrectWhen::DivisibleBy { divisor } | CorrectWhen::NotDivisibleBy { divisor } => {
                Some(divisor)
            }
            CorrectWhen::Always | CorrectWhen::Never => None,
        }
    }
}

/// One option template of a generated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesOption {
    pub text: String,
    pub correct_when: CorrectWhen,
}

/// Question shape produced for one parity of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum SeriesShape {
    Mcq {
        options: Vec<SeriesOption>,
        #[serde(default = "default_mcq_guessing")]
        guessing: f64,
    },
    Numerical {
        /// `correct_answer = i - answer_offset`.
        answer_offset: i64,
        #[serde(default = "default_series_tolerance")]
        tolerance: f64,
        #[serde(default)]
        guessing: f64,
    },
}

/// Shapes selected by the parity of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParityShapes {
    pub even: SeriesShape,
    pub odd: SeriesShape,
}

impl ParityShapes {
    pub fn for_index(&self, index: i64) -> &SeriesShape {
        if index.rem_euclid(2) == 0 {
            &self.even
        } else {
            &self.odd
        }
    }
}

/// Declarative description of a run of near-identical questions.
///
/// For each `i` in `range`, one question is produced whose text is
/// `text_template` with `{i}` substituted. The rendered text is the question's
/// natural key within its quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionSeries {
    pub range: SeriesRange,
    pub text_template: String,
    pub difficulty: LinearDifficulty,
    pub shapes: ParityShapes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<LevelThreshold>,
    #[serde(default = "default_points")]
    pub points: i32,
    #[serde(default = "default_discrimination")]
    pub discrimination: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Shuffle generated options deterministically from the plan seed.
    #[serde(default)]
    pub shuffle_options: bool,
}

impl QuestionSeries {
    pub fn indices(&self) -> std::ops::RangeInclusive<i64> {
        self.range.start..=self.range.end
    }

    /// Number of indices in the range; saturates instead of overflowing.
    pub fn len(&self) -> usize {
        let span = i128::from(self.range.end) - i128::from(self.range.start) + 1;
        if span <= 0 {
            0
        } else {
            usize::try_from(span).unwrap_or(usize::MAX)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render_text(&self, index: i64) -> String {
        self.text_template
            .replace(INDEX_PLACEHOLDER, &index.to_string())
    }

    /// Linear difficulty for `index`, rounded to two decimals as stored.
    pub fn difficulty_at(&self, index: i64) -> f64 {
        let offset = (i128::from(index) - i128::from(self.range.start)) as f64;
        let raw = self.difficulty.base + offset * self.difficulty.step;
        (raw * 100.0).round() / 100.0
    }
}

fn default_true() -> bool {
    true
}

fn default_points() -> i32 {
    1
}

fn default_discrimination() -> f64 {
    1.0
}

fn default_mcq_guessing() -> f64 {
    0.25
}

fn default_series_tolerance() -> f64 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divisibility_handles_negative_indices() {
        let rule = CorrectWhen::DivisibleBy { divisor: 4 };
        assert!(rule.holds(-8));
        assert!(!rule.holds(-6));
        assert!(!CorrectWhen::DivisibleBy { divisor: 0 }.holds(0));
    }

    #[test]
    fn len_saturates_on_extreme_ranges() {
        let mut series: QuestionSeries = serde_json::from_value(serde_json::json!({
            "range": {"start": i64::MIN, "end": i64::MAX},
            "text_template": "Q{i}",
            "difficulty": {"base": 0.0, "step": 0.0},
            "shapes": {
                "even": {"question_type": "numerical", "answer_offset": 0},
                "odd": {"question_type": "numerical", "answer_offset": 0}
            }
        }))
        .expect("parse series");
        assert_eq!(series.len(), usize::MAX);

        series.range = SeriesRange { start: 80, end: 68 };
        assert!(series.is_empty());

        series.range = SeriesRange { start: 68, end: 80 };
        assert_eq!(series.len(), 13);
    }

    #[test]
    fn difficulty_is_rounded_to_two_decimals() {
        let series: QuestionSeries = serde_json::from_value(serde_json::json!({
            "range": {"start": 68, "end": 80},
            "text_template": "Continuity problem #{i}",
            "difficulty": {"base": -0.1, "step": 0.08},
            "shapes": {
                "even": {"question_type": "numerical", "answer_offset": 67},
                "odd": {"question_type": "numerical", "answer_offset": 67}
            }
        }))
        .expect("parse series");
        assert_eq!(series.difficulty_at(68), -0.1);
        assert_eq!(series.difficulty_at(70), 0.06);
        assert_eq!(series.difficulty_at(80), 0.86);
    }

    #[test]
    fn threshold_picks_level() {
        let threshold = LevelThreshold {
            threshold: 74,
            below: DifficultyLevel::Medium,
            at_or_above: DifficultyLevel::Hard,
        };
        assert_eq!(threshold.level_for(73), DifficultyLevel::Medium);
        assert_eq!(threshold.level_for(74), DifficultyLevel::Hard);
    }
}
