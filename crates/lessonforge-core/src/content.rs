use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Target audience level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseDifficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseDifficulty::Beginner => "beginner",
            CourseDifficulty::Intermediate => "intermediate",
            CourseDifficulty::Advanced => "advanced",
        }
    }
}

/// Coarse difficulty bucket used by lessons, exercises and questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        }
    }
}

/// A published course; `slug` is its natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Course {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<CourseDifficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub sequence_order: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub learning_objectives: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
}

/// Ordered chapter of a course; `slug` is unique within the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CourseModule {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position within the course. Assigned from list order when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

/// Assessment container; `title` is its natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Quiz {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default = "default_true")]
    pub shuffle_questions: bool,
    #[serde(default = "default_true")]
    pub show_correct_answers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_type: Option<String>,
}

/// Kind of record a module item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleItemKind {
    Quiz,
}

impl ModuleItemKind {
    /// Polymorphic type name stored in `module_items.item_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleItemKind::Quiz => "Quiz",
        }
    }
}

/// Ordered link between a course module and an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleItem {
    pub item_kind: ModuleItemKind,
    pub sequence_order: i32,
    #[serde(default = "default_true")]
    pub required: bool,
}

/// Bite-sized markdown lesson belonging to a course module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MicroLesson {
    /// Globally unique. Derived from the title when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_order: Option<i32>,
    #[serde(default = "default_lesson_minutes")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_concepts: Vec<String>,
    /// Slugs of lessons that should be completed first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisite_slugs: Vec<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Exercise>,
}

/// Practice item attached to a micro lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Exercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_order: Option<i32>,
    #[serde(flatten)]
    pub data: ExerciseData,
}

/// Expected/forbidden substrings in command output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutputValidation {
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub must_not_include: Vec<String>,
}

/// Resource limits for sandboxed runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SandboxConstraints {
    pub cpus: u32,
    pub mem_mb: u32,
}

impl Default for SandboxConstraints {
    fn default() -> Self {
        Self {
            cpus: 1,
            mem_mb: 256,
        }
    }
}

/// Test commands for code exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeTests {
    pub run: String,
    #[serde(default)]
    pub visible: Vec<String>,
    #[serde(default)]
    pub hidden: Vec<String>,
}

/// Exercise payload, tagged by `exercise_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "exercise_type", rename_all = "snake_case")]
pub enum ExerciseData {
    Mcq {
        question: String,
        options: Vec<String>,
        /// Index into `options`.
        correct_answer: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        difficulty: Option<DifficultyLevel>,
        #[serde(default = "default_true")]
        require_pass: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        hints: Vec<String>,
    },
    ShortAnswer {
        question: String,
        answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        difficulty: Option<DifficultyLevel>,
        #[serde(default = "default_true")]
        require_pass: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        hints: Vec<String>,
    },
    Terminal {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        difficulty: Option<DifficultyLevel>,
        #[serde(default = "default_timeout_sec")]
        timeout_sec: u32,
        #[serde(default)]
        validation: OutputValidation,
        #[serde(default = "default_true")]
        require_pass: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        hints: Vec<String>,
    },
    Sandbox {
        run: String,
        #[serde(default = "default_timeout_sec")]
        timeout_sec: u32,
        #[serde(default)]
        constraints: SandboxConstraints,
        #[serde(default)]
        validation: OutputValidation,
        #[serde(default = "default_true")]
        require_pass: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        hints: Vec<String>,
    },
    Code {
        files: Vec<String>,
        starter_code: String,
        tests: CodeTests,
        #[serde(default = "default_true")]
        require_pass: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        hints: Vec<String>,
    },
}

impl ExerciseData {
    /// Value stored in `exercises.exercise_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ExerciseData::Mcq { .. } => "mcq",
            ExerciseData::ShortAnswer { .. } => "short_answer",
            ExerciseData::Terminal { .. } => "terminal",
            ExerciseData::Sandbox { .. } => "sandbox",
            ExerciseData::Code { .. } => "code",
        }
    }
}

/// Shape of a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    FillBlank,
    Command,
    TrueFalse,
    Numerical,
    EquationBalance,
    Sequence,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Command => "command",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Numerical => "numerical",
            QuestionType::EquationBalance => "equation_balance",
            QuestionType::Sequence => "sequence",
        }
    }
}

/// One choice of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionOption {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

impl QuestionOption {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            text: text.into(),
            correct,
        }
    }
}

/// One orderable element of a sequence question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SequenceItem {
    pub id: String,
    pub text: String,
}

/// Quiz question with IRT scoring metadata; `question_text` is unique per quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuizQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default = "default_points")]
    pub points: i32,
    /// IRT difficulty (b parameter).
    #[serde(default)]
    pub difficulty: f64,
    /// IRT discrimination (a parameter).
    #[serde(default = "default_discrimination")]
    pub discrimination: f64,
    /// IRT pseudo-guessing (c parameter).
    #[serde(default = "default_guessing")]
    pub guessing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Accepted absolute error for numerical answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub multiple_correct: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence_items: Vec<SequenceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_order: Option<i32>,
}

impl QuizQuestion {
    /// Build a question with default scoring metadata.
    pub fn new(question_text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            question_text: question_text.into(),
            question_type,
            options: Vec::new(),
            correct_answer: None,
            explanation: None,
            points: default_points(),
            difficulty: 0.0,
            discrimination: default_discrimination(),
            guessing: default_guessing(),
            difficulty_level: None,
            topic: None,
            skill_dimension: None,
            tags: Vec::new(),
            tolerance: None,
            multiple_correct: false,
            sequence_items: Vec::new(),
            sequence_order: None,
        }
    }

    pub fn correct_option_count(&self) -> usize {
        self.options.iter().filter(|option| option.correct).count()
    }
}

pub const DEFAULT_TOLERANCE: f64 = 0.01;

fn default_true() -> bool {
    true
}

fn default_passing_score() -> u32 {
    70
}

fn default_lesson_minutes() -> u32 {
    2
}

fn default_timeout_sec() -> u32 {
    30
}

fn default_points() -> i32 {
    1
}

fn default_discrimination() -> f64 {
    1.0
}

fn default_guessing() -> f64 {
    0.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_data_is_tagged_by_exercise_type() {
        let json = r#"{
            "sequence_order": 2,
            "exercise_type": "short_answer",
            "question": "How many moles of HCl are formed?",
            "answer": "1.0"
        }"#;
        let exercise: Exercise = serde_json::from_str(json).expect("parse exercise");
        assert_eq!(exercise.sequence_order, Some(2));
        assert_eq!(exercise.data.kind(), "short_answer");
        match exercise.data {
            ExerciseData::ShortAnswer { require_pass, .. } => assert!(require_pass),
            other => panic!("unexpected exercise data: {other:?}"),
        }
    }

    #[test]
    fn question_defaults_match_table_defaults() {
        let json = r#"{"question_text": "Calculate the value", "question_type": "numerical"}"#;
        let question: QuizQuestion = serde_json::from_str(json).expect("parse question");
        assert_eq!(question.points, 1);
        assert_eq!(question.difficulty, 0.0);
        assert_eq!(question.discrimination, 1.0);
        assert_eq!(question.guessing, 0.2);
        assert!(!question.multiple_correct);
        assert!(question.tolerance.is_none());
    }
}
