use serde::{Deserialize, Serialize};

use lessonforge_core::{
    Course, CourseModule, DifficultyLevel, ExerciseData, ModuleItem, QuestionType, Quiz,
    QuizQuestion,
};

/// Fully resolved content, flattened in dependency order.
///
/// Every child record carries the natural keys of its parents so the bundle
/// can be written to disk or applied to a store without the plan tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub content_version: String,
    pub seed: u64,
    pub courses: Vec<Course>,
    pub modules: Vec<ModuleRecord>,
    pub quizzes: Vec<Quiz>,
    pub module_items: Vec<ModuleItemRecord>,
    pub micro_lessons: Vec<LessonRecord>,
    pub exercises: Vec<ExerciseRecord>,
    pub questions: Vec<QuestionRecord>,
}

impl ContentBundle {
    /// Record counts keyed by table name.
    pub fn record_counts(&self) -> [(&'static str, usize); 7] {
        [
            ("courses", self.courses.len()),
            ("course_modules", self.modules.len()),
            ("quizzes", self.quizzes.len()),
            ("module_items", self.module_items.len()),
            ("micro_lessons", self.micro_lessons.len()),
            ("exercises", self.exercises.len()),
            ("quiz_questions", self.questions.len()),
        ]
    }

    pub fn questions_for<'a>(
        &'a self,
        quiz_title: &str,
    ) -> impl Iterator<Item = &'a QuestionRecord> {
        self.questions
            .iter()
            .filter(move |record| record.quiz_title == quiz_title)
    }

    pub fn find_question(&self, quiz_title: &str, question_text: &str) -> Option<&QuizQuestion> {
        self.questions_for(quiz_title)
            .find(|record| record.question.question_text == question_text)
            .map(|record| &record.question)
    }
}

/// Course module with its course key; `sequence_order` is always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub course_slug: String,
    #[serde(flatten)]
    pub module: CourseModule,
}

impl ModuleRecord {
    pub fn sequence_order(&self) -> i32 {
        self.module.sequence_order.unwrap_or_default()
    }
}

/// Link between a module and a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleItemRecord {
    pub course_slug: String,
    pub module_slug: String,
    pub quiz_title: String,
    #[serde(flatten)]
    pub item: ModuleItem,
}

/// Micro lesson with resolved slug and order, without its exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub course_slug: String,
    pub module_slug: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub sequence_order: i32,
    pub estimated_minutes: u32,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub prerequisite_slugs: Vec<String>,
    pub published: bool,
}

/// Exercise keyed by lesson slug and sequence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub lesson_slug: String,
    pub sequence_order: i32,
    #[serde(flatten)]
    pub data: ExerciseData,
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionSource {
    Literal,
    Series { series: usize, index: i64 },
}

/// Quiz question keyed by quiz title and question text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub quiz_title: String,
    pub source: QuestionSource,
    #[serde(flatten)]
    pub question: QuizQuestion,
}

impl QuestionRecord {
    pub fn question_type(&self) -> QuestionType {
        self.question.question_type
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.source, QuestionSource::Series { .. })
    }
}
