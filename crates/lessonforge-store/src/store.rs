use async_trait::async_trait;

use lessonforge_core::{Course, ModuleItem, Quiz, QuizQuestion};
use lessonforge_generate::{ExerciseRecord, LessonRecord, ModuleRecord};

use crate::errors::Result;
use crate::model::{Outcome, SeedMode};
use crate::row::{self, RowSpec};

/// Destination for seeded content.
///
/// Backends only implement `apply_row`; the typed upserts map records to rows
/// keyed by their natural keys.
#[async_trait]
pub trait ContentStore: Send {
    /// Returns the backend identifier (e.g. `postgres`).
    fn backend(&self) -> &'static str;

    /// Find the row by its keys, then insert it or, in `Update` mode, overwrite
    /// its columns when they differ.
    async fn apply_row(&mut self, row: RowSpec, mode: SeedMode) -> Result<(i64, Outcome)>;

    async fn upsert_course(&mut self, course: &Course, mode: SeedMode) -> Result<(i64, Outcome)> {
        let row = row::course_row(course)?;
        self.apply_row(row, mode).await
    }

    async fn upsert_module(
        &mut self,
        course_id: i64,
        module: &ModuleRecord,
        mode: SeedMode,
    ) -> Result<(i64, Outcome)> {
        let row = row::module_row(course_id, module)?;
        self.apply_row(row, mode).await
    }

    async fn upsert_quiz(&mut self, quiz: &Quiz, mode: SeedMode) -> Result<(i64, Outcome)> {
        let row = row::quiz_row(quiz)?;
        self.apply_row(row, mode).await
    }

    async fn link_module_item(
        &mut self,
        module_id: i64,
        item_id: i64,
        item: &ModuleItem,
        mode: SeedMode,
    ) -> Result<(i64, Outcome)> {
        let row = row::module_item_row(module_id, item_id, item);
        self.apply_row(row, mode).await
    }

    async fn upsert_micro_lesson(
        &mut self,
        module_id: i64,
        lesson: &LessonRecord,
        mode: SeedMode,
    ) -> Result<(i64, Outcome)> {
        let row = row::lesson_row(module_id, lesson)?;
        self.apply_row(row, mode).await
    }

    async fn upsert_exercise(
        &mut self,
        lesson_id: i64,
        exercise: &ExerciseRecord,
        mode: SeedMode,
    ) -> Result<(i64, Outcome)> {
        let row = row::exercise_row(lesson_id, exercise)?;
        self.apply_row(row, mode).await
    }

    async fn upsert_question(
        &mut self,
        quiz_id: i64,
        question: &QuizQuestion,
        mode: SeedMode,
    ) -> Result<(i64, Outcome)> {
        let row = row::question_row(quiz_id, question)?;
        self.apply_row(row, mode).await
    }
}
