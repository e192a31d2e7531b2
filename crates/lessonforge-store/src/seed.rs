use std::collections::HashMap;
use std::time::Instant;

use tracing::info;

use lessonforge_generate::ContentBundle;

use crate::errors::{Result, StoreError};
use crate::model::{SeedMode, SeedReport};
use crate::store::ContentStore;

/// Apply every record of the bundle in parent-first order.
///
/// Parents are resolved through the ids returned for their natural keys, so a
/// bundle that references a record it does not contain fails with
/// [`StoreError::MissingParent`].
pub async fn seed_bundle<S>(
    store: &mut S,
    bundle: &ContentBundle,
    mode: SeedMode,
) -> Result<SeedReport>
where
    S: ContentStore + ?Sized,
{
    let start = Instant::now();
    let mut report = SeedReport::new(store.backend(), mode);

    info!(
        event = "seed_started",
        backend = store.backend(),
        mode = %mode,
        questions = bundle.questions.len(),
        "seeding bundle"
    );

    let mut course_ids = HashMap::new();
    for course in &bundle.courses {
        let (id, outcome) = store.upsert_course(course, mode).await?;
        report.record("courses", outcome);
        course_ids.insert(course.slug.as_str(), id);
    }

    let mut module_ids = HashMap::new();
    for module in &bundle.modules {
        let course_id = lookup(&course_ids, module.course_slug.as_str(), "course")?;
        let (id, outcome) = store.upsert_module(course_id, module, mode).await?;
        report.record("course_modules", outcome);
        module_ids.insert(
            (module.course_slug.as_str(), module.module.slug.as_str()),
            id,
        );
    }

    let mut quiz_ids = HashMap::new();
    for quiz in &bundle.quizzes {
        let (id, outcome) = store.upsert_quiz(quiz, mode).await?;
        report.record("quizzes", outcome);
        quiz_ids.insert(quiz.title.as_str(), id);
    }

    for link in &bundle.module_items {
        let module_id = lookup(
            &module_ids,
            (link.course_slug.as_str(), link.module_slug.as_str()),
            "course module",
        )?;
        let quiz_id = lookup(&quiz_ids, link.quiz_title.as_str(), "quiz")?;
        let (_, outcome) = store
            .link_module_item(module_id, quiz_id, &link.item, mode)
            .await?;
        report.record("module_items", outcome);
    }

    let mut lesson_ids = HashMap::new();
    for lesson in &bundle.micro_lessons {
        let module_id = lookup(
            &module_ids,
            (lesson.course_slug.as_str(), lesson.module_slug.as_str()),
            "course module",
        )?;
        let (id, outcome) = store.upsert_micro_lesson(module_id, lesson, mode).await?;
        report.record("micro_lessons", outcome);
        lesson_ids.insert(lesson.slug.as_str(), id);
    }

    for exercise in &bundle.exercises {
        let lesson_id = lookup(&lesson_ids, exercise.lesson_slug.as_str(), "micro lesson")?;
        let (_, outcome) = store.upsert_exercise(lesson_id, exercise, mode).await?;
        report.record("exercises", outcome);
    }

    for record in &bundle.questions {
        let quiz_id = lookup(&quiz_ids, record.quiz_title.as_str(), "quiz")?;
        let (_, outcome) = store
            .upsert_question(quiz_id, &record.question, mode)
            .await?;
        report.record("quiz_questions", outcome);
    }

    let totals = report.totals();
    info!(
        event = "seed_completed",
        backend = store.backend(),
        created = totals.created,
        updated = totals.updated,
        unchanged = totals.unchanged,
        duration_ms = start.elapsed().as_millis() as u64,
        "bundle seeded"
    );

    Ok(report)
}

fn lookup<K>(ids: &HashMap<K, i64>, key: K, kind: &'static str) -> Result<i64>
where
    K: std::hash::Hash + Eq + std::fmt::Debug,
{
    ids.get(&key)
        .copied()
        .ok_or_else(|| StoreError::MissingParent {
            kind,
            key: format!("{key:?}"),
        })
}
