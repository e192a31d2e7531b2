use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lessonforge_core::{Course, ExerciseData, Quiz};

use crate::bundle::{
    ContentBundle, ExerciseRecord, LessonRecord, ModuleItemRecord, ModuleRecord, QuestionRecord,
};

/// A bundle record that can be flattened into one CSV row.
pub trait CsvRow {
    fn header() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

/// Write every record kind of the bundle as `<table>.csv` into `dir`.
///
/// Returns the total number of bytes written.
pub fn write_bundle_csvs(dir: &Path, bundle: &ContentBundle) -> Result<u64, csv::Error> {
    let mut bytes = 0;
    bytes += write_rows(&dir.join("courses.csv"), &bundle.courses)?;
    bytes += write_rows(&dir.join("course_modules.csv"), &bundle.modules)?;
    bytes += write_rows(&dir.join("quizzes.csv"), &bundle.quizzes)?;
    bytes += write_rows(&dir.join("module_items.csv"), &bundle.module_items)?;
    bytes += write_rows(&dir.join("micro_lessons.csv"), &bundle.micro_lessons)?;
    bytes += write_rows(&dir.join("exercises.csv"), &bundle.exercises)?;
    bytes += write_rows(&dir.join("quiz_questions.csv"), &bundle.questions)?;
    Ok(bytes)
}

/// Write rows as CSV with a fixed header.
pub fn write_rows<T: CsvRow>(path: &Path, rows: &[T]) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(T::header())?;
    for row in rows {
        writer.write_record(row.row())?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

impl CsvRow for Course {
    fn header() -> &'static [&'static str] {
        &[
            "slug",
            "title",
            "description",
            "difficulty_level",
            "certification_track",
            "estimated_hours",
            "published",
            "sequence_order",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.slug.clone(),
            self.title.clone(),
            opt(&self.description),
            self.difficulty_level
                .map(|level| level.as_str().to_string())
                .unwrap_or_default(),
            opt(&self.certification_track),
            opt(&self.estimated_hours),
            self.published.to_string(),
            self.sequence_order.to_string(),
        ]
    }
}

impl CsvRow for ModuleRecord {
    fn header() -> &'static [&'static str] {
        &[
            "course_slug",
            "slug",
            "title",
            "sequence_order",
            "estimated_minutes",
            "published",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.course_slug.clone(),
            self.module.slug.clone(),
            self.module.title.clone(),
            self.sequence_order().to_string(),
            opt(&self.module.estimated_minutes),
            self.module.published.to_string(),
        ]
    }
}

impl CsvRow for Quiz {
    fn header() -> &'static [&'static str] {
        &[
            "title",
            "time_limit_minutes",
            "passing_score",
            "max_attempts",
            "shuffle_questions",
            "show_correct_answers",
            "quiz_type",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            opt(&self.time_limit_minutes),
            self.passing_score.to_string(),
            opt(&self.max_attempts),
            self.shuffle_questions.to_string(),
            self.show_correct_answers.to_string(),
            opt(&self.quiz_type),
        ]
    }
}

impl CsvRow for ModuleItemRecord {
    fn header() -> &'static [&'static str] {
        &[
            "course_slug",
            "module_slug",
            "item_type",
            "quiz_title",
            "sequence_order",
            "required",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.course_slug.clone(),
            self.module_slug.clone(),
            self.item.item_kind.as_str().to_string(),
            self.quiz_title.clone(),
            self.item.sequence_order.to_string(),
            self.item.required.to_string(),
        ]
    }
}

impl CsvRow for LessonRecord {
    fn header() -> &'static [&'static str] {
        &[
            "course_slug",
            "module_slug",
            "slug",
            "title",
            "sequence_order",
            "estimated_minutes",
            "difficulty",
            "key_concepts",
            "prerequisite_slugs",
            "published",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.course_slug.clone(),
            self.module_slug.clone(),
            self.slug.clone(),
            self.title.clone(),
            self.sequence_order.to_string(),
            self.estimated_minutes.to_string(),
            self.difficulty.as_str().to_string(),
            self.key_concepts.join("|"),
            self.prerequisite_slugs.join("|"),
            self.published.to_string(),
        ]
    }
}

impl CsvRow for ExerciseRecord {
    fn header() -> &'static [&'static str] {
        &["lesson_slug", "sequence_order", "exercise_type", "require_pass", "content"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.lesson_slug.clone(),
            self.sequence_order.to_string(),
            self.data.kind().to_string(),
            require_pass(&self.data).to_string(),
            serde_json::to_string(&self.data).unwrap_or_default(),
        ]
    }
}

impl CsvRow for QuestionRecord {
    fn header() -> &'static [&'static str] {
        &[
            "quiz_title",
            "question_text",
            "question_type",
            "correct_answer",
            "points",
            "difficulty",
            "discrimination",
            "guessing",
            "difficulty_level",
            "topic",
            "sequence_order",
            "options",
        ]
    }

    fn row(&self) -> Vec<String> {
        let question = &self.question;
        vec![
            self.quiz_title.clone(),
            question.question_text.clone(),
            question.question_type.as_str().to_string(),
            question.formatted_correct_answer().unwrap_or_default(),
            question.points.to_string(),
            format!("{:.2}", question.difficulty),
            format!("{:.2}", question.discrimination),
            format!("{:.2}", question.guessing),
            question
                .difficulty_level
                .map(|level| level.as_str().to_string())
                .unwrap_or_default(),
            opt(&question.topic),
            opt(&question.sequence_order),
            if question.options.is_empty() {
                String::new()
            } else {
                serde_json::to_string(&question.options).unwrap_or_default()
            },
        ]
    }
}

fn require_pass(data: &ExerciseData) -> bool {
    match data {
        ExerciseData::Mcq { require_pass, .. }
        | ExerciseData::ShortAnswer { require_pass, .. }
        | ExerciseData::Terminal { require_pass, .. }
        | ExerciseData::Sandbox { require_pass, .. }
        | ExerciseData::Code { require_pass, .. } => *require_pass,
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
