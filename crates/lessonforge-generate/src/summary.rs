use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::bundle::ContentBundle;

/// Per-course content counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub slug: String,
    pub title: String,
    pub modules: usize,
    pub micro_lessons: usize,
    pub exercises: usize,
    pub quizzes: usize,
    pub questions: usize,
    pub generated_questions: usize,
    pub estimated_minutes: u64,
    pub questions_by_type: BTreeMap<String, usize>,
    pub questions_by_level: BTreeMap<String, usize>,
    pub questions_by_topic: BTreeMap<String, usize>,
}

/// Counts for every course of a bundle, in bundle order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentSummary {
    pub courses: Vec<CourseSummary>,
}

impl ContentSummary {
    pub fn total_questions(&self) -> usize {
        self.courses.iter().map(|course| course.questions).sum()
    }

    pub fn course(&self, slug: &str) -> Option<&CourseSummary> {
        self.courses.iter().find(|course| course.slug == slug)
    }
}

/// Count the content of each course in the bundle.
pub fn summarize(bundle: &ContentBundle) -> ContentSummary {
    let mut courses = Vec::with_capacity(bundle.courses.len());

    for course in &bundle.courses {
        let mut summary = CourseSummary {
            slug: course.slug.clone(),
            title: course.title.clone(),
            ..CourseSummary::default()
        };

        summary.modules = bundle
            .modules
            .iter()
            .filter(|module| module.course_slug == course.slug)
            .count();

        for lesson in bundle
            .micro_lessons
            .iter()
            .filter(|lesson| lesson.course_slug == course.slug)
        {
            summary.micro_lessons += 1;
            summary.estimated_minutes += u64::from(lesson.estimated_minutes);
            summary.exercises += bundle
                .exercises
                .iter()
                .filter(|exercise| exercise.lesson_slug == lesson.slug)
                .count();
        }

        for item in bundle
            .module_items
            .iter()
            .filter(|item| item.course_slug == course.slug)
        {
            summary.quizzes += 1;
            for record in bundle.questions_for(&item.quiz_title) {
                let question = &record.question;
                summary.questions += 1;
                if record.is_generated() {
                    summary.generated_questions += 1;
                }
                *summary
                    .questions_by_type
                    .entry(question.question_type.as_str().to_string())
                    .or_insert(0) += 1;
                if let Some(level) = question.difficulty_level {
                    *summary
                        .questions_by_level
                        .entry(level.as_str().to_string())
                        .or_insert(0) += 1;
                }
                if let Some(topic) = &question.topic {
                    *summary.questions_by_topic.entry(topic.clone()).or_insert(0) += 1;
                }
            }
        }

        courses.push(summary);
    }

    ContentSummary { courses }
}

impl fmt::Display for ContentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for course in &self.courses {
            writeln!(f, "{} ({})", course.title.to_uppercase(), course.slug)?;
            writeln!(f, "{}", "=".repeat(60))?;
            writeln!(f, "Modules: {}", course.modules)?;
            writeln!(
                f,
                "Micro lessons: {} ({} min)",
                course.micro_lessons, course.estimated_minutes
            )?;
            writeln!(f, "Exercises: {}", course.exercises)?;
            writeln!(f, "Quizzes: {}", course.quizzes)?;
            writeln!(
                f,
                "Questions: {} ({} generated)",
                course.questions, course.generated_questions
            )?;
            write_breakdown(f, "Question types", &course.questions_by_type)?;
            write_breakdown(f, "Difficulty levels", &course.questions_by_level)?;
            write_breakdown(f, "Topics", &course.questions_by_topic)?;
            writeln!(f)?;
        }
        write!(f, "Total questions: {}", self.total_questions())
    }
}

fn write_breakdown(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    counts: &BTreeMap<String, usize>,
) -> fmt::Result {
    if counts.is_empty() {
        return Ok(());
    }
    writeln!(f, "{label}:")?;
    for (key, count) in counts {
        writeln!(f, "  - {key}: {count}")?;
    }
    Ok(())
}
