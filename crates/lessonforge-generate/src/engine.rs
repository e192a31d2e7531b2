use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use lessonforge_core::{CONTENT_VERSION, CourseModule, ModuleItem, ModuleItemKind, slugify};
use lessonforge_plan::{ModulePlan, QuizPlan, SeedPlan};

use crate::bundle::{
    ContentBundle, ExerciseRecord, LessonRecord, ModuleItemRecord, ModuleRecord, QuestionRecord,
    QuestionSource,
};
use crate::errors::{GenerationError, Result};
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport};
use crate::output::csv::write_bundle_csvs;
use crate::series::expand_series;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub run_dir: PathBuf,
    pub bundle: ContentBundle,
    pub report: GenerationReport,
}

/// Entry point for expanding seed plans into bundles and run artifacts.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn build_bundle(&self, plan: &SeedPlan) -> Result<ContentBundle> {
        build_bundle(plan)
    }

    /// Expand the plan and write `bundle.json`, CSVs and `generation_report.json`
    /// into a fresh run directory.
    pub fn run(&self, plan: &SeedPlan) -> Result<GenerationResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
        let run_dir = self
            .options
            .out_dir
            .join(format!("{timestamp}__run_{run_id}"));
        self.run_in_dir(plan, run_dir, run_id)
    }

    /// Like [`GenerationEngine::run`], but into a directory chosen by the caller.
    pub fn run_in_dir(
        &self,
        plan: &SeedPlan,
        run_dir: PathBuf,
        run_id: String,
    ) -> Result<GenerationResult> {
        let start = Instant::now();
        std::fs::create_dir_all(&run_dir)?;

        info!(
            event = "generation_started",
            run_id = %run_id,
            courses = plan.courses.len(),
            seed = plan.seed,
            "generation started"
        );

        let mut report = GenerationReport::new(run_id.clone());
        report.seed = plan.seed;

        let mut issues = Vec::new();
        let bundle = match flatten_plan(plan, &mut issues) {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!(event = "generation_failed", run_id = %run_id, error = %err, "generation failed");
                return Err(err);
            }
        };
        for issue in issues {
            log_issue(&issue);
            report.record_warning(issue);
        }

        for (kind, count) in bundle.record_counts() {
            report.record_count(kind, count as u64);
        }
        for record in &bundle.questions {
            report.record_question_type(record.question_type().as_str());
            if record.is_generated() {
                report.generated_questions += 1;
            }
        }
        report.series_expanded = plan
            .courses
            .iter()
            .flat_map(|course| &course.modules)
            .flat_map(|module| &module.quizzes)
            .map(|quiz| quiz.series.len() as u64)
            .sum();

        let bundle_bytes = serde_json::to_vec_pretty(&bundle)?;
        std::fs::write(run_dir.join("bundle.json"), &bundle_bytes)?;
        let mut bytes_written = bundle_bytes.len() as u64;

        if self.options.write_csv {
            bytes_written += write_bundle_csvs(&run_dir, &bundle)?;
        }

        report.bytes_written = bytes_written;
        report.duration_ms = start.elapsed().as_millis() as u64;
        std::fs::write(
            run_dir.join("generation_report.json"),
            serde_json::to_vec_pretty(&report)?,
        )?;

        info!(
            event = "generation_completed",
            run_id = %run_id,
            questions = bundle.questions.len(),
            generated_questions = report.generated_questions,
            bytes_written = report.bytes_written,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            run_dir,
            bundle,
            report,
        })
    }
}

/// Flatten a plan into a bundle, expanding series and filling in derived keys.
pub fn build_bundle(plan: &SeedPlan) -> Result<ContentBundle> {
    let mut issues = Vec::new();
    flatten_plan(plan, &mut issues)
}

fn flatten_plan(plan: &SeedPlan, issues: &mut Vec<GenerationIssue>) -> Result<ContentBundle> {
    let mut bundle = ContentBundle {
        content_version: CONTENT_VERSION.to_string(),
        seed: plan.seed,
        ..ContentBundle::default()
    };
    let mut lesson_slugs = HashSet::new();
    let mut quiz_titles = HashSet::new();

    for (course_idx, course_plan) in plan.courses.iter().enumerate() {
        let course_slug = course_plan.course.slug.clone();
        bundle.courses.push(course_plan.course.clone());

        for (module_idx, module_plan) in course_plan.modules.iter().enumerate() {
            let path = format!("/courses/{course_idx}/modules/{module_idx}");
            let module = CourseModule {
                sequence_order: Some(order_or_position(
                    module_plan.module.sequence_order,
                    module_idx,
                )),
                ..module_plan.module.clone()
            };
            let module_slug = module.slug.clone();
            bundle.modules.push(ModuleRecord {
                course_slug: course_slug.clone(),
                module,
            });

            push_lessons(
                &mut bundle,
                module_plan,
                &course_slug,
                &path,
                &mut lesson_slugs,
                issues,
            )?;

            for (quiz_idx, quiz_plan) in module_plan.quizzes.iter().enumerate() {
                if !quiz_titles.insert(quiz_plan.quiz.title.clone()) {
                    return Err(GenerationError::InvalidPlan(format!(
                        "quiz title '{}' is used more than once",
                        quiz_plan.quiz.title
                    )));
                }
                bundle.quizzes.push(quiz_plan.quiz.clone());
                bundle.module_items.push(ModuleItemRecord {
                    course_slug: course_slug.clone(),
                    module_slug: module_slug.clone(),
                    quiz_title: quiz_plan.quiz.title.clone(),
                    item: ModuleItem {
                        item_kind: ModuleItemKind::Quiz,
                        sequence_order: order_or_position(quiz_plan.item_order, quiz_idx),
                        required: quiz_plan.required,
                    },
                });
                push_questions(&mut bundle, quiz_plan, plan.seed)?;
            }
        }
    }

    Ok(bundle)
}

fn push_lessons(
    bundle: &mut ContentBundle,
    module_plan: &ModulePlan,
    course_slug: &str,
    module_path: &str,
    lesson_slugs: &mut HashSet<String>,
    issues: &mut Vec<GenerationIssue>,
) -> Result<()> {
    for (lesson_idx, lesson) in module_plan.micro_lessons.iter().enumerate() {
        let path = format!("{module_path}/micro_lessons/{lesson_idx}");
        let slug = match &lesson.slug {
            Some(slug) => slug.clone(),
            None => {
                let derived = slugify(&lesson.title);
                issues.push(GenerationIssue::warning(
                    "lesson_slug_derived",
                    &path,
                    format!("slug '{derived}' derived from title '{}'", lesson.title),
                ));
                derived
            }
        };
        if slug.is_empty() {
            return Err(GenerationError::InvalidPlan(format!(
                "lesson '{}' at {path} has no usable slug",
                lesson.title
            )));
        }
        if !lesson_slugs.insert(slug.clone()) {
            return Err(GenerationError::InvalidPlan(format!(
                "lesson slug '{slug}' is used more than once"
            )));
        }

        bundle.micro_lessons.push(LessonRecord {
            course_slug: course_slug.to_string(),
            module_slug: module_plan.module.slug.clone(),
            slug: slug.clone(),
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            sequence_order: order_or_position(lesson.sequence_order, lesson_idx),
            estimated_minutes: lesson.estimated_minutes,
            difficulty: lesson.difficulty,
            key_concepts: lesson.key_concepts.clone(),
            prerequisite_slugs: lesson.prerequisite_slugs.clone(),
            published: lesson.published,
        });

        let mut orders = HashSet::new();
        for (exercise_idx, exercise) in lesson.exercises.iter().enumerate() {
            let sequence_order = order_or_position(exercise.sequence_order, exercise_idx);
            if !orders.insert(sequence_order) {
                return Err(GenerationError::InvalidPlan(format!(
                    "lesson '{slug}' has two exercises at sequence_order {sequence_order}"
                )));
            }
            bundle.exercises.push(ExerciseRecord {
                lesson_slug: slug.clone(),
                sequence_order,
                data: exercise.data.clone(),
            });
        }
    }
    Ok(())
}

fn push_questions(bundle: &mut ContentBundle, quiz_plan: &QuizPlan, seed: u64) -> Result<()> {
    let title = &quiz_plan.quiz.title;
    let mut texts = HashSet::new();
    let mut records = Vec::new();

    for (question_idx, question) in quiz_plan.questions.iter().enumerate() {
        let mut question = question.clone();
        question.sequence_order = Some(order_or_position(question.sequence_order, question_idx));
        records.push(QuestionRecord {
            quiz_title: title.clone(),
            source: QuestionSource::Literal,
            question,
        });
    }

    for (series_idx, series) in quiz_plan.series.iter().enumerate() {
        let questions = expand_series(series, seed)?;
        for (index, question) in series.indices().zip(questions) {
            records.push(QuestionRecord {
                quiz_title: title.clone(),
                source: QuestionSource::Series {
                    series: series_idx,
                    index,
                },
                question,
            });
        }
    }

    for record in &records {
        if !texts.insert(record.question.question_text.clone()) {
            return Err(GenerationError::InvalidPlan(format!(
                "quiz '{title}' has duplicate question text '{}'",
                record.question.question_text
            )));
        }
    }

    bundle.questions.extend(records);
    Ok(())
}

/// Explicit order, or the 1-based list position.
fn order_or_position(order: Option<i32>, position: usize) -> i32 {
    order.unwrap_or_else(|| i32::try_from(position + 1).unwrap_or(i32::MAX))
}

fn log_issue(issue: &GenerationIssue) {
    info!(
        event = "generation_issue",
        code = %issue.code,
        path = issue.path.as_deref().unwrap_or(""),
        message = %issue.message,
        "generation issue"
    );
}
