mod config;
mod redact;
mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lessonforge_core::{Answer, CONTENT_VERSION};
use lessonforge_generate::{
    GenerateOptions, GenerationEngine, GenerationError, build_bundle, summarize,
};
use lessonforge_plan::{
    PlanError, ValidatedPlan, ValidationIssue, load_plan_value, plan_json_schema_value,
    validate_plan,
};
use lessonforge_store::{
    MemoryStore, PostgresStore, SeedMode, StoreError, connect, migrations, seed_bundle,
};
use thiserror::Error;
use uuid::Uuid;

use config::{ConfigError, LessonforgeConfig, load_config, resolve_database_url};
use redact::redact_connection_string;
use registry::{RunContext, RunOptions, init_logging, start_run, write_report};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("plan is invalid: {errors} error(s)")]
    InvalidPlan { errors: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Parser, Debug)]
#[command(name = "lessonforge", version, about = "Lessonforge content seeding CLI")]
struct Cli {
    /// Config file (defaults to ./lessonforge.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Tracing filter for stderr output, e.g. `info` or `lessonforge_store=debug`.
    #[arg(long, global = true, value_name = "FILTER")]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check seed packs against the plan schema and semantic rules.
    Validate(PackArgs),
    /// Print the seed plan JSON Schema.
    Schema(SchemaArgs),
    /// Expand a seed pack into bundle, CSV and report artifacts.
    Generate(GenerateArgs),
    /// Print per-course content counts for a seed pack.
    Summary(SummaryArgs),
    /// Apply a seed pack to a database.
    Seed(SeedArgs),
    /// Check an answer against a question of a seed pack.
    Grade(GradeArgs),
}

#[derive(Args, Debug)]
struct PackArgs {
    /// Seed pack (.json or .toml), or a directory of `*.plan.json` / `*.plan.toml` packs.
    pack: PathBuf,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    pack: PathBuf,
    /// Output directory for runs (overrides the config file).
    #[arg(long, visible_alias = "run-dir")]
    out: Option<PathBuf>,
    /// Skip the per-table CSV files.
    #[arg(long, default_value_t = false)]
    no_csv: bool,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    pack: PathBuf,
    /// Print the summary as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct SeedArgs {
    pack: PathBuf,
    /// Database connection string.
    #[arg(long, value_name = "CONNECTION_STRING", env = "LESSONFORGE_DATABASE_URL")]
    conn: Option<String>,
    /// What to do with rows that already exist.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Seed an in-memory store instead of the database.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Output directory for runs (overrides the config file).
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GradeArgs {
    pack: PathBuf,
    /// Title of the quiz holding the question.
    #[arg(long)]
    quiz: String,
    /// Exact question text.
    #[arg(long)]
    question: String,
    /// Answer value; repeat for multi-select and ordering questions.
    #[arg(long = "answer", required = true)]
    answers: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    CreateMissing,
    Update,
}

impl From<ModeArg> for SeedMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::CreateMissing => SeedMode::CreateMissing,
            ModeArg::Update => SeedMode::Update,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let filter = cli
        .log_filter
        .clone()
        .unwrap_or_else(|| config.log_filter().to_string());

    match cli.command {
        Command::Validate(args) => {
            init_logging(&filter, None)?;
            run_validate(args)
        }
        Command::Schema(args) => {
            init_logging(&filter, None)?;
            run_schema(args)
        }
        Command::Generate(args) => run_generate(args, &config, &filter),
        Command::Summary(args) => {
            init_logging(&filter, None)?;
            run_summary(args)
        }
        Command::Seed(args) => run_seed(args, &config, &filter).await,
        Command::Grade(args) => {
            init_logging(&filter, None)?;
            run_grade(args)
        }
    }
}

fn run_validate(args: PackArgs) -> Result<(), CliError> {
    if !args.pack.is_dir() {
        return validate_pack(&args.pack);
    }

    let packs = pack_files(&args.pack)?;
    if packs.is_empty() {
        return Err(CliError::NotFound(format!(
            "no *.plan.json or *.plan.toml packs in {}",
            args.pack.display()
        )));
    }

    let mut errors = 0;
    let mut failed = 0;
    for pack in &packs {
        match validate_pack(pack) {
            Ok(()) => {}
            Err(CliError::InvalidPlan { errors: count }) => {
                println!("{}: invalid ({count} error(s))", pack.display());
                errors += count;
                failed += 1;
            }
            Err(err) => {
                eprintln!("error: {}: {err}", pack.display());
                errors += 1;
                failed += 1;
            }
        }
    }
    tracing::info!(
        event = "directory_validated",
        packs = packs.len(),
        failed,
        errors
    );

    if errors > 0 {
        return Err(CliError::InvalidPlan { errors });
    }
    Ok(())
}

fn validate_pack(pack: &Path) -> Result<(), CliError> {
    let validated = load_validated(pack)?;
    for issue in &validated.warnings {
        eprintln!("{}", format_issue("warning", issue));
    }
    println!(
        "{}: ok ({} course(s), {} warning(s))",
        pack.display(),
        validated.plan.courses.len(),
        validated.warnings.len()
    );
    Ok(())
}

/// Seed packs directly inside `dir`, sorted by path.
fn pack_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut packs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pack = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".plan.json") || name.ends_with(".plan.toml"));
        if is_pack && path.is_file() {
            packs.push(path);
        }
    }
    packs.sort();
    Ok(packs)
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = serde_json::to_string_pretty(&plan_json_schema_value()?)?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, schema)?;
            tracing::info!(event = "schema_written", path = %path.display());
        }
        None => println!("{schema}"),
    }
    Ok(())
}

fn run_generate(
    args: GenerateArgs,
    config: &LessonforgeConfig,
    filter: &str,
) -> Result<(), CliError> {
    let validated = load_validated(&args.pack)?;
    let run_dir = args.out.unwrap_or_else(|| config.run_dir());
    let write_csv = !args.no_csv;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: "generate",
        content_version: CONTENT_VERSION.to_string(),
        pack: args.pack.clone(),
        run_dir: run_dir.clone(),
        options: RunOptions {
            mode: None,
            dry_run: false,
            write_csv,
        },
        connection: None,
    };
    let run_paths = start_run(&run_ctx)?;
    init_logging(filter, Some(&run_paths.logs_path))?;

    tracing::info!(event = "run_started", run_id = %run_id, command = "generate");
    let timer = Instant::now();

    let engine = GenerationEngine::new(GenerateOptions {
        out_dir: run_dir,
        write_csv,
    });
    let result = engine.run_in_dir(&validated.plan, run_paths.root.clone(), run_id)?;

    println!("{}", summarize(&result.bundle));
    println!("Artifacts: {}", result.run_dir.display());

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<(), CliError> {
    let validated = load_validated(&args.pack)?;
    let bundle = build_bundle(&validated.plan)?;
    let summary = summarize(&bundle);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

async fn run_seed(
    args: SeedArgs,
    config: &LessonforgeConfig,
    filter: &str,
) -> Result<(), CliError> {
    let SeedArgs {
        pack,
        conn,
        mode,
        dry_run,
        run_dir,
    } = args;

    let mode = mode
        .map(SeedMode::from)
        .or(config.default_mode)
        .unwrap_or_default();

    let conn = if dry_run {
        None
    } else {
        let conn = resolve_database_url(conn, config).ok_or_else(|| {
            CliError::InvalidConfig(
                "connection string is required (use --conn, database_url or DATABASE_URL)"
                    .to_string(),
            )
        })?;
        detect_engine(&conn)?;
        Some(conn)
    };

    let validated = load_validated(&pack)?;
    let bundle = build_bundle(&validated.plan)?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: "seed",
        content_version: bundle.content_version.clone(),
        pack,
        run_dir: run_dir.unwrap_or_else(|| config.run_dir()),
        options: RunOptions {
            mode: Some(mode),
            dry_run,
            write_csv: false,
        },
        connection: conn.as_deref().map(redact_connection_string),
    };
    let run_paths = start_run(&run_ctx)?;
    init_logging(filter, Some(&run_paths.logs_path))?;

    tracing::info!(event = "run_started", run_id = %run_id, command = "seed", mode = %mode);
    let timer = Instant::now();

    let report = match conn {
        None => {
            let mut store = MemoryStore::new();
            seed_bundle(&mut store, &bundle, mode).await?
        }
        Some(conn) => {
            if let Some(connection) = &run_ctx.connection {
                tracing::info!(event = "engine_detected", engine = "postgres", conn = %connection.redacted);
            }
            let pool = connect(&conn).await?;
            let applied = migrations::run(&pool).await?;
            tracing::info!(event = "migrations_checked", applied);

            let mut store = PostgresStore::begin(&pool).await?;
            let report = seed_bundle(&mut store, &bundle, mode).await?;
            store.commit().await?;
            report
        }
    };

    let report_path = write_report(&run_paths, "seed_report.json", &report)?;
    tracing::info!(event = "report_written", path = %report_path.display());

    println!("{report}");

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_grade(args: GradeArgs) -> Result<(), CliError> {
    let validated = load_validated(&args.pack)?;
    let bundle = build_bundle(&validated.plan)?;
    let question = bundle
        .find_question(&args.quiz, &args.question)
        .ok_or_else(|| {
            CliError::NotFound(format!(
                "question '{}' in quiz '{}'",
                args.question, args.quiz
            ))
        })?;

    let answer = match args.answers.as_slice() {
        [single] => Answer::text(single.clone()),
        many => Answer::List(many.to_vec()),
    };

    let verdict = if question.is_correct(&answer) {
        "correct"
    } else {
        "incorrect"
    };
    match question.formatted_correct_answer() {
        Some(expected) => println!("{verdict} (expected: {expected})"),
        None => println!("{verdict}"),
    }
    Ok(())
}

/// Load a pack and run schema plus semantic validation, printing every error.
fn load_validated(pack: &Path) -> Result<ValidatedPlan, CliError> {
    let plan_json = load_plan_value(pack)?;
    let schema = plan_json_schema_value()?;
    validate_plan(&plan_json, &schema).map_err(|report| {
        for issue in &report.errors {
            eprintln!("{}", format_issue("error", issue));
        }
        for issue in &report.warnings {
            eprintln!("{}", format_issue("warning", issue));
        }
        tracing::info!(
            event = "plan_rejected",
            errors = report.errors.len(),
            warnings = report.warnings.len()
        );
        CliError::InvalidPlan {
            errors: report.errors.len(),
        }
    })
}

fn format_issue(level: &str, issue: &ValidationIssue) -> String {
    let mut line = format!("{level}[{}] {}: {}", issue.code, issue.path, issue.message);
    if let Some(hint) = &issue.hint {
        line.push_str(&format!(" (hint: {hint})"));
    }
    line
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(
            redact_connection_string(conn).redacted,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packs_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../packs")
    }

    #[test]
    fn pack_directory_lists_plan_files_in_order() {
        let names: Vec<String> = pack_files(&packs_dir())
            .expect("list packs")
            .iter()
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(
            names,
            ["calculus-continuity.plan.json", "docker-basics.plan.toml"]
        );
    }

    #[test]
    fn validate_accepts_a_pack_directory() {
        let result = run_validate(PackArgs { pack: packs_dir() });
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn validate_directory_aggregates_invalid_packs() {
        let dir = std::env::temp_dir().join(format!("lessonforge-validate-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create dir");

        let err = run_validate(PackArgs { pack: dir.clone() }).expect_err("empty directory");
        assert!(matches!(err, CliError::NotFound(_)));

        std::fs::copy(
            packs_dir().join("calculus-continuity.plan.json"),
            dir.join("good.plan.json"),
        )
        .expect("copy pack");
        std::fs::write(dir.join("empty.plan.json"), r#"{"plan_version": "0.1", "courses": []}"#)
            .expect("write pack");
        std::fs::write(dir.join("notes.json"), "not a pack").expect("write notes");

        let err = run_validate(PackArgs { pack: dir.clone() }).expect_err("one invalid pack");
        assert!(matches!(err, CliError::InvalidPlan { errors } if errors >= 1));

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn detects_postgres_urls_only() {
        assert_eq!(detect_engine("postgres://localhost/lms").ok(), Some("postgres"));
        assert_eq!(detect_engine("postgresql://localhost/lms").ok(), Some("postgres"));
        assert!(matches!(
            detect_engine("mysql://root:pw@localhost/lms"),
            Err(CliError::UnsupportedEngine(conn)) if !conn.contains("pw")
        ));
    }

    #[test]
    fn mode_flag_parses_kebab_case() {
        let cli = Cli::try_parse_from([
            "lessonforge",
            "seed",
            "packs/calculus-continuity.plan.json",
            "--mode",
            "update",
            "--dry-run",
        ])
        .expect("parse args");
        let Command::Seed(args) = cli.command else {
            panic!("expected seed command");
        };
        assert!(args.dry_run);
        assert_eq!(args.mode.map(SeedMode::from), Some(SeedMode::Update));

        let cli = Cli::try_parse_from([
            "lessonforge",
            "seed",
            "pack.json",
            "--mode",
            "create-missing",
        ])
        .expect("parse args");
        let Command::Seed(args) = cli.command else {
            panic!("expected seed command");
        };
        assert_eq!(args.mode.map(SeedMode::from), Some(SeedMode::CreateMissing));
    }

    #[test]
    fn grade_requires_an_answer() {
        assert!(
            Cli::try_parse_from([
                "lessonforge",
                "grade",
                "pack.json",
                "--quiz",
                "Continuity",
                "--question",
                "q"
            ])
            .is_err()
        );
    }

    #[test]
    fn issue_lines_carry_code_and_path() {
        let issue = ValidationIssue::error(
            "series_range_inverted",
            "/courses/0/modules/0/quizzes/0/series/0/range",
            "start 80 is greater than end 68",
            None,
        );
        assert_eq!(
            format_issue("error", &issue),
            "error[series_range_inverted] /courses/0/modules/0/quizzes/0/series/0/range: start 80 is greater than end 68"
        );
    }
}
