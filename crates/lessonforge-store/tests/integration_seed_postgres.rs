use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lessonforge_generate::{ContentBundle, build_bundle};
use lessonforge_plan::load_plan;
use lessonforge_store::{PostgresStore, SeedMode, connect, migrations, seed_bundle};
use sqlx::PgPool;

const TABLES: &[&str] = &[
    "quiz_questions",
    "exercises",
    "micro_lessons",
    "module_items",
    "quizzes",
    "course_modules",
    "courses",
    "schema_migrations",
];

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

fn continuity_bundle() -> Result<ContentBundle> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../packs/calculus-continuity.plan.json");
    let plan = load_plan(&path).context("loading continuity pack")?;
    build_bundle(&plan).context("building bundle")
}

async fn reset(pool: &PgPool) -> Result<()> {
    for table in TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table} CASCADE"))
            .execute(pool)
            .await
            .with_context(|| format!("dropping {table}"))?;
    }
    Ok(())
}

#[tokio::test]
async fn seeds_continuity_pack_idempotently() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL to run");
        return Ok(());
    };
    let pool = connect(&db_url).await.context("connecting to Postgres")?;
    reset(&pool).await?;

    assert_eq!(migrations::run(&pool).await?, 1);
    assert_eq!(migrations::run(&pool).await?, 0);

    let mut bundle = continuity_bundle()?;

    let mut store = PostgresStore::begin(&pool).await?;
    let first = seed_bundle(&mut store, &bundle, SeedMode::CreateMissing).await?;
    store.commit().await?;
    assert_eq!(first.counts("quiz_questions").created, 14);
    assert_eq!(first.totals().created, 22);

    let mut store = PostgresStore::begin(&pool).await?;
    let again = seed_bundle(&mut store, &bundle, SeedMode::Update).await?;
    store.commit().await?;
    assert!(again.is_noop(), "reseed changed rows: {again}");

    let (difficulty, kind, options): (f64, String, serde_json::Value) = sqlx::query_as(
        "SELECT difficulty, question_type, question_data -> 'options' FROM quiz_questions \
         WHERE question_text = $1",
    )
    .bind("Continuity problem #80: Determine if function is continuous at a point")
    .fetch_one(&pool)
    .await?;
    assert_eq!(difficulty, 0.86);
    assert_eq!(kind, "mcq");
    assert_eq!(options[0]["text"], "Continuous");
    assert_eq!(options[0]["correct"], true);

    bundle.questions[2].question.points = 5;
    let mut store = PostgresStore::begin(&pool).await?;
    let updated = seed_bundle(&mut store, &bundle, SeedMode::Update).await?;
    store.rollback().await?;
    assert_eq!(updated.counts("quiz_questions").updated, 1);

    let points: i32 = sqlx::query_scalar(
        "SELECT points FROM quiz_questions WHERE question_text = $1",
    )
    .bind(&bundle.questions[2].question.question_text)
    .fetch_one(&pool)
    .await?;
    assert_eq!(points, 3, "rolled back update must not be visible");

    Ok(())
}
