use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::{Query, QueryScalar};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::errors::Result;
use crate::model::{Outcome, SeedMode};
use crate::row::{RowSpec, SqlValue};
use crate::store::ContentStore;

/// Open a small pool for a seeding run.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Store that writes every row inside one transaction.
///
/// Nothing is visible to other sessions until [`PostgresStore::commit`];
/// dropping the store rolls the run back.
pub struct PostgresStore {
    tx: Transaction<'static, Postgres>,
}

impl PostgresStore {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        let tx = pool.begin().await?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn apply_row(&mut self, row: RowSpec, mode: SeedMode) -> Result<(i64, Outcome)> {
        let select = select_sql(&row);
        let mut query = sqlx::query_scalar::<_, i64>(&select);
        for (_, value) in &row.keys {
            query = bind_scalar(query, value);
        }
        let existing = query.fetch_optional(&mut *self.tx).await?;

        let Some(id) = existing else {
            let insert = insert_sql(&row);
            let mut query = sqlx::query_scalar::<_, i64>(&insert);
            for (_, value) in row.keys.iter().chain(row.columns.iter()) {
                query = bind_scalar(query, value);
            }
            let id = query.fetch_one(&mut *self.tx).await?;
            debug!(table = row.table, key = %row.key_label(), id, "row created");
            return Ok((id, Outcome::Created));
        };

        if mode == SeedMode::CreateMissing {
            return Ok((id, Outcome::Unchanged));
        }

        let update = update_sql(&row);
        let mut query = sqlx::query(&update).bind(id);
        for (_, value) in &row.columns {
            query = bind(query, value);
        }
        let affected = query.execute(&mut *self.tx).await?.rows_affected();
        if affected == 0 {
            Ok((id, Outcome::Unchanged))
        } else {
            debug!(table = row.table, key = %row.key_label(), id, "row updated");
            Ok((id, Outcome::Updated))
        }
    }
}

fn select_sql(row: &RowSpec) -> String {
    let conditions = row
        .keys
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| format!("{name} = ${}", idx + 1))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!("SELECT id FROM {} WHERE {conditions}", row.table)
}

fn insert_sql(row: &RowSpec) -> String {
    let names: Vec<&str> = row
        .keys
        .iter()
        .chain(row.columns.iter())
        .map(|(name, _)| *name)
        .collect();
    let placeholders = (1..=names.len())
        .map(|idx| format!("${idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders}) RETURNING id",
        row.table,
        names.join(", ")
    )
}

/// `$1` is the row id; columns follow from `$2`. Rows whose values already
/// match are not touched, so `rows_affected` tells updated from unchanged.
fn update_sql(row: &RowSpec) -> String {
    let names: Vec<&str> = row.columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (0..names.len()).map(|idx| format!("${}", idx + 2)).collect();
    let assignments = names
        .iter()
        .zip(&placeholders)
        .map(|(name, placeholder)| format!("{name} = {placeholder}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {table} SET {assignments}, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND ({columns}) IS DISTINCT FROM ({values})",
        table = row.table,
        columns = names.join(", "),
        values = placeholders.join(", ")
    )
}

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Text(text) => query.bind(text.clone()),
        SqlValue::Int(number) => query.bind(*number),
        SqlValue::Id(id) => query.bind(*id),
        SqlValue::Float(number) => query.bind(*number),
        SqlValue::Bool(flag) => query.bind(*flag),
        SqlValue::Json(json) => query.bind(json.clone()),
    }
}

fn bind_scalar<'q>(
    query: QueryScalar<'q, Postgres, i64, PgArguments>,
    value: &SqlValue,
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    match value {
        SqlValue::Text(text) => query.bind(text.clone()),
        SqlValue::Int(number) => query.bind(*number),
        SqlValue::Id(id) => query.bind(*id),
        SqlValue::Float(number) => query.bind(*number),
        SqlValue::Bool(flag) => query.bind(*flag),
        SqlValue::Json(json) => query.bind(json.clone()),
    }
}
