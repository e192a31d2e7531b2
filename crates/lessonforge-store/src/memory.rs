use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::{Outcome, SeedMode};
use crate::row::{RowSpec, SqlValue};
use crate::store::ContentStore;

#[derive(Debug, Clone)]
struct StoredRow {
    id: i64,
    keys: Vec<(&'static str, SqlValue)>,
    columns: Vec<(&'static str, SqlValue)>,
}

/// In-process store with the same natural-key semantics as Postgres.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: HashMap<&'static str, Vec<StoredRow>>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> usize {
        self.tables.get(table).map(Vec::len).unwrap_or(0)
    }

    /// Column value of the row with `id` in `table`.
    pub fn column(&self, table: &str, id: i64, column: &str) -> Option<&SqlValue> {
        self.tables
            .get(table)?
            .iter()
            .find(|row| row.id == id)?
            .columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn apply_row(&mut self, row: RowSpec, mode: SeedMode) -> Result<(i64, Outcome)> {
        let rows = self.tables.entry(row.table).or_default();

        if let Some(existing) = rows.iter_mut().find(|stored| stored.keys == row.keys) {
            if mode == SeedMode::CreateMissing || existing.columns == row.columns {
                return Ok((existing.id, Outcome::Unchanged));
            }
            existing.columns = row.columns;
            return Ok((existing.id, Outcome::Updated));
        }

        self.next_id += 1;
        let id = self.next_id;
        rows.push(StoredRow {
            id,
            keys: row.keys,
            columns: row.columns,
        });
        Ok((id, Outcome::Created))
    }
}
