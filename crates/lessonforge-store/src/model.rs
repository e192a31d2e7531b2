use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How existing rows are treated when a natural key already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Find-or-create: existing rows are left untouched.
    #[default]
    CreateMissing,
    /// Existing rows are overwritten with the bundle's values.
    Update,
}

impl SeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedMode::CreateMissing => "create_missing",
            SeedMode::Update => "update",
        }
    }
}

impl FromStr for SeedMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "create_missing" => Ok(SeedMode::CreateMissing),
            "update" => Ok(SeedMode::Update),
            other => Err(format!("unknown seed mode '{other}'")),
        }
    }
}

impl fmt::Display for SeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Created/updated/unchanged counts for one record kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.unchanged
    }
}

/// Result of applying a bundle to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub backend: String,
    pub mode: SeedMode,
    pub kinds: BTreeMap<String, OutcomeCounts>,
}

impl SeedReport {
    pub fn new(backend: &str, mode: SeedMode) -> Self {
        Self {
            backend: backend.to_string(),
            mode,
            kinds: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, kind: &str, outcome: Outcome) {
        let counts = self.kinds.entry(kind.to_string()).or_default();
        match outcome {
            Outcome::Created => counts.created += 1,
            Outcome::Updated => counts.updated += 1,
            Outcome::Unchanged => counts.unchanged += 1,
        }
    }

    pub fn counts(&self, kind: &str) -> OutcomeCounts {
        self.kinds.get(kind).copied().unwrap_or_default()
    }

    pub fn totals(&self) -> OutcomeCounts {
        self.kinds
            .values()
            .fold(OutcomeCounts::default(), |acc, counts| OutcomeCounts {
                created: acc.created + counts.created,
                updated: acc.updated + counts.updated,
                unchanged: acc.unchanged + counts.unchanged,
            })
    }

    /// True when nothing was created or updated.
    pub fn is_noop(&self) -> bool {
        let totals = self.totals();
        totals.created == 0 && totals.updated == 0
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "seed report ({}, mode {})", self.backend, self.mode)?;
        for (kind, counts) in &self.kinds {
            writeln!(
                f,
                "  {kind:<16} created {:>4}  updated {:>4}  unchanged {:>4}",
                counts.created, counts.updated, counts.unchanged
            )?;
        }
        let totals = self.totals();
        write!(
            f,
            "  {:<16} created {:>4}  updated {:>4}  unchanged {:>4}",
            "total", totals.created, totals.updated, totals.unchanged
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_mode_parses_cli_spellings() {
        assert_eq!("create-missing".parse::<SeedMode>(), Ok(SeedMode::CreateMissing));
        assert_eq!("UPDATE".parse::<SeedMode>(), Ok(SeedMode::Update));
        assert!("upsert".parse::<SeedMode>().is_err());
    }

    #[test]
    fn report_totals_and_noop() {
        let mut report = SeedReport::new("memory", SeedMode::Update);
        report.record("courses", Outcome::Unchanged);
        report.record("quiz_questions", Outcome::Unchanged);
        assert!(report.is_noop());

        report.record("quiz_questions", Outcome::Updated);
        assert!(!report.is_noop());
        assert_eq!(report.counts("quiz_questions").total(), 2);
        assert_eq!(report.totals().unchanged, 2);
    }
}
