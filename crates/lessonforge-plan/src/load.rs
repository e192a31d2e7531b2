use std::path::Path;

use serde_json::Value;

use crate::errors::{PlanError, Result};
use crate::model::SeedPlan;

/// Read a plan document as JSON, converting TOML documents on the way.
///
/// The format is chosen by file extension (`.json` or `.toml`).
pub fn load_plan_value(path: &Path) -> Result<Value> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        Some("toml") => Ok(toml::from_str::<Value>(&std::fs::read_to_string(path)?)?),
        other => Err(PlanError::UnsupportedFormat(format!(
            "{} (extension {:?})",
            path.display(),
            other.unwrap_or("")
        ))),
    }
}

/// Load and deserialize a plan without semantic validation.
pub fn load_plan(path: &Path) -> Result<SeedPlan> {
    let value = load_plan_value(path)?;
    Ok(serde_json::from_value(value)?)
}
