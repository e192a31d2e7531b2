use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::errors::Result;
use crate::model::SeedPlan;

/// Emit the JSON Schema for seed plan documents.
pub fn plan_json_schema() -> RootSchema {
    schema_for!(SeedPlan)
}

/// The plan JSON Schema as a `serde_json::Value`, ready for validation.
pub fn plan_json_schema_value() -> Result<Value> {
    Ok(serde_json::to_value(plan_json_schema())?)
}
