// src/validate.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::RawRow;

/// A row that does not meet the record schema. Local to the offending row;
/// never fatal for the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaValidationError {
    #[error("missing name")]
    MissingName,
}

/// One normalized sanctioned-entity entry, as it appears in the output
/// artifact. `name` is always non-empty; the other three fields default to
/// `""` when the source column is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub schema: String,
    pub sanctions: String,
    pub aliases: String,
}

/// Convert a raw row into a `Record`. Pure; the only rejection is a missing
/// or empty `name`.
///
/// Field trimming happens once, in the decoder. `name` is re-trimmed here so
/// the non-empty invariant holds even for callers that bypass the decoder's
/// blank-name filter.
pub fn validate(row: &RawRow) -> Result<Record, SchemaValidationError> {
    let name = row.get("name").map(|s| s.trim()).unwrap_or("");
    if name.is_empty() {
        return Err(SchemaValidationError::MissingName);
    }

    let field = |key: &str| row.get(key).cloned().unwrap_or_default();
    Ok(Record {
        name: name.to_string(),
        schema: field("schema"),
        sanctions: field("sanctions"),
        aliases: field("aliases"),
    })
}
