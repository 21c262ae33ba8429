//! JSON output for machine consumers.

use serde::Serialize;

use crate::error::Result;

/// Render any serializable value as one JSON document.
///
/// `pretty` indents with two spaces; object keys are emitted in sorted order
/// either way.
pub fn render_json<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    let value = serde_json::to_value(output)?;
    if pretty {
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(serde_json::to_string(&value)?)
    }
}
