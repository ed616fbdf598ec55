//! read commands - Fetch objects by id or by field value

use anyhow::{Context as _, Result};
use serde_json::Value as Json;

use super::{client, print_entity, runtime, schema_for};
use crate::cli::Context;
use crate::core::codec;

/// Fetch one object and print it.
pub fn get(ctx: &Context, class: &str, id: &str) -> Result<()> {
    let client = client(ctx)?;
    let schema = schema_for(class);

    let entity = runtime()?
        .block_on(client.find(&schema, id))
        .with_context(|| format!("Failed to fetch {} '{}'", schema.class_name(), id))?;

    print_entity(&entity)
}

/// Print every object whose `field` equals `value`.
pub fn find(ctx: &Context, class: &str, field: &str, value: &str) -> Result<()> {
    let client = client(ctx)?;
    let schema = schema_for(class);
    let value = codec::decode(&parse_value(value));

    let entities = runtime()?
        .block_on(client.find_by(&schema, field, value))
        .with_context(|| format!("Failed to query {}", schema.class_name()))?;

    let results: Vec<Json> = entities
        .iter()
        .map(|e| Json::Object(e.attributes()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&results)?);

    if !ctx.quiet {
        eprintln!("{} result(s)", results.len());
    }
    Ok(())
}

/// JSON if it parses, else the raw text as a string.
fn parse_value(raw: &str) -> Json {
    serde_json::from_str(raw).unwrap_or_else(|_| Json::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_parse_as_json_when_possible() {
        assert_eq!(parse_value("10"), json!(10));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("Alice"), json!("Alice"));
        assert_eq!(parse_value("\"10\""), json!("10"));
    }
}
