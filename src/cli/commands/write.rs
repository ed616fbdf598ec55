//! write commands - Create, update and delete single objects

use anyhow::{Context as _, Result};
use serde_json::json;

use super::{client, parse_object, print_entity, runtime, schema_for};
use crate::cli::Context;
use crate::core::codec;
use crate::core::{Attributes, Entity};

/// Create an object from a JSON document.
pub fn create(ctx: &Context, class: &str, raw: &str) -> Result<()> {
    let client = client(ctx)?;
    let attributes = parse_object(raw)?;

    let mut entity = Entity::new(schema_for(class));
    assign(&mut entity, attributes);

    runtime()?
        .block_on(client.try_save(&mut entity))
        .with_context(|| format!("Failed to create {}", entity.class_name()))?;

    if !ctx.quiet {
        eprintln!(
            "Created {} {}",
            entity.class_name(),
            entity.object_id().unwrap_or_default()
        );
    }
    print_entity(&entity)
}

/// Update fields of an existing object.
pub fn update(ctx: &Context, class: &str, id: &str, raw: &str) -> Result<()> {
    let client = client(ctx)?;
    let attributes = parse_object(raw)?;

    let mut entity = existing(class, id);
    assign(&mut entity, attributes);

    runtime()?
        .block_on(client.try_save(&mut entity))
        .with_context(|| format!("Failed to update {} '{}'", entity.class_name(), id))?;

    if !ctx.quiet {
        eprintln!("Updated {} {}", entity.class_name(), id);
    }
    Ok(())
}

/// Delete one object.
pub fn delete(ctx: &Context, class: &str, id: &str) -> Result<()> {
    let client = client(ctx)?;
    let mut entity = existing(class, id);

    runtime()?
        .block_on(client.try_destroy(&mut entity))
        .with_context(|| format!("Failed to delete {} '{}'", entity.class_name(), id))?;

    if !ctx.quiet {
        eprintln!("Deleted {} {}", entity.class_name(), id);
    }
    Ok(())
}

/// A persisted entity known only by id.
pub(super) fn existing(class: &str, id: &str) -> Entity {
    let mut confirmed = Attributes::new();
    confirmed.insert("objectId".to_string(), json!(id));
    Entity::from_server(schema_for(class), confirmed)
}

/// Set every attribute, decoding tagged values so they round-trip.
fn assign(entity: &mut Entity, attributes: Attributes) {
    for (key, raw) in attributes {
        entity.set(&key, codec::decode(&raw));
    }
}
