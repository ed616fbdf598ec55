//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds a [`Client`]
//! 2. Runs the remote work on a tokio runtime
//! 3. Formats and displays output
//!
//! Object data goes to stdout as pretty-printed JSON; status messages are
//! suppressed by `--quiet`.

mod batch;
mod completion;
mod config_cmd;
mod read;
mod write;

pub use batch::batch_delete;
pub use completion::completion;
pub use config_cmd::{init as config_init, show as config_show};
pub use read::{find, get};
pub use write::{create, delete, update};

use anyhow::{bail, Context as _, Result};
use serde_json::Value as Json;
use std::sync::Arc;

use super::args::{Command, ConfigAction};
use super::Context;
use crate::core::config::ClientConfig;
use crate::core::types::model_name_for;
use crate::core::{Attributes, Entity, Schema};
use crate::engine::Client;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Get { class, id } => get(ctx, &class, &id),
        Command::Find {
            class,
            field,
            value,
        } => find(ctx, &class, &field, &value),
        Command::Create { class, json } => create(ctx, &class, &json),
        Command::Update { class, id, json } => update(ctx, &class, &id, &json),
        Command::Delete { class, id } => delete(ctx, &class, &id),
        Command::BatchDelete {
            class,
            ids,
            slice_size,
        } => batch_delete(ctx, &class, &ids, slice_size),
        Command::Config { action } => match action {
            ConfigAction::Show => config_show(ctx),
            ConfigAction::Init {
                application_id,
                rest_api_key,
                master_key,
                api_base,
                force,
            } => config_init(
                ctx,
                ClientConfig {
                    application_id: Some(application_id),
                    rest_api_key,
                    master_key,
                    api_base,
                    session_token: None,
                },
                force,
            ),
        },
        Command::Completion { shell } => completion(shell),
    }
}

/// Load configuration and build a client.
fn client(ctx: &Context) -> Result<Client> {
    let loaded = ClientConfig::load(ctx.config.as_deref()).context("Failed to load config")?;
    if ctx.debug {
        tracing::debug!(config = ?loaded.config, path = ?loaded.path, "using configuration");
    }
    Client::new(loaded.config).context("Failed to set up client")
}

/// Runtime for a handler's remote work.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

/// Schema for a name given on the command line.
///
/// Both model names (`User`) and class names (`_User`) are accepted.
fn schema_for(class: &str) -> Arc<Schema> {
    Schema::dynamic(model_name_for(class))
}

/// Parse a JSON object argument.
fn parse_object(raw: &str) -> Result<Attributes> {
    match serde_json::from_str(raw).context("Invalid JSON")? {
        Json::Object(map) => Ok(map),
        _ => bail!("Expected a JSON object, got: {}", raw),
    }
}

/// Write an entity's attributes to stdout.
fn print_entity(entity: &Entity) -> Result<()> {
    let json = serde_json::to_string_pretty(&Json::Object(entity.attributes()))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_accepts_class_names() {
        assert_eq!(schema_for("_User").class_name(), "_User");
        assert_eq!(schema_for("User").class_name(), "_User");
        assert_eq!(schema_for("Post").collection_path(), "classes/Post");
    }

    #[test]
    fn parse_object_rejects_non_objects() {
        assert!(parse_object("{\"a\": 1}").is_ok());
        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("nope").is_err());
    }
}
