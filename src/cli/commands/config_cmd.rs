//! config command - Show or initialize configuration

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::ClientConfig;

/// Print the effective configuration.
pub fn show(ctx: &Context) -> Result<()> {
    let loaded = ClientConfig::load(ctx.config.as_deref()).context("Failed to load config")?;
    let config = &loaded.config;

    match &loaded.path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No config file found; defaults and environment only"),
    }

    let secret = |value: &Option<String>| if value.is_some() { "(set)" } else { "(not set)" };
    println!(
        "application_id = {}",
        config.application_id.as_deref().unwrap_or("(not set)")
    );
    println!("rest_api_key = {}", secret(&config.rest_api_key));
    println!("master_key = {}", secret(&config.master_key));
    println!("session_token = {}", secret(&config.session_token));
    println!("api_base = {}", config.api_base());

    Ok(())
}

/// Write `config` to the `--config` path or the canonical location.
pub fn init(ctx: &Context, config: ClientConfig, force: bool) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    config
        .require_credentials()
        .context("Incomplete configuration")?;

    let path = match &ctx.config {
        Some(path) => path.clone(),
        None => ClientConfig::default_path()?,
    };
    if path.exists() && !force {
        bail!(
            "Config file '{}' already exists; pass --force to overwrite",
            path.display()
        );
    }

    config
        .write_to(&path)
        .context("Failed to write config")?;

    if !ctx.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
