//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::DEFAULT_SLICE_SIZE;

/// keelson - objects on a Parse-style REST backend
#[derive(Parser, Debug)]
#[command(name = "kl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one object by id
    #[command(
        name = "get",
        after_help = "\
EXAMPLES:
    kl get Post xWMyZ4YEGZ
    kl get User k9Qx2LmP0a      # reads from the users collection"
    )]
    Get {
        /// Model or class name
        class: String,
        /// Object id
        id: String,
    },

    /// List objects whose field equals a value
    #[command(
        name = "find",
        long_about = "List objects whose field equals a value.\n\n\
            VALUE is parsed as JSON when possible, so numbers, booleans and \
            tagged values such as pointers can be matched. Anything else is \
            matched as a string.",
        after_help = "\
EXAMPLES:
    kl find Post author_name Alice
    kl find Post views 10
    kl find Post author '{\"__type\":\"Pointer\",\"className\":\"_User\",\"objectId\":\"u1\"}'"
    )]
    Find {
        /// Model or class name
        class: String,
        /// Field to match
        field: String,
        /// Value to match
        value: String,
    },

    /// Create an object from a JSON document
    #[command(
        name = "create",
        after_help = "\
EXAMPLES:
    kl create Post '{\"title\": \"Hello\", \"views\": 0}'"
    )]
    Create {
        /// Model or class name
        class: String,
        /// JSON object with the attributes to set
        json: String,
    },

    /// Update fields of an existing object
    #[command(name = "update")]
    Update {
        /// Model or class name
        class: String,
        /// Object id
        id: String,
        /// JSON object with the attributes to change
        json: String,
    },

    /// Delete one object
    #[command(name = "delete")]
    Delete {
        /// Model or class name
        class: String,
        /// Object id
        id: String,
    },

    /// Delete many objects through the batch endpoint
    #[command(
        name = "batch-delete",
        after_help = "\
EXAMPLES:
    kl batch-delete Post a1 a2 a3
    kl batch-delete Post $(cat ids.txt) --slice-size 50"
    )]
    BatchDelete {
        /// Model or class name
        class: String,
        /// Object ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
        /// Requests per batch call (at most 50)
        #[arg(long, default_value_t = DEFAULT_SLICE_SIZE)]
        slice_size: usize,
    },

    /// Show or initialize configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for kl commands.",
        after_help = "\
EXAMPLES:
    kl completion bash > ~/.local/share/bash-completion/completions/kl
    kl completion zsh > ~/.zfunc/_kl"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Write a new config file
    Init {
        /// Application id
        #[arg(long)]
        application_id: String,
        /// REST API key
        #[arg(long)]
        rest_api_key: Option<String>,
        /// Master key
        #[arg(long)]
        master_key: Option<String>,
        /// Backend root URL
        #[arg(long)]
        api_base: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn batch_delete_defaults() {
        let cli = Cli::try_parse_from(["kl", "batch-delete", "Post", "a", "b"]).unwrap();
        match cli.command {
            Command::BatchDelete {
                class,
                ids,
                slice_size,
            } => {
                assert_eq!(class, "Post");
                assert_eq!(ids, ["a", "b"]);
                assert_eq!(slice_size, DEFAULT_SLICE_SIZE);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn batch_delete_needs_ids() {
        assert!(Cli::try_parse_from(["kl", "batch-delete", "Post"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kl", "get", "Post", "p1", "--debug", "--config", "x.toml"])
            .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
