//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Credentials for signup and login.
#[derive(Debug, Args)]
pub struct AccountCommand {
    /// Account email address
    #[arg(short, long)]
    pub email: String,

    /// Account password (minimum 6 characters)
    #[arg(short, long)]
    pub password: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Emergency-contact management commands.
#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// List all emergency contacts, sorted by name
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a new emergency contact
    Add {
        /// Contact name (1-50 characters)
        name: String,

        /// WhatsApp number, with or without formatting
        number: String,
    },

    /// Edit an existing contact
    Edit {
        /// Identifier of the contact to edit
        id: String,

        /// New contact name
        #[arg(short, long)]
        name: Option<String>,

        /// New WhatsApp number
        #[arg(long)]
        number: Option<String>,
    },

    /// Remove a contact
    Remove {
        /// Identifier of the contact to remove
        id: String,
    },
}

/// SOS trigger arguments.
#[derive(Debug, Args)]
pub struct SosCommand {
    /// Print the dispatch links instead of opening them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the AI enhancement step for this trigger
    #[arg(long)]
    pub no_enhance: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
