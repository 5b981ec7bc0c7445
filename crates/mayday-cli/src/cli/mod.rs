//! Command-line interface for mayday.
//!
//! This module provides the CLI structure for the `mayday` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{AccountCommand, ConfigCommand, ContactsCommand, SosCommand, StatusCommand};

/// mayday - one-tap SOS dispatch to your emergency contacts
///
/// Maintains a short list of emergency contacts and, on trigger, captures a
/// fresh position fix, composes a distress message, and opens one pre-filled
/// WhatsApp link per contact.
#[derive(Debug, Parser)]
#[command(name = "mayday")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Signup(AccountCommand),

    /// Sign in to an existing account
    Login(AccountCommand),

    /// Sign out and clear the local session
    Logout,

    /// Show session and configuration status
    Status(StatusCommand),

    /// Manage emergency contacts
    #[command(subcommand)]
    Contacts(ContactsCommand),

    /// Trigger an SOS dispatch to every contact
    Sos(SosCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> mayday::logging::Verbosity {
        if self.quiet {
            mayday::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => mayday::logging::Verbosity::Normal,
                1 => mayday::logging::Verbosity::Verbose,
                _ => mayday::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "mayday");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_quiet() {
        let cli = Cli {
            config: None,
            verbose: 0,
            quiet: true,
            command: Command::Logout,
        };
        assert_eq!(cli.verbosity(), mayday::logging::Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_normal() {
        let cli = Cli {
            config: None,
            verbose: 0,
            quiet: false,
            command: Command::Logout,
        };
        assert_eq!(cli.verbosity(), mayday::logging::Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_verbose() {
        let cli = Cli {
            config: None,
            verbose: 1,
            quiet: false,
            command: Command::Logout,
        };
        assert_eq!(cli.verbosity(), mayday::logging::Verbosity::Verbose);
    }

    #[test]
    fn test_verbosity_trace() {
        let cli = Cli {
            config: None,
            verbose: 3,
            quiet: false,
            command: Command::Logout,
        };
        assert_eq!(cli.verbosity(), mayday::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_login() {
        let args = vec!["mayday", "login", "--email", "a@b.c", "--password", "secret1"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Login(cmd) => {
                assert_eq!(cmd.email, "a@b.c");
                assert_eq!(cmd.password, "secret1");
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_parse_contacts_add() {
        let args = vec!["mayday", "contacts", "add", "Mom", "+1 (234) 567-8901"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Contacts(ContactsCommand::Add { .. })
        ));
    }

    #[test]
    fn test_parse_sos_dry_run() {
        let args = vec!["mayday", "sos", "--dry-run"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Sos(cmd) => assert!(cmd.dry_run),
            _ => panic!("expected sos"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["mayday", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_quiet() {
        let args = vec!["mayday", "-q", "logout"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.quiet);
    }
}
