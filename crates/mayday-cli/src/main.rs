//! `mayday` - CLI for the mayday SOS dispatch toolkit
//!
//! This binary manages the signed-in session and emergency contacts, and
//! triggers SOS dispatches that open one pre-filled WhatsApp link per
//! contact.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

mod cli;
mod open;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};

use mayday::contact::{ContactPatch, NewContact};
use mayday::session::{IdentityGateway, SessionFile, StoredSession};
use mayday::sos::{open_all, SosComposer};
use mayday::store::ContactStore;
use mayday::{init_logging, Config, EmergencyContact, Error};
use mayday_hosted::{HostedContactStore, HostedIdentity, HttpEnhancer, HttpLocator};

use cli::{Cli, Command, ConfigCommand, ContactsCommand, SosCommand, StatusCommand};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    if let Err(err) = run(cli).await {
        debug!(error = ?err, "command failed");
        // Errors from this crate carry a friendlier user-facing notice.
        match err.downcast_ref::<Error>() {
            Some(known) => eprintln!("{}", known.user_message()),
            None => eprintln!("{err}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Signup(cmd) => handle_signup(&config, &cmd.email, &cmd.password).await,
        Command::Login(cmd) => handle_login(&config, &cmd.email, &cmd.password).await,
        Command::Logout => handle_logout(&config).await,
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Contacts(cmd) => handle_contacts(&config, cmd).await,
        Command::Sos(cmd) => handle_sos(&config, &cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn session_file() -> SessionFile {
    SessionFile::new(Config::session_file_path())
}

/// Load the persisted session, failing with a sign-in hint when absent.
fn require_session() -> Result<StoredSession, Error> {
    session_file()
        .load()?
        .ok_or_else(|| Error::precondition_failed("You are not signed in. Run `mayday login` first."))
}

async fn handle_signup(config: &Config, email: &str, password: &str) -> anyhow::Result<()> {
    let identity = HostedIdentity::new(&config.identity);
    let user = identity.sign_up(email, password).await?;

    session_file().save(&StoredSession::now(user.clone()))?;
    println!("Account created. Signed in as {}.", user_label(&user.email, &user.uid));
    Ok(())
}

async fn handle_login(config: &Config, email: &str, password: &str) -> anyhow::Result<()> {
    let identity = HostedIdentity::new(&config.identity);
    let user = identity.sign_in(email, password).await?;

    session_file().save(&StoredSession::now(user.clone()))?;
    println!("Signed in as {}.", user_label(&user.email, &user.uid));
    Ok(())
}

async fn handle_logout(config: &Config) -> anyhow::Result<()> {
    let identity = HostedIdentity::new(&config.identity);

    // The local session is cleared even if the provider call fails; a stale
    // provider-side session expires on its own.
    if let Err(err) = identity.sign_out().await {
        warn!(error = %err, "provider sign-out failed, clearing local session anyway");
    }
    session_file().clear()?;
    println!("Signed out.");
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let session = session_file().load()?;

    if cmd.json {
        let status = serde_json::json!({
            "signed_in": session.is_some(),
            "user": session.as_ref().map(|s| &s.user),
            "signed_in_at": session.as_ref().map(|s| s.signed_in_at),
            "config_path": Config::default_config_path(),
            "store_url": config.store.base_url,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("mayday status");
        println!("-------------");
        match &session {
            Some(s) => {
                println!("Signed in:  {}", user_label(&s.user.email, &s.user.uid));
                println!("Since:      {}", s.signed_in_at);
            }
            None => println!("Signed in:  no"),
        }
        println!("Config:     {}", Config::default_config_path().display());
        println!("Store:      {}", config.store.base_url);
    }
    Ok(())
}

async fn handle_contacts(config: &Config, cmd: ContactsCommand) -> anyhow::Result<()> {
    let session = require_session()?;
    let store = HostedContactStore::new(&config.store);
    let uid = &session.user.uid;

    match cmd {
        ContactsCommand::List { json } => {
            let contacts = store.list(uid).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            } else if contacts.is_empty() {
                println!("No emergency contacts yet. Add one with `mayday contacts add`.");
            } else {
                for contact in &contacts {
                    print_contact(contact);
                }
            }
        }
        ContactsCommand::Add { name, number } => {
            let created = store
                .create(
                    uid,
                    NewContact {
                        name,
                        whatsapp_number: number,
                    },
                )
                .await?;
            println!("Added contact:");
            print_contact(&created);
        }
        ContactsCommand::Edit { id, name, number } => {
            let patch = ContactPatch {
                name,
                whatsapp_number: number,
            };
            if patch.is_empty() {
                return Err(Error::invalid_argument(
                    "Nothing to change. Pass --name and/or --number.",
                )
                .into());
            }
            let updated = store.update(uid, &id, patch).await?;
            println!("Updated contact:");
            print_contact(&updated);
        }
        ContactsCommand::Remove { id } => {
            store.delete(uid, &id).await?;
            println!("Contact removed.");
        }
    }
    Ok(())
}

async fn handle_sos(config: &Config, cmd: &SosCommand) -> anyhow::Result<()> {
    let session = require_session()?;
    let store = HostedContactStore::new(&config.store);
    let contacts = store
        .list(&session.user.uid)
        .await
        .context("could not load emergency contacts")?;

    let locator = HttpLocator::new(&config.locate);
    let enhancer = HttpEnhancer::new(&config.enhance);
    let mut options = config.sos_options();
    if cmd.no_enhance {
        options.enhance_enabled = false;
    }

    let composer = SosComposer::new(&locator, &enhancer, options);
    let report = composer.trigger(&session.user, &contacts).await?;

    println!("Position:  {}", report.fix.map_link());
    if report.enhancement.is_degraded() {
        println!("Message:   (default) {}", report.message);
    } else {
        println!("Message:   {}", report.message);
    }

    if cmd.dry_run {
        println!();
        open_all(&report, &open::PrintOpener);
        return Ok(());
    }

    let opened = open_all(&report, &open::BrowserOpener);
    println!(
        "Opened {opened} of {} dispatch links.",
        report.dispatches.len()
    );
    if report.failed_count() > 0 {
        println!(
            "{} contact(s) had unusable numbers and were skipped.",
            report.failed_count()
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Identity]");
                println!("  Base URL:         {}", config.identity.base_url);
                println!(
                    "  API key:          {}",
                    if config.identity.api_key.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!();
                println!("[Store]");
                println!("  Base URL:         {}", config.store.base_url);
                println!();
                println!("[Locate]");
                println!("  Endpoint:         {}", config.locate.endpoint);
                println!("  Wait (seconds):   {}", config.locate.wait_secs);
                println!();
                println!("[Enhance]");
                println!("  Endpoint:         {}", config.enhance.endpoint);
                println!("  Wait (seconds):   {}", config.enhance.wait_secs);
                println!("  Enabled:          {}", config.enhance.enabled);
                println!();
                println!("[SOS]");
                println!("  Default message:  {}", config.sos.default_message);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn user_label(email: &Option<String>, uid: &str) -> String {
    email.clone().unwrap_or_else(|| uid.to_string())
}

fn print_contact(contact: &EmergencyContact) {
    println!(
        "  {}  {}  {}",
        contact.id.as_deref().unwrap_or("-"),
        contact.name,
        contact.whatsapp_number
    );
}
