#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use bidi_session::{
    guard::navigation_for, settings::BidiSettings, token, Credentials, SessionContext,
    SessionPhase, VERSION,
};
use clap::{Parser, Subcommand};

/// Session tooling for the Bidi fuel-distribution backend
#[derive(Debug, Parser)]
#[command(name = "bidi-session", version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Restore the stored session and report its state
    Status,
    /// Sign in and store the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the stored session
    Logout,
    /// Show the claims of the stored session
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = BidiSettings::load().context("Failed to load settings")?;
    let context =
        SessionContext::from_settings(&settings).context("Failed to configure backend client")?;

    match cli.command {
        Command::Status => {
            let phase = context.bootstrap().await;
            print_phase(phase);
        }
        Command::Login { email, password } => {
            let role = context.login(&Credentials::new(email, password)).await?;
            println!("✓ Signed in as {role}");
            print_navigation(role);
        }
        Command::Logout => {
            context.bootstrap().await;
            // Let the backend notification finish before the runtime shuts down
            if let Some(notification) = context.logout() {
                if let Err(e) = notification.await {
                    log::warn!("Backend logout notification did not complete: {e}");
                }
            }
            println!("✓ Signed out");
        }
        Command::Whoami => {
            context.bootstrap().await;
            let Some(stored) = context.current_token() else {
                println!("Not signed in");
                return Ok(());
            };
            let claims = token::decode_claims(&stored)?;
            print_phase(context.phase());
            if let Some(email) = claims.email.as_deref() {
                println!("Email:   {email}");
            }
            if let Some(sub) = &claims.sub {
                println!("Subject: {sub}");
            }
            if let Some(expires_at) = claims.expires_at() {
                println!("Expires: {}", expires_at.to_rfc3339());
            }
        }
    }

    Ok(())
}

fn print_phase(phase: SessionPhase) {
    match phase {
        SessionPhase::Authenticated(role) => {
            println!("Signed in as {role}");
            print_navigation(role);
        }
        SessionPhase::Unauthenticated | SessionPhase::Bootstrapping => println!("Not signed in"),
    }
}

fn print_navigation(role: bidi_session::Role) {
    println!("Available screens:");
    for screen in navigation_for(role) {
        println!("  {:<16} {}", screen.path(), screen.title());
    }
}
