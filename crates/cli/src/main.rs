//! Bazaar CLI - Database migrations, catalog seeding and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront migrations (tables and the session store)
//! bazaar-cli migrate
//!
//! # Seed the built-in demo catalog, or a JSON catalog file
//! bazaar-cli seed
//! bazaar-cli seed --file catalog.json
//!
//! # Create a seller who can sign in
//! bazaar-cli user create -e maya@example.com -n "Maya Chen" -r seller -p 'long passphrase'
//!
//! # Reset a password
//! bazaar-cli user set-password -e maya@example.com -p 'new passphrase'
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Insert or update catalog products
    Seed {
        /// JSON file with an array of products (defaults to the demo catalog)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`customer`, `seller`, `admin`)
        #[arg(short, long, default_value = "customer")]
        role: String,

        /// Password for signing in (omit to create an account that cannot sign in)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Set or replace a user's password
    SetPassword {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, password.as_deref()).await?;
            }
            UserAction::SetPassword { email, password } => {
                commands::user::set_password(&email, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "bazaar-cli", "user", "create", "-e", "a@b.co", "-n", "A", "-r", "admin",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { ref role, .. }
            }) if role == "admin"
        ));
    }

    #[test]
    fn test_parse_set_password() {
        let cli = Cli::try_parse_from([
            "bazaar-cli",
            "user",
            "set-password",
            "-e",
            "a@b.co",
            "-p",
            "long enough",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::SetPassword { ref password, .. }
            }) if password == "long enough"
        ));
    }
}
