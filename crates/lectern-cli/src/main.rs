use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use lectern_cli::accounts;
use lectern_db::{PgPool, init_db_pool};

#[derive(Parser)]
#[command(name = "lectern-cli")]
#[command(about = "Lectern CLI - Account administration for Lectern", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new user account
    CreateUser {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Add the user to the Moderator group
        #[arg(short = 'm', long)]
        moderator: bool,
    },
    /// Add an existing user to the Moderator group
    GrantModerator {
        /// Email address of the user
        email: String,
    },
    /// Remove an existing user from the Moderator group
    RevokeModerator {
        /// Email address of the user
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url, 5)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::CreateUser {
            email,
            password,
            moderator,
        } => handle_create_user(&pool, email, password, moderator).await,
        Commands::GrantModerator { email } => handle_set_moderator(&pool, &email, true).await,
        Commands::RevokeModerator { email } => handle_set_moderator(&pool, &email, false).await,
    }
}

async fn handle_create_user(
    pool: &PgPool,
    email: Option<String>,
    password: Option<String>,
    moderator: bool,
) -> anyhow::Result<()> {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .context("Failed to read email")?,
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .context("Failed to read password")?,
    };

    let user_id = accounts::create_user(pool, &email, &password, moderator).await?;

    println!("\n✅ User created successfully!");
    println!("   Email: {}", email.trim());
    println!("   ID: {}", user_id);
    if moderator {
        println!("   Member of the Moderator group");
    }

    Ok(())
}

async fn handle_set_moderator(pool: &PgPool, email: &str, moderator: bool) -> anyhow::Result<()> {
    let changed = accounts::set_moderator(pool, email, moderator).await?;

    match (moderator, changed) {
        (true, true) => println!("✅ {} is now a moderator", email.trim()),
        (true, false) => println!("ℹ️  {} is already a moderator", email.trim()),
        (false, true) => println!("✅ {} is no longer a moderator", email.trim()),
        (false, false) => println!("ℹ️  {} was not a moderator", email.trim()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_grant_moderator() {
        let cli = Cli::try_parse_from(["lectern-cli", "grant-moderator", "mod@lectern.dev"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::GrantModerator { ref email } if email == "mod@lectern.dev"
        ));
    }

    #[test]
    fn test_parse_create_user_flags() {
        let cli = Cli::try_parse_from([
            "lectern-cli",
            "create-user",
            "-e",
            "a@lectern.dev",
            "--moderator",
        ])
        .unwrap();
        match cli.command {
            Commands::CreateUser {
                email,
                password,
                moderator,
            } => {
                assert_eq!(email.as_deref(), Some("a@lectern.dev"));
                assert!(password.is_none());
                assert!(moderator);
            }
            _ => panic!("expected create-user"),
        }
    }
}
