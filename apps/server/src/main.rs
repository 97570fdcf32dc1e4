use std::fmt::Write as _;

use anyhow::Context;
use clap::{Parser, Subcommand};
use messenger_auth::{AuthError, Registration};
use messenger_config::load as load_config;
use messenger_database::{ChatRepository, MessageRepository, UserRepository};
use messenger_gateway::{build_router, GatewayState};
use messenger_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

const SEED_PASSWORD: &str = "password";
const SEED_USERS: [(&str, &str); 3] = [("+1", "Alice"), ("+2", "Bob"), ("+3", "Carol")];

#[derive(Parser)]
#[command(name = "messenger-server")]
#[command(about = "Messenger backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create the demo users +1, +2 and +3
    SeedData,
    /// Print users, chats and message counts
    DumpData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, services).await,
        Commands::SeedData => {
            let created = seed_data(&services).await?;
            println!("Seeded {created} demo users (password '{SEED_PASSWORD}')");
            Ok(())
        }
        Commands::DumpData => {
            print!("{}", dump_data(&services).await?);
            Ok(())
        }
    }
}

async fn run_server(config: &messenger_config::AppConfig, services: BackendServices) -> anyhow::Result<()> {
    info!("starting Messenger backend");

    let state = GatewayState::new(
        services.authenticator,
        services.chat_service,
        services.message_service,
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(messenger_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

/// Register the demo users that are not there yet. Returns how many were created.
async fn seed_data(services: &BackendServices) -> anyhow::Result<usize> {
    let mut created = 0;

    for (phone_number, first_name) in SEED_USERS {
        let registration = Registration {
            phone_number: phone_number.to_string(),
            first_name: first_name.to_string(),
            last_name: String::new(),
            password: SEED_PASSWORD.to_string(),
        };

        match services.authenticator.register(&registration).await {
            Ok((user, _)) => {
                info!(user_id = user.id, phone_number, "seeded user");
                created += 1;
            }
            Err(AuthError::UserExists) => {
                info!(phone_number, "seed user already present");
            }
            Err(error) => {
                return Err(error).with_context(|| format!("failed to seed user {phone_number}"));
            }
        }
    }

    Ok(created)
}

async fn dump_data(services: &BackendServices) -> anyhow::Result<String> {
    let users = UserRepository::new(services.db_pool.clone())
        .list_all()
        .await
        .context("failed to fetch users")?;
    let chats = ChatRepository::new(services.db_pool.clone())
        .list_all()
        .await
        .context("failed to fetch chats")?;

    let message_counts = MessageRepository::new(services.db_pool.clone())
        .count_by_chat()
        .await
        .context("failed to count messages")?;

    let mut out = String::new();

    writeln!(out, "=== USERS ===")?;
    if users.is_empty() {
        writeln!(out, "No users found in database")?;
    } else {
        writeln!(out, "{:<5} {:<20} {:<30} {:<25}", "ID", "Phone", "Name", "Created At")?;
        writeln!(out, "{}", "-".repeat(80))?;
        for user in &users {
            let name = format!("{} {}", user.first_name, user.last_name);
            writeln!(
                out,
                "{:<5} {:<20} {:<30} {:<25}",
                user.id,
                user.phone_number,
                name.trim(),
                user.created_at
            )?;
        }
    }

    writeln!(out, "\n=== CHATS ===")?;
    if chats.is_empty() {
        writeln!(out, "No chats found in database")?;
    } else {
        writeln!(
            out,
            "{:<5} {:<25} {:<8} {:<30} {:<10}",
            "ID", "Name", "Group", "Participants", "Messages"
        )?;
        writeln!(out, "{}", "-".repeat(80))?;
        for chat in &chats {
            writeln!(
                out,
                "{:<5} {:<25} {:<8} {:<30} {:<10}",
                chat.id,
                if chat.name.is_empty() { "-" } else { chat.name.as_str() },
                chat.is_group,
                chat.participant_phone_numbers().join(","),
                message_counts.get(&chat.id).copied().unwrap_or(0)
            )?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use messenger_config::AppConfig;
    use tempfile::TempDir;

    async fn services(temp_dir: &TempDir) -> BackendServices {
        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", temp_dir.path().join("server.db").display());
        BackendServices::initialise(&config).await.unwrap()
    }

    #[tokio::test]
    async fn seed_data_is_idempotent_and_users_can_log_in() {
        let temp_dir = TempDir::new().unwrap();
        let services = services(&temp_dir).await;

        assert_eq!(seed_data(&services).await.unwrap(), 3);
        assert_eq!(seed_data(&services).await.unwrap(), 0);

        let session = services.authenticator.login("+2", SEED_PASSWORD).await;
        assert!(session.is_ok());
    }

    #[tokio::test]
    async fn dump_data_lists_users_chats_and_message_counts() {
        let temp_dir = TempDir::new().unwrap();
        let services = services(&temp_dir).await;

        let empty = dump_data(&services).await.unwrap();
        assert!(empty.contains("No users found"));
        assert!(empty.contains("No chats found"));

        seed_data(&services).await.unwrap();
        let alice = UserRepository::new(services.db_pool.clone())
            .find_by_phone_number("+1")
            .await
            .unwrap()
            .expect("seeded user");
        let resolved = services
            .chat_service
            .resolve_chat(&alice, &group_request(&["+2", "+3"], "Demo"))
            .await
            .unwrap();
        services
            .message_service
            .post_message(
                alice.id,
                &messenger_chats::PostMessageRequest {
                    chat_id: resolved.chat.id,
                    content: "hi".into(),
                },
            )
            .await
            .unwrap();

        let dump = dump_data(&services).await.unwrap();
        assert!(dump.contains("Alice"));
        assert!(dump.contains("Demo"));
        assert!(dump.contains("+1,+2,+3"));
    }

    fn group_request(participants: &[&str], name: &str) -> messenger_chats::ResolveChatRequest {
        messenger_chats::ResolveChatRequest {
            participants: participants.iter().map(|p| p.to_string()).collect(),
            name: Some(name.to_string()),
            is_group: None,
        }
    }
}
