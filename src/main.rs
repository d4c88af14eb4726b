use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use notebox::client::poller::NotePoller;
use notebox::client::NotesClient;
use notebox::config::{ClientConfig, ServerConfig};
use notebox::models::{Note, NoteInput};
use notebox::{api, db};

#[derive(Parser)]
#[command(name = "notebox")]
#[command(about = "Notes server and command-line client")]
struct Cli {
    /// API base URL for client commands (overrides NOTEBOX_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// API key sent as a bearer token (overrides NOTEBOX_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the notes server
    Serve {
        /// Address to bind (overrides NOTEBOX_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP API (overrides NOTEBOX_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database file (overrides NOTEBOX_DB)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Check server health
    Status,
    /// List notes, most recently updated first
    List,
    /// Show one note
    Show { id: Uuid },
    /// Create a note
    Add {
        title: String,
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Replace a note's title and content
    Edit {
        id: Uuid,
        title: String,
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Delete a note
    Rm { id: Uuid },
    /// Print the note list whenever it changes, until Ctrl-C
    Watch {
        /// Seconds between refreshes (overrides NOTEBOX_POLL_SECS)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

/// Initialize tracing. Client commands log to stderr so stdout only carries
/// command output.
fn init_tracing(use_stderr: bool, default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        db: None,
    });

    if matches!(command, Commands::Serve { .. }) {
        init_tracing(false, "notebox=debug,tower_http=debug");
    } else {
        init_tracing(true, "notebox=warn");
    }

    let mut client_config = ClientConfig::from_env();
    if let Some(url) = cli.url {
        client_config.base_url = url.trim_end_matches('/').to_string();
    }
    if cli.api_key.is_some() {
        client_config.api_key = cli.api_key.clone();
    }
    let client = || NotesClient::from_config(&client_config);

    match command {
        Commands::Serve { host, port, db } => {
            let mut config = ServerConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if db.is_some() {
                config.db_path = db;
            }
            if cli.api_key.is_some() {
                config.security.api_key = cli.api_key;
            }
            serve(config).await?;
        }
        Commands::Status => status(&client()).await?,
        Commands::List => print_list(&client().list_notes().await?),
        Commands::Show { id } => print_note(&client().get_note(id).await?),
        Commands::Add { title, content } => {
            let note = client()
                .create_note(&NoteInput::new(title, content.unwrap_or_default()))
                .await?;
            println!("Created {}", note.id);
        }
        Commands::Edit { id, title, content } => {
            let note = client()
                .update_note(id, &NoteInput::new(title, content.unwrap_or_default()))
                .await?;
            println!("Updated {} at {}", note.id, note.updated_at.to_rfc3339());
        }
        Commands::Rm { id } => {
            let confirmation = client().delete_note(id).await?;
            println!("{}: {}", confirmation.message, confirmation.id);
        }
        Commands::Watch { interval } => {
            let interval = interval
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(client_config.poll_interval);
            watch(client(), interval).await?;
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    if config.security.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }
    let app = api::create_router_with_security(db, config.security.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!(
        "notebox server listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("notebox server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn status(client: &NotesClient) -> anyhow::Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("notebox at {} is unreachable", client.base_url()))?;

    if !health.is_ok() {
        anyhow::bail!("notebox at {} is {}", client.base_url(), health.status);
    }
    println!(
        "notebox at {}: {} ({} notes)",
        client.base_url(),
        health.status,
        health.notes.unwrap_or(0)
    );
    Ok(())
}

async fn watch(client: NotesClient, interval: Duration) -> anyhow::Result<()> {
    let mut poller = NotePoller::start(client, interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shown: Option<Vec<Note>> = None;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            snapshot = poller.next() => {
                let Some(snapshot) = snapshot else { break };
                if let Some(err) = &snapshot.error {
                    eprintln!("Refresh failed: {}", err);
                    continue;
                }
                if shown.as_ref() != Some(&snapshot.notes) {
                    print_list(&snapshot.notes);
                    println!();
                    shown = Some(snapshot.notes);
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}

fn print_list(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes.");
        return;
    }
    for note in notes {
        println!(
            "{}  {}  {}",
            note.id,
            note.updated_at.format("%Y-%m-%d %H:%M:%S"),
            note.title
        );
    }
}

fn print_note(note: &Note) {
    println!("{}", note.title);
    println!("id:      {}", note.id);
    println!("created: {}", note.created_at.to_rfc3339());
    println!("updated: {}", note.updated_at.to_rfc3339());
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
}
