use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use societas_backend_api::{build_router, AppState};
use societas_backend_runtime::{telemetry, BackendServices};
use societas_config::load as load_config;
use societas_store::{to_fields, CollectionPath, DocumentStore, Fields, WriteBatch};
use tokio::net::TcpListener;
use tracing::info;

const SEED_USER: &str = "demo-user";
const SEED_AGENT: &str = "scout";
const SEED_BOARD: &str = "launch-board";
const SEED_CHAT: &str = "demo-chat";

#[derive(Parser)]
#[command(name = "societas-backend")]
#[command(about = "Societas backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print every document held by the embedded store
    DumpData,
    /// Write a demo user with an agent, a board, a task and a chat
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::DumpData => dump_data().await,
        Commands::SeedData => seed_data().await,
    }
}

async fn initialise_services() -> anyhow::Result<(societas_config::AppConfig, BackendServices)> {
    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    Ok((config, services))
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Societas backend");

    let (config, services) = initialise_services().await?;

    let state = AppState::new(
        services.store.clone(),
        services.identity.clone(),
        services.completion.clone(),
        services.system_instruction.clone(),
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(societas_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn dump_data() -> anyhow::Result<()> {
    info!("dumping documents from the embedded store");

    let (_, services) = initialise_services().await?;
    let sqlite = services
        .sqlite
        .as_ref()
        .context("dump-data only works with the sqlite store backend")?;

    let documents = sqlite
        .all_documents()
        .await
        .context("failed to read documents")?;

    println!("=== DOCUMENTS ===");
    if documents.is_empty() {
        println!("No documents found in database");
        return Ok(());
    }

    println!("Found {} documents:", documents.len());
    println!("{:<60} {}", "Path", "Fields");
    println!("{}", "-".repeat(120));
    for document in documents {
        let fields = serde_json::to_string(&Value::Object(document.fields))
            .context("failed to render document fields")?;
        println!("{:<60} {}", document.path.to_string(), fields);
    }

    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    info!("seeding store with demo data");

    let (_, services) = initialise_services().await?;

    let user = CollectionPath::root("users").doc(SEED_USER);
    let agent = user.collection("agents").doc(SEED_AGENT);
    let board = user.collection("boards").doc(SEED_BOARD);
    let chat = user.collection("chats").doc(SEED_CHAT);

    let mut batch = WriteBatch::new();
    batch
        .set(
            user,
            seed_fields(json!({
                "name": "Demo User",
                "email": "demo@example.com",
                "enterprise": "Societas",
                "email_verified": false,
                "created_at": "2024-01-01T10:00:00.000000Z",
                "updated_at": "2024-01-01T10:00:00.000000Z"
            }))?,
        )
        .set(
            agent.clone(),
            seed_fields(json!({
                "name": "Scout",
                "description": "Research",
                "capabilities": ["search", "summarise"],
                "settings_template": { "tone": "brief" }
            }))?,
        )
        .set(
            agent.collection("subagents").doc("crawler"),
            seed_fields(json!({ "name": "Crawler", "description": "Fetches sources" }))?,
        )
        .set(
            board.clone(),
            seed_fields(json!({
                "title": "Launch",
                "owner_id": SEED_USER,
                "members": [SEED_USER, SEED_AGENT],
                "created_at": "2024-01-01T11:00:00.000000Z"
            }))?,
        )
        .set(
            board.collection("tasks").doc("draft-announcement"),
            seed_fields(json!({
                "description": "Draft the launch announcement",
                "status": "todo",
                "assignee_id": SEED_AGENT,
                "creator_id": SEED_USER,
                "created_at": "2024-01-01T11:30:00.000000Z"
            }))?,
        )
        .set(
            chat.clone(),
            seed_fields(json!({
                "participants": [SEED_USER, SEED_AGENT],
                "summary": "Launch planning",
                "last_message": "Happy to help with the launch.",
                "created_at": "2024-01-01T12:00:00.000000Z"
            }))?,
        )
        .set(
            chat.collection("messages").doc("seed-message-1"),
            seed_fields(json!({
                "sender_id": SEED_USER,
                "content": "Can you help plan the launch?",
                "timestamp": "2024-01-01T12:00:00.000000Z"
            }))?,
        )
        .set(
            chat.collection("messages").doc("seed-message-2"),
            seed_fields(json!({
                "sender_id": SEED_AGENT,
                "content": "Happy to help with the launch.",
                "timestamp": "2024-01-01T12:00:00.000001Z"
            }))?,
        );

    let writes = batch.len();
    services
        .store
        .commit(batch)
        .await
        .context("failed to write seed documents")?;

    println!("Store seeded with demo data:");
    println!("- user '{SEED_USER}' with agent '{SEED_AGENT}' and one sub-agent");
    println!("- board '{SEED_BOARD}' with one task");
    println!("- chat '{SEED_CHAT}' with two messages");
    println!("- {writes} documents written");
    println!("Run 'dump-data' to see the inserted data");

    Ok(())
}

fn seed_fields(value: Value) -> anyhow::Result<Fields> {
    to_fields(&value).context("seed document must be a JSON object")
}
