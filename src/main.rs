// Entrypoint for the CLI application.
// - Parses flags, loads the service-account key and connects; any
//   failure there is fatal and surfaces as a non-zero exit.
// - Hands the connected client to the requested flow, or to the
//   interactive menu when no subcommand is given.

use anyhow::Context;
use clap::{Parser, Subcommand};
use drive_reader::api::DriveClient;
use drive_reader::auth::ServiceAccountKey;
use drive_reader::config::{self, Settings};
use drive_reader::ui;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about = "Read and download files from Google Drive with a service account")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Service-account key file (defaults to ~/gcloud-key.json)
    #[arg(long, env = "DRIVE_CREDENTIALS", global = true)]
    credentials: Option<PathBuf>,
    #[arg(long, env = "DRIVE_API_URL", default_value = config::DEFAULT_API_URL, global = true)]
    api_url: String,
    #[arg(long, default_value_t = config::DEFAULT_SEARCH_PAGE_SIZE, global = true)]
    search_page_size: u32,
    #[arg(long, default_value_t = config::DEFAULT_LISTING_PAGE_SIZE, global = true)]
    listing_page_size: u32,
    /// Bytes requested per download chunk
    #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE, global = true)]
    chunk_size: u64,
    /// Give up on any single request after this many seconds (default: never)
    #[arg(long, env = "DRIVE_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find folders by name and list their contents
    Browse {
        #[arg(env = "DRIVE_FOLDER_NAME")]
        folder_name: String,
    },
    /// Find a file inside a folder and download it
    Fetch {
        #[arg(long, env = "DRIVE_FOLDER_ID")]
        folder_id: String,
        #[arg(env = "DRIVE_FILE_NAME")]
        file_name: String,
        #[arg(short, long, env = "DRIVE_OUTPUT")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;

    let settings = Settings {
        api_base_url: cli.api_url,
        search_page_size: cli.search_page_size,
        listing_page_size: cli.listing_page_size,
        chunk_size: cli.chunk_size,
        request_timeout: cli.timeout_secs.map(Duration::from_secs),
    };

    let key_path = cli.credentials.unwrap_or_else(config::default_credentials_path);
    let key = ServiceAccountKey::from_file(&key_path)
        .with_context(|| format!("loading service account key from {}", key_path.display()))?;
    let client = DriveClient::connect(&key, &settings).context("authenticating with Google Drive")?;
    let account = client.account().to_string();

    let outcome = match cli.command {
        Some(Commands::Browse { folder_name }) => ui::browse(&client, &settings, &account, &folder_name),
        Some(Commands::Fetch {
            folder_id,
            file_name,
            output,
        }) => ui::fetch(&client, &settings, &folder_id, &file_name, &output),
        None => ui::main_menu(&client, &settings, &account)?,
    };
    Ok(outcome.exit_code())
}
