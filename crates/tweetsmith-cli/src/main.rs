// ============================================================================
// tweetsmith-tokens — inspect and reset the Tweetsmith token file
// ============================================================================
// Usage:
//   tweetsmith-tokens show     Print a redacted summary of the stored session
//   tweetsmith-tokens clear    Forget all tokens and any pending authorization
//   tweetsmith-tokens path     Print the token file location
// ============================================================================

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tweetsmith_core::config::DEFAULT_TOKEN_FILE;
use tweetsmith_core::{FileTokenStore, SessionState, TokenStore};

/// Tweetsmith token file tool
#[derive(Parser)]
#[command(name = "tweetsmith-tokens", version, about = "Inspect and reset the Tweetsmith token file")]
struct Cli {
    /// Path to the token file
    #[arg(long, global = true, env = "TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which tokens are stored, with values masked
    Show,

    /// Replace the stored session with an empty one
    Clear,

    /// Print the resolved token file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show => cmd_show(&FileTokenStore::at(cli.token_file)).await,
        Commands::Clear => cmd_clear(&FileTokenStore::open(cli.token_file)?).await,
        Commands::Path => {
            cmd_path(&cli.token_file);
            Ok(())
        }
    }
}

async fn cmd_show(store: &FileTokenStore) -> Result<()> {
    let summary = store.load().await.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_clear(store: &FileTokenStore) -> Result<()> {
    store.save(&SessionState::default()).await?;
    println!("Cleared {}", store.path().display());
    Ok(())
}

fn cmd_path(path: &Path) {
    println!("{}", path.display());
}
