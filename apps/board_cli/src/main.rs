use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{load_settings, FeedApi, HttpFeedClient, PageConfig, PageController, Row};
use shared::domain::PostId;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[arg(long, global = true)]
    rows: Option<usize>,
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the three collections and print a composed board.
    Render {
        /// Print rows as JSON lines instead of a table.
        #[arg(long)]
        json: bool,
    },
    UpdateTitle {
        #[arg(long)]
        post_id: i64,
        #[arg(long)]
        title: String,
    },
    Delete {
        #[arg(long)]
        post_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = load_settings().with_overrides(cli.base_url, cli.rows, cli.seed);
    let client = HttpFeedClient::new(&settings.base_url)?;
    tracing::debug!(base_url = %client.base_url(), "using feed api");

    match cli.command {
        Command::Render { json } => {
            let controller = PageController::new(Arc::new(client), PageConfig::from(&settings));
            let rows = controller
                .load_and_render()
                .await
                .context("failed to load the board")?;
            for row in &rows {
                if json {
                    println!("{}", row_json(row));
                } else {
                    println!("{}", row_line(row));
                }
            }
        }
        Command::UpdateTitle { post_id, title } => {
            let echo = client
                .update_post_title(PostId(post_id), &title)
                .await
                .with_context(|| format!("failed to update post {post_id}"))?;
            if echo.confirms(&title) {
                println!("updated! post {post_id} is now titled {title:?}");
            } else {
                println!(
                    "post {post_id} not confirmed: server echoed {:?}",
                    echo.title
                );
            }
        }
        Command::Delete { post_id } => {
            client
                .delete_post(PostId(post_id))
                .await
                .with_context(|| format!("failed to delete post {post_id}"))?;
            println!("deleted post {post_id}");
        }
    }

    Ok(())
}

fn row_line(row: &Row) -> String {
    format!(
        "{:>3} | {:<60} | {:<40} | {}",
        row.post().id.0,
        row.title_field(),
        row.album().title,
        row.user().name
    )
}

fn row_json(row: &Row) -> serde_json::Value {
    serde_json::json!({
        "row": row.key().index,
        "post": { "id": row.title_field_id(), "title": row.title_field() },
        "album": { "id": row.album_label_id(), "title": row.album().title },
        "user": { "id": row.user_label_id(), "name": row.user().name },
    })
}
