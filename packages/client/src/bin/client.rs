//! Karaoke room client.
//!
//! Connects with an identity token, optionally joins a room, and sends
//! slash commands typed at the prompt. Reconnects (and rejoins) on
//! connection loss, up to 5 attempts with a 5 second interval.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin karaoke-client -- --token alice --room main
//! cargo run --bin karaoke-client -- -t admin -r main --player-view
//! ```

use clap::Parser;
use karaoke_client::{SessionOptions, run_client};
use karaoke_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "karaoke-client")]
#[command(about = "Interactive client for the karaoke room server", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Identity token issued by the server operator
    #[arg(short = 't', long, env = "KARAOKE_TOKEN")]
    token: Option<String>,

    /// Room to join after connecting
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Show player transport deltas (play/pause/volume/status)
    #[arg(long)]
    player_view: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let options = SessionOptions {
        url: args.url,
        token: args.token,
        room: args.room,
        player_view: args.player_view,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
