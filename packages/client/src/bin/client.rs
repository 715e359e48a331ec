//! Sharecast console client.
//!
//! Registers with the relay server under a display name, then sends console
//! lines of the form `COMMAND content` (e.g. `SEND_MESSAGE hello`).
//! Reconnects on connection loss (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sharecast-client -- --name Alice
//! cargo run --bin sharecast-client -- -n Bob --share-file frame.jpg
//! ```

use std::path::PathBuf;

use clap::Parser;
use sharecast_client::{
    collaborator::{FileFrameCapture, FrameCapture, LoggingRenderer, NoCapture},
    run_client,
};
use sharecast_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "sharecast-client")]
#[command(about = "Console client for the Sharecast relay server", long_about = None)]
struct Args {
    /// Display name shown to other users
    #[arg(short = 'n', long)]
    name: String,

    /// Host address of the relay server
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number of the relay server
    #[arg(short = 'p', long, default_value = "5555")]
    port: u16,

    /// Encoded image sent as every frame while sharing
    #[arg(long)]
    share_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let capture: Box<dyn FrameCapture> = match &args.share_file {
        Some(path) => match FileFrameCapture::open(path) {
            Ok(capture) => Box::new(capture),
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Box::new(NoCapture),
    };

    let addr = format!("{}:{}", args.host, args.port);
    let renderer = Box::new(LoggingRenderer::default());
    if let Err(e) = run_client(addr, args.name, capture, renderer).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
