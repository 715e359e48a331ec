//! Sharecast relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sharecast-server
//! cargo run --bin sharecast-server -- --host 0.0.0.0 --port 5555
//! ```

use std::time::Duration;

use clap::Parser;
use sharecast_server::{Server, ServerConfig};
use sharecast_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "sharecast-server")]
#[command(about = "Chat and screen-share relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "5555")]
    port: u16,

    /// Pending messages per session before new ones are dropped
    #[arg(long, default_value = "500")]
    queue_capacity: usize,

    /// Largest accepted frame, in base64 bytes
    #[arg(long, default_value = "16777216")]
    max_frame_len: usize,

    /// Reactor poll interval in milliseconds
    #[arg(long, default_value = "200")]
    poll_interval_ms: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            queue_capacity: self.queue_capacity,
            max_frame_len: self.max_frame_len,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..ServerConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = Args::parse().into_config();

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
