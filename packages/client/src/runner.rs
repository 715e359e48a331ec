//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{
    collaborator::{FrameCapture, FrameRenderer},
    error::ClientError,
    session::run_client_session,
    ui::spawn_console,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the console client, reconnecting when the connection is lost
pub async fn run_client(
    addr: String,
    display_name: String,
    mut capture: Box<dyn FrameCapture>,
    mut renderer: Box<dyn FrameRenderer>,
) -> Result<(), ClientError> {
    let mut input = spawn_console(&display_name);
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            addr,
            display_name,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(
            &addr,
            &display_name,
            &mut input,
            capture.as_mut(),
            renderer.as_mut(),
        )
        .await
        {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                break;
            }
            Err(e) if e.is_connection_lost() => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
