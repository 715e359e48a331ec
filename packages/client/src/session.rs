//! Interactive client session.

use std::time::Duration;

use sharecast_shared::protocol::Command;
use tokio::{sync::mpsc, time::MissedTickBehavior};

use crate::{
    client::RelayClient,
    collaborator::{FrameCapture, FrameRenderer},
    command::{parse_console_line, usage},
    error::ClientError,
    event::ServerEvent,
    state::ShareState,
    ui::{print_line, redisplay_prompt},
};

/// How often a frame is captured and sent while sharing.
const CAPTURE_INTERVAL: Duration = Duration::from_millis(200);

/// Run one connection until the user quits or the server goes away.
///
/// Returns `Ok(())` on QUIT, Ctrl+C/Ctrl+D or an orderly server close.
pub async fn run_client_session(
    addr: &str,
    display_name: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
    capture: &mut dyn FrameCapture,
    renderer: &mut dyn FrameRenderer,
) -> Result<(), ClientError> {
    let client = RelayClient::connect(addr, display_name).await?;

    tracing::info!("Connected to relay server!");
    println!(
        "\nYou are '{}'. Type a command and press Enter. Press Ctrl+C to exit.\n{}\n",
        display_name,
        usage()
    );
    redisplay_prompt(display_name);

    let (mut events, mut sender) = client.into_split();
    let mut share = ShareState::default();
    let mut capture_tick = tokio::time::interval(CAPTURE_INTERVAL);
    capture_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = events.recv() => match event? {
                ServerEvent::Closed => {
                    print_line(display_name, "Server closed the connection.");
                    return Ok(());
                }
                ServerEvent::Text(text) => print_line(display_name, &text),
                ServerEvent::System(code) => {
                    let was_watching = share.is_watching();
                    let line = share.on_system(code);
                    if was_watching && !share.is_watching() {
                        renderer.close();
                    }
                    print_line(display_name, line);
                }
                ServerEvent::Frame(frame) => {
                    if share.is_watching()
                        && let Err(e) = renderer.render_frame(&frame)
                    {
                        tracing::warn!("Failed to render frame: {}", e);
                    }
                }
            },
            line = input.recv() => {
                let Some(line) = line else {
                    sender.send_command(Command::Quit, "").await?;
                    return Ok(());
                };
                let Some((command, content)) = parse_console_line(&line) else {
                    print_line(display_name, &format!("Invalid input. {}", usage()));
                    continue;
                };

                sender.send_command(command, &content).await?;
                share.on_command_sent(command);
                if command == Command::Quit {
                    return Ok(());
                }
            }
            _ = capture_tick.tick() => match next_frame(&share, capture) {
                Ok(Some(frame)) => sender.send_frame(&frame).await?,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Frame capture failed, ending stream: {}", e);
                    sender.send_command(Command::EndShareScreen, "").await?;
                    share.on_command_sent(Command::EndShareScreen);
                }
            },
        }
    }
}

/// Capture a frame if this session is currently sharing.
fn next_frame(
    share: &ShareState,
    capture: &mut dyn FrameCapture,
) -> Result<Option<Vec<u8>>, ClientError> {
    if !share.is_sharing() {
        return Ok(None);
    }
    capture.capture_frame().map(Some)
}
