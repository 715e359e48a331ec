//! Console utilities for the client.

use std::io::Write;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

/// Redisplay the prompt after printing a message
pub fn redisplay_prompt(display_name: &str) {
    print!("{}> ", display_name);
    std::io::stdout().flush().ok();
}

/// Print one line received from the server and restore the prompt
pub fn print_line(display_name: &str, line: &str) {
    print!("\n{}\n", line);
    redisplay_prompt(display_name);
}

/// Read console lines on a dedicated thread.
///
/// rustyline blocks, so it cannot run on the runtime. The channel closes on
/// Ctrl+C, Ctrl+D or a readline failure.
pub fn spawn_console(display_name: &str) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
    let prompt = format!("{}> ", display_name);

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
