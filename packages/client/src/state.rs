//! Client-side view of the screen-share state.
//!
//! The server is authoritative; this only tracks what the console needs to
//! decide whether to capture or render frames.

use sharecast_shared::protocol::{Command, SystemCode};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShareState {
    sharing: bool,
    watching: bool,
}

impl ShareState {
    pub fn is_sharing(&self) -> bool {
        self.sharing
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Apply a control code and return the line to show the user.
    pub fn on_system(&mut self, code: SystemCode) -> &'static str {
        match code {
            SystemCode::ConfirmStart => {
                self.sharing = true;
                "Screen sharing started."
            }
            SystemCode::DeniedStart => "Screen sharing was denied.",
            SystemCode::ConfirmJoin => {
                self.watching = true;
                "Joined screen sharing session."
            }
            SystemCode::DeniedJoin => "Joining share was denied.",
            SystemCode::Disconnect => {
                self.watching = false;
                "Left screen sharing session."
            }
        }
    }

    /// The server confirms END_SHARE_SCREEN only with a notice, so stop
    /// capturing as soon as it is sent.
    pub fn on_command_sent(&mut self, command: Command) {
        if command == Command::EndShareScreen {
            self.sharing = false;
        }
    }
}
