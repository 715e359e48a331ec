//! UseCase: moderation commands (CHANGE_STATUS, KICK_USER).
//!
//! Both require the sender to be an Administrator or the Owner, and neither
//! can touch the Owner.

use sharecast_shared::protocol::Command;

use crate::domain::{ConnectionId, PermissionLevel};

use super::{
    chat::sender_name,
    error::DispatchError,
    state::{CloseReason, Departure, RelayState},
};

fn require_moderator(
    state: &RelayState,
    from: ConnectionId,
    command: Command,
) -> Result<(), DispatchError> {
    let permission = state
        .registry()
        .lookup(from)
        .map(|session| session.permission())
        .ok_or_else(|| DispatchError::UserNotFound(from.to_string()))?;

    if permission.can_moderate() {
        Ok(())
    } else {
        Err(DispatchError::PermissionDenied(format!(
            "{} requires Administrator or Owner",
            command
        )))
    }
}

fn resolve_target(
    state: &RelayState,
    target_name: &str,
) -> Result<(ConnectionId, PermissionLevel), DispatchError> {
    state
        .registry()
        .lookup_by_name(target_name)
        .and_then(|handle| {
            state
                .registry()
                .lookup(handle)
                .map(|session| (handle, session.permission()))
        })
        .ok_or_else(|| DispatchError::UserNotFound(target_name.to_string()))
}

/// Change another session's level. The argument is `<digit><name>`, where
/// `1` is RegularUser and `2` is Administrator.
pub fn change_status(
    state: &mut RelayState,
    from: ConnectionId,
    content: &str,
) -> Result<(), DispatchError> {
    require_moderator(state, from, Command::ChangeStatus)?;

    let mut chars = content.trim().chars();
    let level = chars
        .next()
        .and_then(PermissionLevel::from_status_digit)
        .ok_or_else(|| DispatchError::invalid_argument("status must be '<1|2><name>'"))?;
    let target_name = chars.as_str().trim();

    let (target, current) = resolve_target(state, target_name)?;
    if current == PermissionLevel::Owner {
        return Err(DispatchError::PermissionDenied(
            "the Owner's status cannot be changed".to_string(),
        ));
    }

    if let Some(session) = state.registry_mut().lookup_mut(target) {
        session.set_permission(level);
    }
    tracing::info!("{} changed '{}' to {}", from, target_name, level);
    state.broadcast_notice(None, format!("{} is now {}.", target_name, level));
    Ok(())
}

/// Remove another session from the server.
///
/// The kicked session is told who kicked it, everybody else sees the kick,
/// then it is torn down like any other departure.
pub fn kick_user(
    state: &mut RelayState,
    from: ConnectionId,
    content: &str,
) -> Result<Option<Departure>, DispatchError> {
    require_moderator(state, from, Command::KickUser)?;

    let target_name = content.trim();
    let (target, permission) = resolve_target(state, target_name)?;
    if target == from {
        return Err(DispatchError::invalid_argument(
            "you cannot kick yourself, use QUIT",
        ));
    }
    if permission == PermissionLevel::Owner {
        return Err(DispatchError::PermissionDenied(
            "the Owner cannot be kicked".to_string(),
        ));
    }

    let by = sender_name(state, from)?;
    state.send_notice(target, format!("You were kicked by {}.", by));
    state.broadcast_notice(Some(target), format!("{} was kicked by {}.", target_name, by));

    Ok(state.teardown(target, CloseReason::Kicked { by }))
}
