// SPDX-License-Identifier: MIT

//! Session and message event application.

use super::MaterializedState;
use el_core::Event;

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::SessionStarted { record } | Event::SessionUpdated { record } => {
            state.sessions.insert(record.id, record.clone());
        }

        Event::MessageAppended { message } => {
            let log = state.messages.entry(message.session_id).or_default();
            // Replay guard: message ids are unique per session.
            if log.iter().any(|m| m.id == message.id) {
                return;
            }
            log.push(message.clone());
        }

        _ => {}
    }
}
