// SPDX-License-Identifier: MIT

//! Session and message persistence, used by the daemon's session manager.
//!
//! The manager owns the lifecycle; the engine owns durability and the
//! status-machine guard on every persisted transition.

use crate::engine::Engine;
use crate::error::ElementError;
use el_core::{Clock, ElementId, Event, MessageRecord, SessionRecord, SessionStatus};

/// Filter for session listings.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub agent_id: Option<ElementId>,
    pub status: Option<SessionStatus>,
    pub limit: Option<usize>,
}

impl<C: Clock> Engine<C> {
    /// Persist a brand-new session record.
    pub fn record_session_started(&self, record: SessionRecord) -> Result<(), ElementError> {
        let mut state = self.state().lock();
        if state.sessions.contains_key(record.id.as_str()) {
            return Err(ElementError::Validation(format!(
                "session already recorded: {}",
                record.id
            )));
        }
        self.commit_locked(&mut state, Event::SessionStarted { record })?;
        Ok(())
    }

    /// Persist a session mutation, enforcing the status machine.
    pub fn record_session_updated(&self, record: SessionRecord) -> Result<(), ElementError> {
        let mut state = self.state().lock();
        let current = state
            .sessions
            .get(record.id.as_str())
            .ok_or_else(|| ElementError::NotFound(record.id.to_string()))?;
        if current.status != record.status {
            current.status.check_transition(record.status)?;
        }
        self.commit_locked(&mut state, Event::SessionUpdated { record })?;
        Ok(())
    }

    /// Persist one derived message. Duplicate ids are replay no-ops.
    pub fn append_message(&self, message: MessageRecord) -> Result<(), ElementError> {
        let mut state = self.state().lock();
        self.commit_locked(&mut state, Event::MessageAppended { message })?;
        Ok(())
    }

    pub fn session(&self, id: &str) -> Option<SessionRecord> {
        self.state().lock().session(id).cloned()
    }

    /// Sessions, newest first.
    pub fn sessions(&self, filter: &SessionFilter) -> Vec<SessionRecord> {
        let state = self.state().lock();
        let mut sessions: Vec<SessionRecord> = state
            .sessions
            .values()
            .filter(|s| {
                filter.agent_id.map(|a| s.agent_id == a).unwrap_or(true)
                    && filter.status.map(|st| s.status == st).unwrap_or(true)
            })
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            (b.started_at, a.id.as_str()).cmp(&(a.started_at, b.id.as_str()))
        });
        if let Some(limit) = filter.limit {
            sessions.truncate(limit);
        }
        sessions
    }

    /// The session holding the agent's uniqueness slot, if any.
    pub fn active_session(&self, agent_id: &ElementId) -> Option<SessionRecord> {
        let state = self.state().lock();
        state
            .sessions
            .values()
            .find(|s| s.agent_id == *agent_id && s.status.is_live())
            .cloned()
    }

    /// Newest session of the agent that wrote a resumption cookie.
    pub fn most_recent_resumable_session(&self, agent_id: &ElementId) -> Option<SessionRecord> {
        let state = self.state().lock();
        state
            .sessions
            .values()
            .filter(|s| s.agent_id == *agent_id && s.is_resumable())
            .max_by(|a, b| {
                (a.started_at, a.id.as_str()).cmp(&(b.started_at, b.id.as_str()))
            })
            .cloned()
    }

    /// Messages of one session in append order, optionally resuming after
    /// a known message id (SSE dedup contract).
    pub fn session_messages(&self, id: &str, after: Option<&str>) -> Vec<MessageRecord> {
        let state = self.state().lock();
        let all = state.session_messages(id);
        match after {
            Some(marker) => match all.iter().position(|m| m.id == marker) {
                Some(pos) => all[pos + 1..].to_vec(),
                None => all.to_vec(),
            },
            None => all.to_vec(),
        }
    }
}
