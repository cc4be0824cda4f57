// SPDX-License-Identifier: MIT

//! Agent session manager.
//!
//! One child process per live session, at most one live session per agent
//! (a per-agent async mutex guards the start/resume/stop sections). Each
//! session owns a [`Publisher`] fanning parsed events out to subscribers;
//! the reader and waiter tasks are the only writers, so per-subscriber
//! order is strict producer order, ending in exactly one exit event.

mod parser;
mod publisher;
mod spawn;

pub use parser::initial_prompt_msg_id;
pub use publisher::{Publisher, SubscriberHandle};
pub use spawn::AgentCommand;

use crate::session::parser::LineParser;
use el_core::{
    AgentEvent, AgentEventKind, Clock, Element, ElementId, EntityType, MessageRecord,
    SessionEvent, SessionId, SessionMode, SessionRecord, SessionStatus, SystemClock,
};
use el_engine::{ElementError, Engine};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("agent already has a live session: {0}")]
    SessionExists(ElementId),

    #[error("no live session: {0}")]
    NoSession(String),

    #[error("no resumable session for agent: {0}")]
    NoResumableSession(ElementId),

    #[error("not an agent entity: {0}")]
    InvalidAgent(String),

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] ElementError),
}

/// Options for `start_session`.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub working_directory: Option<PathBuf>,
    pub worktree: Option<PathBuf>,
    pub initial_prompt: Option<String>,
    pub interactive: bool,
}

/// "Unfinished work present" heuristics input returned by resume.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UwpCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_from: Option<SessionId>,
    pub prior_messages: usize,
}

/// A live stream attachment handed to the SSE layer.
pub struct StreamSubscription {
    pub session_id: SessionId,
    pub agent_id: ElementId,
    /// Cached for the session's lifetime; emitted on every subscribe.
    pub initial_prompt: Option<String>,
    pub receiver: SubscriberHandle,
}

/// Manager tunables, sourced from daemon config.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub agent: AgentCommand,
    pub graceful_stop_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            agent: AgentCommand::default(),
            graceful_stop_timeout: Duration::from_secs(8),
            queue_capacity: 256,
        }
    }
}

#[derive(Clone)]
struct LiveSession {
    session_id: SessionId,
    agent_id: ElementId,
    pid: Option<u32>,
    stdin: Option<Arc<tokio::sync::Mutex<tokio::process::ChildStdin>>>,
    publisher: Arc<Publisher>,
    initial_prompt: Option<String>,
    exited: watch::Receiver<bool>,
    input_seq: Arc<AtomicU64>,
}

#[derive(Default)]
struct Registry {
    by_agent: HashMap<ElementId, SessionId>,
    live: HashMap<SessionId, LiveSession>,
}

pub struct SessionManager<C: Clock = SystemClock> {
    engine: Arc<Engine<C>>,
    settings: SessionSettings,
    registry: Mutex<Registry>,
    agent_locks: Mutex<HashMap<ElementId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<C: Clock + 'static> SessionManager<C> {
    pub fn new(engine: Arc<Engine<C>>, settings: SessionSettings) -> Arc<Self> {
        Arc::new(Self {
            engine,
            settings,
            registry: Mutex::new(Registry::default()),
            agent_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn engine(&self) -> &Arc<Engine<C>> {
        &self.engine
    }

    /// Start a session for the agent entity. Fails with `SessionExists`
    /// while the agent has a live one (invariant: one live session per
    /// agent).
    pub async fn start_session(
        self: &Arc<Self>,
        agent_ref: &str,
        opts: StartOptions,
    ) -> Result<SessionRecord, SessionError> {
        let agent = self.resolve_agent(agent_ref)?;
        let agent_lock = self.agent_lock(agent.id);
        let _guard = agent_lock.lock().await;

        if self.engine.active_session(&agent.id).is_some() {
            return Err(SessionError::SessionExists(agent.id));
        }
        self.launch(agent, opts, None).await
    }

    /// Start a session that resumes a prior conversation. Without an
    /// explicit cookie, the agent's most recent resumable session seeds
    /// it.
    pub async fn resume_session(
        self: &Arc<Self>,
        agent_ref: &str,
        cookie: Option<String>,
        opts: StartOptions,
    ) -> Result<(SessionRecord, UwpCheck), SessionError> {
        let agent = self.resolve_agent(agent_ref)?;
        let agent_lock = self.agent_lock(agent.id);
        let _guard = agent_lock.lock().await;

        if self.engine.active_session(&agent.id).is_some() {
            return Err(SessionError::SessionExists(agent.id));
        }

        let prior = match &cookie {
            Some(c) => self
                .engine
                .sessions(&el_engine::SessionFilter {
                    agent_id: Some(agent.id),
                    ..Default::default()
                })
                .into_iter()
                .find(|s| s.claude_session_id.as_deref() == Some(c.as_str())),
            None => self.engine.most_recent_resumable_session(&agent.id),
        };
        let cookie = match cookie.or_else(|| {
            prior.as_ref().and_then(|p| p.claude_session_id.clone())
        }) {
            Some(c) => c,
            None => return Err(SessionError::NoResumableSession(agent.id)),
        };

        let mut opts = opts;
        if opts.working_directory.is_none() {
            opts.working_directory = prior.as_ref().map(|p| p.working_directory.clone());
        }

        let uwp = UwpCheck {
            resumed_from: prior.as_ref().map(|p| p.id),
            prior_messages: prior
                .as_ref()
                .map(|p| self.engine.session_messages(p.id.as_str(), None).len())
                .unwrap_or(0),
        };
        let record = self.launch(agent, opts, Some(cookie)).await?;
        Ok((record, uwp))
    }

    /// Send an interrupt to the child; no state change of our own.
    pub fn interrupt_session(&self, session_id: &str) -> Result<(), SessionError> {
        let live = self.live(session_id)?;
        if let Some(pid) = live.pid {
            send_signal(pid, Signal::SIGINT);
        }
        Ok(())
    }

    /// Stop a session: graceful sends an interrupt and waits out the
    /// configured timeout before force-killing.
    pub async fn stop_session(
        &self,
        session_id: &str,
        graceful: bool,
        reason: Option<String>,
    ) -> Result<SessionRecord, SessionError> {
        let live = self.live(session_id)?;
        info!(session_id, graceful, reason = reason.as_deref().unwrap_or(""), "stopping session");

        if let Some(mut record) = self.engine.session(session_id) {
            if record.status.can_transition(SessionStatus::Terminating) {
                record.status = SessionStatus::Terminating;
                self.engine.record_session_updated(record)?;
            }
        }

        let mut exited = live.exited.clone();
        if graceful {
            if let Some(pid) = live.pid {
                send_signal(pid, Signal::SIGINT);
            }
            let waited =
                tokio::time::timeout(self.settings.graceful_stop_timeout, exited.wait_for(|v| *v))
                    .await;
            if waited.is_err() {
                warn!(session_id, "graceful stop timed out; killing");
                if let Some(pid) = live.pid {
                    send_signal(pid, Signal::SIGKILL);
                }
            }
        } else if let Some(pid) = live.pid {
            send_signal(pid, Signal::SIGKILL);
        }

        // The waiter finishes the bookkeeping; bound our wait on it.
        let mut exited = live.exited.clone();
        let _ = tokio::time::timeout(Duration::from_secs(10), exited.wait_for(|v| *v)).await;

        self.engine
            .session(session_id)
            .ok_or_else(|| SessionError::NoSession(session_id.to_string()))
    }

    /// Write to the child's stdin; with `is_user_message`, also emit and
    /// persist a synthetic user event.
    pub async fn send_input(
        &self,
        session_id: &str,
        input: &str,
        is_user_message: bool,
    ) -> Result<(), SessionError> {
        let live = self.live(session_id)?;
        let stdin = live
            .stdin
            .clone()
            .ok_or_else(|| SessionError::NoSession(session_id.to_string()))?;
        {
            let mut guard = stdin.lock().await;
            guard.write_all(input.as_bytes()).await?;
            if !input.ends_with('\n') {
                guard.write_all(b"\n").await?;
            }
            guard.flush().await?;
        }

        if is_user_message {
            let n = live.input_seq.fetch_add(1, Ordering::Relaxed) + 1;
            let event = AgentEvent {
                kind: AgentEventKind::User,
                msg_id: format!("user-{}-input-{n}", live.session_id),
                tool: None,
                message: Some(serde_json::Value::String(input.to_string())),
                raw: None,
                timestamp: self.engine.clock().now_utc(),
            };
            live.publisher.publish(SessionEvent::Agent(event.clone()));
            if let Some(msg) =
                MessageRecord::from_agent_event(live.session_id, live.agent_id, &event)
            {
                if let Err(e) = self.engine.append_message(msg) {
                    warn!(session_id, error = %e, "input message persist failed");
                }
            }
        }
        Ok(())
    }

    /// Attach to the agent's live session stream.
    pub fn subscribe(&self, agent_ref: &str) -> Result<StreamSubscription, SessionError> {
        let agent = self.resolve_agent(agent_ref)?;
        let registry = self.registry.lock();
        let session_id = registry
            .by_agent
            .get(&agent.id)
            .copied()
            .ok_or_else(|| SessionError::NoSession(agent_ref.to_string()))?;
        let live = registry
            .live
            .get(&session_id)
            .ok_or_else(|| SessionError::NoSession(agent_ref.to_string()))?;
        Ok(StreamSubscription {
            session_id,
            agent_id: agent.id,
            initial_prompt: live.initial_prompt.clone(),
            receiver: live.publisher.subscribe(),
        })
    }

    pub fn get_active_session(&self, agent_ref: &str) -> Result<SessionRecord, SessionError> {
        let agent = self.resolve_agent(agent_ref)?;
        self.engine
            .active_session(&agent.id)
            .ok_or_else(|| SessionError::NoSession(agent_ref.to_string()))
    }

    /// Gracefully stop every live session (daemon shutdown).
    pub async fn stop_all(&self) {
        let ids: Vec<SessionId> = self.registry.lock().live.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.stop_session(id.as_str(), true, None).await {
                warn!(session_id = %id, error = %e, "stop during shutdown failed");
            }
        }
    }

    fn resolve_agent(&self, agent_ref: &str) -> Result<Element, SessionError> {
        let element = self.engine.get(agent_ref, false)?;
        match element.entity_type() {
            Some(EntityType::Agent) => Ok(element),
            _ => Err(SessionError::InvalidAgent(agent_ref.to_string())),
        }
    }

    fn agent_lock(&self, agent_id: ElementId) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.agent_locks
                .lock()
                .entry(agent_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    fn live(&self, session_id: &str) -> Result<LiveSession, SessionError> {
        self.registry
            .lock()
            .live
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NoSession(session_id.to_string()))
    }

    /// Spawn the child and wire up reader, stderr, and waiter tasks.
    /// Caller holds the per-agent lock.
    async fn launch(
        self: &Arc<Self>,
        agent: Element,
        opts: StartOptions,
        resume_cookie: Option<String>,
    ) -> Result<SessionRecord, SessionError> {
        let now = self.engine.clock().now_utc();
        let mode =
            if opts.interactive { SessionMode::Interactive } else { SessionMode::Headless };
        let working_directory = match opts.working_directory.or_else(|| opts.worktree.clone()) {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let record = SessionRecord {
            id: SessionId::new(),
            agent_id: agent.id,
            mode,
            status: SessionStatus::Starting,
            claude_session_id: None,
            started_at: now,
            terminated_at: None,
            working_directory,
            worktree_path: opts.worktree,
            pid: None,
            exit_code: None,
            exit_signal: None,
            initial_prompt: opts.initial_prompt,
        };
        self.engine.record_session_started(record.clone())?;

        let mut child = match spawn::build_command(
            &self.settings.agent,
            &record,
            resume_cookie.as_deref(),
        )
        .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                self.abort_starting(record).await;
                return Err(SessionError::Spawn(e.to_string()));
            }
        };
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdin = child.stdin.take().map(|s| Arc::new(tokio::sync::Mutex::new(s)));

        // Synthetic initial-prompt message, persisted immediately so late
        // readers of the message log see it too.
        if let Some(prompt) = &record.initial_prompt {
            let msg = MessageRecord {
                id: initial_prompt_msg_id(&record.id),
                session_id: record.id,
                agent_id: record.agent_id,
                kind: AgentEventKind::User,
                content: Some(prompt.clone()),
                tool_name: None,
                tool_input: None,
                tool_output: None,
                timestamp: now,
            };
            if let Err(e) = self.engine.append_message(msg) {
                warn!(session_id = %record.id, error = %e, "initial prompt persist failed");
            }
        }

        let publisher = Arc::new(Publisher::new(self.settings.queue_capacity));
        let (exit_tx, exit_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let live = LiveSession {
            session_id: record.id,
            agent_id: record.agent_id,
            pid,
            stdin,
            publisher: Arc::clone(&publisher),
            initial_prompt: record.initial_prompt.clone(),
            exited: exit_rx,
            input_seq: Arc::new(AtomicU64::new(0)),
        };
        {
            let mut registry = self.registry.lock();
            registry.by_agent.insert(record.agent_id, record.id);
            registry.live.insert(record.id, live.clone());
        }

        let mut running = record.clone();
        running.status = SessionStatus::Running;
        running.pid = pid;
        self.engine.record_session_updated(running.clone())?;
        info!(session_id = %running.id, agent = %agent.title, pid = ?pid, mode = %running.mode, "session started");

        // Interactive children receive the prompt over stdin.
        if mode == SessionMode::Interactive {
            if let (Some(prompt), Some(stdin)) = (&running.initial_prompt, &live.stdin) {
                let stdin = Arc::clone(stdin);
                let prompt = prompt.clone();
                tokio::spawn(async move {
                    let mut guard = stdin.lock().await;
                    let _ = guard.write_all(prompt.as_bytes()).await;
                    let _ = guard.write_all(b"\n").await;
                    let _ = guard.flush().await;
                });
            }
        }

        let reader = stdout.map(|out| {
            self.spawn_reader(running.clone(), out, Arc::clone(&publisher), cancel.clone())
        });
        let err_reader = stderr.map(|err| {
            self.spawn_stderr_reader(running.clone(), err, Arc::clone(&publisher), cancel.clone())
        });
        self.spawn_waiter(child, running.clone(), publisher, exit_tx, cancel, reader, err_reader);

        Ok(running)
    }

    /// Record a session that died before running (spawn failure).
    async fn abort_starting(&self, mut record: SessionRecord) {
        for status in [SessionStatus::Terminating, SessionStatus::Terminated] {
            record.status = status;
            if status == SessionStatus::Terminated {
                record.terminated_at = Some(self.engine.clock().now_utc());
            }
            if let Err(e) = self.engine.record_session_updated(record.clone()) {
                warn!(session_id = %record.id, error = %e, "abort bookkeeping failed");
                return;
            }
        }
        let mut registry = self.registry.lock();
        registry.live.remove(record.id.as_str());
        if registry.by_agent.get(&record.agent_id) == Some(&record.id) {
            registry.by_agent.remove(&record.agent_id);
        }
    }

    fn spawn_reader(
        self: &Arc<Self>,
        record: SessionRecord,
        stdout: tokio::process::ChildStdout,
        publisher: Arc<Publisher>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut parser = LineParser::new(record.id);
            let mut cookie_seen = false;
            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = lines.next_line() => {
                        let line = match next {
                            Ok(Some(line)) => line,
                            _ => break,
                        };
                        let now = manager.engine.clock().now_utc();
                        let Some(parsed) = parser.parse(&line, now) else { continue };

                        // Persist the resumption cookie on first sight only.
                        if !cookie_seen {
                            if let Some(cookie) = &parsed.cookie {
                                cookie_seen = true;
                                manager.persist_cookie(record.id, cookie.clone());
                            }
                        }

                        publisher.publish(SessionEvent::Agent(parsed.event.clone()));

                        // Persistence is off the delivery path: subscribers
                        // already have the event by the time we hit the WAL.
                        if let Some(msg) = MessageRecord::from_agent_event(
                            record.id,
                            record.agent_id,
                            &parsed.event,
                        ) {
                            if let Err(e) = manager.engine.append_message(msg) {
                                warn!(session_id = %record.id, error = %e, "message persist failed");
                            }
                        }
                    }
                }
            }
        })
    }

    fn spawn_stderr_reader(
        self: &Arc<Self>,
        record: SessionRecord,
        stderr: tokio::process::ChildStderr,
        publisher: Arc<Publisher>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut seq = 0u64;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = lines.next_line() => {
                        let line = match next {
                            Ok(Some(line)) => line,
                            _ => break,
                        };
                        if line.trim().is_empty() {
                            continue;
                        }
                        seq += 1;
                        let event = AgentEvent {
                            kind: AgentEventKind::Error,
                            msg_id: format!("error-{}-stderr-{seq}", record.id),
                            tool: None,
                            message: Some(serde_json::Value::String(line)),
                            raw: None,
                            timestamp: manager.engine.clock().now_utc(),
                        };
                        publisher.publish(SessionEvent::Agent(event.clone()));
                        if let Some(msg) =
                            MessageRecord::from_agent_event(record.id, record.agent_id, &event)
                        {
                            let _ = manager.engine.append_message(msg);
                        }
                    }
                }
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_waiter(
        self: &Arc<Self>,
        mut child: tokio::process::Child,
        record: SessionRecord,
        publisher: Arc<Publisher>,
        exit_tx: watch::Sender<bool>,
        cancel: CancellationToken,
        reader: Option<JoinHandle<()>>,
        err_reader: Option<JoinHandle<()>>,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let status = child.wait().await;
            let (code, signal) = match &status {
                Ok(st) => (st.code(), st.signal()),
                Err(_) => (None, None),
            };

            // Let the readers drain the pipes so the exit event is truly
            // last; EOF lands promptly once the child is gone.
            for handle in [reader, err_reader].into_iter().flatten() {
                let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
            }

            manager.finish_session(&record, code, signal);
            publisher.close(code, signal);
            let _ = exit_tx.send(true);
            cancel.cancel();
            info!(session_id = %record.id, code = ?code, signal = ?signal, "session exited");
        });
    }

    /// Final record transitions and registry cleanup after child exit.
    fn finish_session(&self, record: &SessionRecord, code: Option<i32>, signal: Option<i32>) {
        if let Some(mut current) = self.engine.session(record.id.as_str()) {
            if current.status.can_transition(SessionStatus::Terminating) {
                current.status = SessionStatus::Terminating;
                if let Err(e) = self.engine.record_session_updated(current.clone()) {
                    warn!(session_id = %record.id, error = %e, "terminating update failed");
                }
            }
            current.status = SessionStatus::Terminated;
            current.terminated_at = Some(self.engine.clock().now_utc());
            current.exit_code = code;
            current.exit_signal = signal;
            if let Err(e) = self.engine.record_session_updated(current) {
                warn!(session_id = %record.id, error = %e, "terminated update failed");
            }
        }

        let mut registry = self.registry.lock();
        registry.live.remove(record.id.as_str());
        if registry.by_agent.get(&record.agent_id) == Some(&record.id) {
            registry.by_agent.remove(&record.agent_id);
        }
    }

    fn persist_cookie(&self, session_id: SessionId, cookie: String) {
        let Some(mut record) = self.engine.session(session_id.as_str()) else {
            return;
        };
        if record.claude_session_id.is_some() {
            return;
        }
        record.claude_session_id = Some(cookie);
        if let Err(e) = self.engine.record_session_updated(record) {
            warn!(session_id = %session_id, error = %e, "cookie persist failed");
        }
    }
}

fn send_signal(pid: u32, signal: Signal) {
    if let Err(e) = kill(Pid::from_raw(pid as i32), signal) {
        warn!(pid, signal = %signal, error = %e, "signal delivery failed");
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
