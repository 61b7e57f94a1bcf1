//! Remote session management.
//!
//! Drives the request/response cycle against the command service and feeds
//! decoded output into the grid. Each request runs on a one-shot worker
//! thread that reports back over a channel; the main loop polls the
//! channel every frame, so the paint cadence is never blocked.
//!
//! At most one request is outstanding at any time. Responses are fully
//! applied to the grid before the next request is issued, which makes the
//! terminal output order deterministic regardless of frame timing.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use super::grid::{Color, Grid};
use super::protocol::{
    decode_reply, CommandRequest, Endpoint, ServiceReply, CMD_INPUT, CMD_NEXT, CMD_RESET,
};

/// Fixed prefix of the interactive prompt line.
pub const PROMPT_PREFIX: &str = "> ";

#[derive(Error, Debug)]
pub enum SessionError {
    /// No usable endpoint was supplied by the host. Fatal for the session;
    /// the grid still renders the diagnostic.
    #[error("endpoint not configured: {0}")]
    Configuration(String),

    /// Network-level failure reaching the service.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered, but not with anything usable.
    #[error("service error: {0}")]
    Protocol(String),
}

/// Blocking request transport. Invoked on a worker thread, one call per
/// request; exactly one response is expected per request.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, endpoint: &Endpoint, request: &CommandRequest) -> Result<String, SessionError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Not started, or parked after a failed boot.
    Idle,
    /// A request is in flight (or a timed boot pull is pending).
    AwaitingResponse,
    /// The prompt is live and keystrokes are accepted.
    AcceptingInput,
}

/// What the in-flight request was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RequestKind {
    /// Boot: clear remote-side state before the message replay.
    BootReset,
    /// Boot: pull the next message of the replay.
    BootPull,
    /// A submitted user command.
    Interactive,
}

struct InFlight {
    kind: RequestKind,
    rx: Receiver<Result<String, SessionError>>,
}

/// The async protocol client.
pub struct RemoteSession {
    endpoint_url: Option<String>,
    endpoint: Option<Endpoint>,
    transport: Arc<dyn Transport>,
    state: SessionState,
    in_flight: Option<InFlight>,
    /// When the next boot pull fires; the inter-pull delay is pacing only.
    next_pull_at: Option<Instant>,
    pull_interval: Duration,
}

impl RemoteSession {
    pub fn new(
        endpoint_url: Option<String>,
        transport: Arc<dyn Transport>,
        pull_interval: Duration,
    ) -> Self {
        Self {
            endpoint_url,
            endpoint: None,
            transport,
            state: SessionState::Idle,
            in_flight: None,
            next_pull_at: None,
            pull_interval,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Boot the session: validate the endpoint, reset remote-side state,
    /// then replay the boot message stream. A missing or malformed
    /// endpoint writes a red diagnostic and leaves the session idle.
    pub fn start(&mut self, grid: &mut Grid) {
        grid.clear_screen();
        let Some(url) = self.endpoint_url.clone() else {
            error!("no service endpoint configured");
            grid.write_line("error: service endpoint not configured", Color::Red);
            grid.write_line(
                "set `endpoint` in ~/.retroterm/config.toml or RETROTERM_ENDPOINT",
                Color::Red,
            );
            return;
        };
        match Endpoint::parse(&url) {
            Ok(endpoint) => {
                info!(base = %endpoint.base, "starting session");
                self.endpoint = Some(endpoint);
                self.issue(RequestKind::BootReset, CommandRequest::new(CMD_RESET));
            }
            Err(e) => {
                error!("invalid endpoint: {e}");
                grid.write_line(&format!("error: {e}"), Color::Red);
            }
        }
    }

    /// Poll for a completed response and apply it to the grid. Also fires
    /// the next boot pull once its delay has elapsed. Non-blocking; called
    /// once per frame. Returns true if the grid changed.
    pub fn poll(&mut self, grid: &mut Grid) -> bool {
        if self.in_flight.is_none() {
            if let Some(at) = self.next_pull_at {
                if Instant::now() >= at {
                    self.next_pull_at = None;
                    self.issue(RequestKind::BootPull, CommandRequest::new(CMD_NEXT));
                }
            }
        }
        let Some(in_flight) = &self.in_flight else {
            return false;
        };
        let (kind, result) = match in_flight.rx.try_recv() {
            Ok(result) => (in_flight.kind, result),
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => (
                in_flight.kind,
                Err(SessionError::Transport("request worker vanished".into())),
            ),
        };
        self.in_flight = None;
        self.handle_reply(kind, result, grid);
        true
    }

    /// Submit a user command. Valid only while the prompt is live: the
    /// command is echoed, the request fired, and the prompt re-rendered
    /// when the response lands.
    pub fn submit_command(&mut self, text: &str, grid: &mut Grid) -> bool {
        if self.state != SessionState::AcceptingInput {
            return false;
        }
        grid.write_line(&format!("{PROMPT_PREFIX}{text}"), Color::Green);
        self.issue(
            RequestKind::Interactive,
            CommandRequest::with_arg(CMD_INPUT, text),
        );
        true
    }

    fn issue(&mut self, kind: RequestKind, request: CommandRequest) {
        if self.in_flight.is_some() {
            // Exactly one request may be outstanding.
            warn!(?kind, "request dropped: another request is in flight");
            return;
        }
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        thread::spawn(move || {
            let _ = tx.send(transport.send(&endpoint, &request));
        });
        self.in_flight = Some(InFlight { kind, rx });
        self.state = SessionState::AwaitingResponse;
    }

    fn handle_reply(
        &mut self,
        kind: RequestKind,
        result: Result<String, SessionError>,
        grid: &mut Grid,
    ) {
        let reply = match result.and_then(|body| decode_reply(&body)) {
            Ok(reply) => reply,
            Err(e) => return self.handle_failure(kind, e, grid),
        };
        match (kind, reply) {
            // The reset ack may carry banner lines; the pull loop begins
            // regardless of what it contained.
            (RequestKind::BootReset, reply) => {
                if let ServiceReply::Messages(messages) = reply {
                    self.write_messages(&messages, grid);
                }
                self.schedule_pull();
            }
            (RequestKind::BootPull, ServiceReply::Messages(messages)) if !messages.is_empty() => {
                self.write_messages(&messages, grid);
                self.schedule_pull();
            }
            // Sentinel or an empty batch: the boot stream has ended.
            (RequestKind::BootPull, _) => self.enter_prompt(grid),
            (RequestKind::Interactive, ServiceReply::Messages(messages)) => {
                self.write_messages(&messages, grid);
                self.enter_prompt(grid);
            }
            (RequestKind::Interactive, ServiceReply::Done) => self.enter_prompt(grid),
        }
    }

    fn handle_failure(&mut self, kind: RequestKind, err: SessionError, grid: &mut Grid) {
        error!(?kind, "request failed: {err}");
        grid.write_line(&format!("error: {err}"), Color::Red);
        match kind {
            // Boot failures end the boot attempt; no automatic retry.
            RequestKind::BootReset | RequestKind::BootPull => {
                self.next_pull_at = None;
                self.state = SessionState::Idle;
            }
            // Interactive failures hand control back so the user can retype.
            RequestKind::Interactive => self.enter_prompt(grid),
        }
    }

    fn write_messages(&self, messages: &[String], grid: &mut Grid) {
        for message in messages {
            grid.write_line(message, Color::Green);
        }
    }

    fn schedule_pull(&mut self) {
        self.next_pull_at = Some(Instant::now() + self.pull_interval);
        self.state = SessionState::AwaitingResponse;
    }

    fn enter_prompt(&mut self, grid: &mut Grid) {
        self.state = SessionState::AcceptingInput;
        grid.draw_prompt(PROMPT_PREFIX, "", Color::Green);
    }

    #[cfg(test)]
    fn is_settled(&self) -> bool {
        self.in_flight.is_none() && self.next_pull_at.is_none()
    }
}
