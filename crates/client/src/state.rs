use std::fmt;

use sentiflow_core::ProgressEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Submit,
    Reset,
    Opened,
    Info,
    Progress,
    Complete,
    ServerError,
    ProtocolViolation,
    TransportError,
    TransportClosed,
}

impl Signal {
    pub fn from_event(event: &ProgressEvent) -> Self {
        match event {
            ProgressEvent::Info { .. } => Signal::Info,
            ProgressEvent::Progress { .. } => Signal::Progress,
            ProgressEvent::Complete { .. } => Signal::Complete,
            ProgressEvent::Error { .. } => Signal::ServerError,
        }
    }
}

/// Next state given the state immediately before `signal`.
///
/// `Submit` and `Reset` apply from anywhere. Every other signal is ignored in
/// `Idle` (nothing in flight) and in the terminal states, so a late message
/// can never reopen a finished job.
pub fn transition(state: ConnectionState, signal: Signal) -> ConnectionState {
    use ConnectionState::*;
    match (state, signal) {
        (_, Signal::Submit) => Connecting,
        (_, Signal::Reset) => Idle,
        (Idle | Closed | Errored, _) => state,
        (Connecting | Connected, Signal::Opened | Signal::Info | Signal::Progress) => Connected,
        (Connecting | Connected, Signal::Complete) => Closed,
        (
            Connecting | Connected,
            Signal::ServerError | Signal::ProtocolViolation | Signal::TransportError,
        ) => Errored,
        (Connecting | Connected, Signal::TransportClosed) => Closed,
    }
}
