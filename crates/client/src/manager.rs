use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sentiflow_core::{AnalyzeRequest, ProgressEvent, ProtocolError, ResultSet};

use crate::state::{transition, ConnectionState, Signal};
use crate::transport::{
    self, ChannelHandle, ChannelId, EventReceiver, EventSender, Inbound, Transport,
    TransportEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server reported an `error` event.
    Server,
    /// The server sent something outside the protocol.
    Protocol,
    /// The channel could not be opened or dropped.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Server => write!(f, "server rejected the job: {}", self.message),
            FailureKind::Protocol => write!(f, "protocol error: {}", self.message),
            FailureKind::Transport => write!(f, "could not reach server: {}", self.message),
        }
    }
}

/// What the presentation layer needs to render the current job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobView {
    pub state: ConnectionState,
    pub channel: Option<ChannelId>,
    pub percent: u8,
    pub message: Option<String>,
    pub failure: Option<JobFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Connected,
    Info(String),
    Progress(u8),
    Completed { rows: usize },
    /// The channel closed without a terminal event.
    Closed,
    Failed(JobFailure),
}

/// Owns at most one analysis channel and folds its events into a
/// [`ConnectionState`].
///
/// Every transition is computed from the state held here at the moment the
/// event is dispatched; pump tasks never read or write it.
pub struct ChannelManager<T> {
    transport: T,
    channel: Option<ChannelHandle>,
    next_id: u64,
    events_tx: EventSender,
    events_rx: EventReceiver,
    view: JobView,
    results: Option<ResultSet>,
}

impl<T: Transport> ChannelManager<T> {
    pub fn new(transport: T) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            channel: None,
            next_id: 0,
            events_tx,
            events_rx,
            view: JobView::default(),
            results: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.view.state
    }

    pub fn view(&self) -> &JobView {
        &self.view
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel.as_ref().is_some_and(ChannelHandle::is_open)
    }

    /// Results delivered by the last `complete` event.
    pub fn take_results(&mut self) -> Option<ResultSet> {
        self.results.take()
    }

    /// Starts a new job, closing any channel still in flight first.
    ///
    /// The request is validated before anything is opened. Must be called
    /// from within a tokio runtime.
    pub fn submit(&mut self, request: &AnalyzeRequest) -> Result<ChannelId, ProtocolError> {
        request.validate()?;
        let frame = request.to_frame()?;
        self.release_channel();
        self.next_id += 1;
        let id = ChannelId(self.next_id);
        self.results = None;
        self.view = JobView {
            state: transition(self.view.state, Signal::Submit),
            channel: Some(id),
            ..JobView::default()
        };
        info!(channel = %id, column = %request.column_name, "submitting analysis job");
        self.channel = Some(transport::open(
            &self.transport,
            id,
            frame,
            self.events_tx.clone(),
        ));
        Ok(id)
    }

    /// Returns to `Idle`, closing any open channel whatever its state.
    pub fn reset(&mut self) {
        self.release_channel();
        self.results = None;
        self.view = JobView {
            state: transition(self.view.state, Signal::Reset),
            ..JobView::default()
        };
    }

    /// Waits for the next meaningful update of the current job.
    ///
    /// Returns `None` once nothing is in flight (idle or terminal).
    pub async fn next_update(&mut self) -> Option<Update> {
        loop {
            if !self.view.state.is_active() {
                return None;
            }
            let (id, event) = self.events_rx.recv().await?;
            if let Some(update) = self.dispatch(id, event) {
                return Some(update);
            }
        }
    }

    fn dispatch(&mut self, id: ChannelId, event: TransportEvent) -> Option<Update> {
        if self.view.channel != Some(id) {
            debug!(channel = %id, "dropping event from superseded channel");
            return None;
        }
        if !self.view.state.is_active() {
            debug!(channel = %id, state = %self.view.state, "ignoring event after terminal state");
            return None;
        }
        match event {
            TransportEvent::Opened => {
                self.advance(Signal::Opened);
                Some(Update::Connected)
            }
            TransportEvent::Frame(Inbound::Text(text)) => match ProgressEvent::decode(&text) {
                Ok(event) => Some(self.apply_event(event)),
                Err(err) => Some(self.fail(
                    Signal::ProtocolViolation,
                    FailureKind::Protocol,
                    err.to_string(),
                )),
            },
            TransportEvent::Frame(Inbound::Binary(_)) => Some(self.fail(
                Signal::ProtocolViolation,
                FailureKind::Protocol,
                "unexpected binary frame".to_string(),
            )),
            TransportEvent::Error(err) => {
                Some(self.fail(Signal::TransportError, FailureKind::Transport, err.to_string()))
            }
            TransportEvent::Closed => {
                self.advance(Signal::TransportClosed);
                self.release_channel();
                warn!(channel = %id, "channel closed before the job finished");
                Some(Update::Closed)
            }
        }
    }

    fn apply_event(&mut self, event: ProgressEvent) -> Update {
        self.advance(Signal::from_event(&event));
        match event {
            ProgressEvent::Info { message } => {
                self.view.message = Some(message.clone());
                Update::Info(message)
            }
            ProgressEvent::Progress { progress } => {
                self.view.percent = self.view.percent.max(progress);
                Update::Progress(progress)
            }
            ProgressEvent::Complete { data } => {
                let rows = data.len();
                self.view.percent = 100;
                self.results = Some(data);
                self.release_channel();
                info!(rows, "analysis job complete");
                Update::Completed { rows }
            }
            ProgressEvent::Error { message } => {
                self.record_failure(FailureKind::Server, message.clone());
                self.release_channel();
                Update::Failed(JobFailure {
                    kind: FailureKind::Server,
                    message,
                })
            }
        }
    }

    fn fail(&mut self, signal: Signal, kind: FailureKind, message: String) -> Update {
        self.advance(signal);
        self.record_failure(kind, message.clone());
        self.release_channel();
        Update::Failed(JobFailure { kind, message })
    }

    fn record_failure(&mut self, kind: FailureKind, message: String) {
        warn!(kind = ?kind, error = %message, "analysis job failed");
        self.view.failure = Some(JobFailure { kind, message });
    }

    fn advance(&mut self, signal: Signal) {
        let next = transition(self.view.state, signal);
        if next != self.view.state {
            debug!(
                from = %self.view.state,
                to = %next,
                signal = ?signal,
                "connection state changed"
            );
        }
        self.view.state = next;
    }

    fn release_channel(&mut self) {
        if let Some(mut handle) = self.channel.take() {
            handle.close();
        }
    }
}
