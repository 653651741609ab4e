use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("connection lost: {0}")]
    Receive(String),
}

/// Data frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary(Vec<u8>),
}

pub type OutboundSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;
pub type InboundStream = Pin<Box<dyn Stream<Item = Result<Inbound, TransportError>> + Send>>;

/// An open duplex channel. The stream ends when the peer closes.
pub struct Connection {
    pub outbound: OutboundSink,
    pub inbound: InboundStream,
}

pub trait Transport: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'static, Result<Connection, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn connect(&self) -> BoxFuture<'static, Result<Connection, TransportError>> {
        (**self).connect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a channel's pump task reports back to its owner.
#[derive(Debug)]
pub enum TransportEvent {
    Opened,
    Frame(Inbound),
    Error(TransportError),
    Closed,
}

pub type EventSender = mpsc::UnboundedSender<(ChannelId, TransportEvent)>;
pub type EventReceiver = mpsc::UnboundedReceiver<(ChannelId, TransportEvent)>;

/// Owned handle to one channel. Dropping it closes the channel.
pub struct ChannelHandle {
    id: ChannelId,
    close_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.close_tx.as_ref().is_some_and(|tx| !tx.is_closed()) && !self.task.is_finished()
    }

    /// Asks the pump to close the transport. No further events are reported
    /// for this channel once the pump observes the request.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            debug!(channel = %self.id, "closing channel");
            let _ = tx.send(());
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens a channel and sends `request` as soon as the transport is up.
///
/// Must be called from within a tokio runtime.
pub fn open<T: Transport + ?Sized>(
    transport: &T,
    id: ChannelId,
    request: String,
    events: EventSender,
) -> ChannelHandle {
    let (close_tx, close_rx) = oneshot::channel();
    let connect = transport.connect();
    let task = tokio::spawn(pump(connect, id, request, events, close_rx));
    ChannelHandle {
        id,
        close_tx: Some(close_tx),
        task,
    }
}

async fn pump(
    connect: BoxFuture<'static, Result<Connection, TransportError>>,
    id: ChannelId,
    request: String,
    events: EventSender,
    mut close_rx: oneshot::Receiver<()>,
) {
    let Connection {
        mut outbound,
        mut inbound,
    } = tokio::select! {
        _ = &mut close_rx => return,
        result = connect => match result {
            Ok(connection) => connection,
            Err(err) => {
                let _ = events.send((id, TransportEvent::Error(err)));
                return;
            }
        },
    };
    let _ = events.send((id, TransportEvent::Opened));
    if let Err(err) = outbound.send(request).await {
        let _ = events.send((id, TransportEvent::Error(err)));
        return;
    }
    loop {
        tokio::select! {
            _ = &mut close_rx => {
                let _ = outbound.close().await;
                return;
            }
            next = inbound.next() => match next {
                Some(Ok(frame)) => {
                    let _ = events.send((id, TransportEvent::Frame(frame)));
                }
                Some(Err(err)) => {
                    let _ = events.send((id, TransportEvent::Error(err)));
                    return;
                }
                None => {
                    let _ = events.send((id, TransportEvent::Closed));
                    return;
                }
            },
        }
    }
}
