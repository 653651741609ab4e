//! In-process transport. Each `connect` hands the peer side to a
//! [`MemoryListener`], which tests (or an embedding host) drive directly.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::channel::mpsc;
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};

use sentiflow_core::ProgressEvent;

use crate::transport::{Connection, Inbound, Transport, TransportError};

pub struct MemoryTransport {
    accept_tx: mpsc::UnboundedSender<ServerEnd>,
    refusals: Mutex<VecDeque<String>>,
}

pub struct MemoryListener {
    accept_rx: mpsc::UnboundedReceiver<ServerEnd>,
}

pub fn memory_transport() -> (MemoryTransport, MemoryListener) {
    let (accept_tx, accept_rx) = mpsc::unbounded();
    (
        MemoryTransport {
            accept_tx,
            refusals: Mutex::new(VecDeque::new()),
        },
        MemoryListener { accept_rx },
    )
}

impl MemoryTransport {
    /// Makes the next `connect` fail with `reason`.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        if let Ok(mut refusals) = self.refusals.lock() {
            refusals.push_back(reason.into());
        }
    }
}

impl Transport for MemoryTransport {
    fn connect(&self) -> BoxFuture<'static, Result<Connection, TransportError>> {
        let refusal = self
            .refusals
            .lock()
            .ok()
            .and_then(|mut refusals| refusals.pop_front());
        let accept_tx = self.accept_tx.clone();
        Box::pin(async move {
            if let Some(reason) = refusal {
                return Err(TransportError::Connect(reason));
            }
            let (client_tx, server_rx) = mpsc::unbounded::<String>();
            let (server_tx, client_rx) = mpsc::unbounded::<Result<Inbound, TransportError>>();
            accept_tx
                .unbounded_send(ServerEnd {
                    inbound: server_rx,
                    outbound: Some(server_tx),
                })
                .map_err(|_| TransportError::Connect("listener dropped".to_string()))?;
            Ok(Connection {
                outbound: Box::pin(
                    client_tx.sink_map_err(|err| TransportError::Send(err.to_string())),
                ),
                inbound: Box::pin(client_rx),
            })
        })
    }
}

impl MemoryListener {
    pub async fn accept(&mut self) -> Option<ServerEnd> {
        self.accept_rx.next().await
    }
}

/// Server side of one in-memory channel.
pub struct ServerEnd {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: Option<mpsc::UnboundedSender<Result<Inbound, TransportError>>>,
}

impl ServerEnd {
    /// Next frame sent by the client, `None` once the client closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.next().await
    }

    /// Returns false when the client side is gone.
    pub fn send(&self, event: &ProgressEvent) -> bool {
        match event.to_frame() {
            Ok(frame) => self.send_raw(Inbound::Text(frame)),
            Err(_) => false,
        }
    }

    pub fn send_raw(&self, frame: Inbound) -> bool {
        self.push(Ok(frame))
    }

    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.push(Err(TransportError::Receive(reason.into())))
    }

    /// Ends the client's inbound stream.
    pub fn close(&mut self) {
        self.outbound = None;
    }

    /// Resolves once the client has closed its sending half.
    pub async fn closed(&mut self) {
        while self.inbound.next().await.is_some() {}
    }

    fn push(&self, item: Result<Inbound, TransportError>) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.unbounded_send(item).is_ok())
    }
}
