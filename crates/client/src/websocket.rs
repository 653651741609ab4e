use futures::future::{self, BoxFuture};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;

use crate::transport::{Connection, Inbound, Transport, TransportError};

pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws/analyze/";

#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    fn connect(&self) -> BoxFuture<'static, Result<Connection, TransportError>> {
        let url = self.url.clone();
        Box::pin(async move {
            let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|err| TransportError::Connect(err.to_string()))?;
            debug!(%url, "websocket connected");
            let (write, read) = socket.split();
            let outbound = write
                .with(|text: String| future::ready(Ok::<_, WsError>(Message::Text(text))))
                .sink_map_err(|err| TransportError::Send(err.to_string()));
            let inbound = read.filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(Ok(Inbound::Text(text))),
                    Ok(Message::Binary(bytes)) => Some(Ok(Inbound::Binary(bytes))),
                    Ok(_) => None,
                    Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => None,
                    Err(err) => Some(Err(TransportError::Receive(err.to_string()))),
                })
            });
            Ok(Connection {
                outbound: Box::pin(outbound),
                inbound: Box::pin(inbound),
            })
        })
    }
}
