mod manager;
pub mod memory;
mod state;
mod transport;
mod websocket;

pub use manager::{ChannelManager, FailureKind, JobFailure, JobView, Update};
pub use state::{transition, ConnectionState, Signal};
pub use transport::{
    open, ChannelHandle, ChannelId, Connection, Inbound, InboundStream, OutboundSink, Transport,
    TransportError, TransportEvent,
};
pub use websocket::{WebSocketTransport, DEFAULT_WS_URL};
