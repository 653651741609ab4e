//! One WebSocket connection carries exactly one analysis job.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, error, info, warn};

use sentiflow_core::{
    AnalyzeError, AnalyzeRequest, BatchAnalyzer, ProgressEvent, ProgressSink, SinkClosed,
};

use crate::{AppState, CLASSIFIER_UNAVAILABLE};

/// Events buffered between the analyzer thread and the socket writer.
const EVENT_BUFFER: usize = 16;

type Sender = SplitSink<WebSocket, Message>;

pub(crate) async fn analyze_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| run_job(socket, state))
}

async fn run_job(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let Some(classifier) = state.classifier.clone() else {
        warn!("rejecting analysis job: classifier not loaded");
        finish(&mut sender, Some(ProgressEvent::error(CLASSIFIER_UNAVAILABLE))).await;
        return;
    };
    let request = match read_request(&mut receiver).await {
        Some(Ok(request)) => request,
        Some(Err(message)) => {
            warn!(error = %message, "rejecting malformed analysis request");
            finish(&mut sender, Some(ProgressEvent::error(message))).await;
            return;
        }
        None => {
            debug!("client left before sending a request");
            return;
        }
    };

    let column = request.column_name.clone();
    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let analyzer_config = state.analyzer.clone();
    let job = task::spawn_blocking(move || {
        let analyzer = BatchAnalyzer::new(classifier, analyzer_config);
        let mut sink = ChannelSink { tx };
        analyzer.run(&request, &mut sink)
    });

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    if let Err(err) = send_event(&mut sender, &event).await {
                        debug!(error = %err, "socket write failed");
                        break;
                    }
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    debug!(%column, "client closed the channel mid-job");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }
    // Dropping the receiver makes the analyzer's next emit fail.
    drop(rx);

    match job.await {
        Ok(Ok(rows)) => info!(%column, rows, "analysis job finished"),
        Ok(Err(AnalyzeError::ChannelClosed)) => info!(%column, "analysis job abandoned by client"),
        Ok(Err(err)) => warn!(%column, error = %err, "analysis job failed"),
        Err(err) => error!("internal_error" = %err, "analysis task panicked"),
    }
    finish(&mut sender, None).await;
}

/// Waits for the first data frame and decodes it as a request.
///
/// `None` means the client went away first; `Some(Err(_))` carries the
/// message to report back.
async fn read_request(
    receiver: &mut SplitStream<WebSocket>,
) -> Option<Result<AnalyzeRequest, String>> {
    while let Some(message) = receiver.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => return Some(Err("request frame is not valid UTF-8".to_string())),
            },
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) | Err(_) => return None,
        };
        return Some(AnalyzeRequest::decode(&text).map_err(|err| err.to_string()));
    }
    None
}

async fn send_event(sender: &mut Sender, event: &ProgressEvent) -> anyhow::Result<()> {
    let frame = event.to_frame()?;
    sender.send(Message::Text(frame)).await?;
    Ok(())
}

async fn finish(sender: &mut Sender, last: Option<ProgressEvent>) {
    if let Some(event) = last {
        if let Err(err) = send_event(sender, &event).await {
            debug!(error = %err, "could not deliver final event");
        }
    }
    let _ = sender.close().await;
}

struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink for ChannelSink {
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkClosed> {
        self.tx.blocking_send(event).map_err(|_| SinkClosed)
    }
}
