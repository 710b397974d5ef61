//! Real-time release stream with a reconnecting supervisor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::metrics::{MALFORMED_EVENTS, STREAM_CONNECTIONS};
use crate::release::parse_event;

/// Text frames of one connection. Ends when the connection closes.
pub type FrameStream = BoxStream<'static, Result<String, StreamError>>;

/// Stream transport errors.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Opens connections to the release feed.
///
/// Each call yields a fresh, finite sequence of frames. Reconnecting is the
/// caller's job.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn connect(&self) -> Result<FrameStream, StreamError>;
}

/// Derive the stream URL from the API base: `http` becomes `ws`, `https`
/// becomes `wss`, and `path` is appended.
pub fn stream_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };

    if path.is_empty() || path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// WebSocket feed.
pub struct WsEventSource {
    url: String,
}

impl WsEventSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSource for WsEventSource {
    async fn connect(&self) -> Result<FrameStream, StreamError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;

        let frames = ws_stream.filter_map(|message| {
            let frame = match message {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Stream close frame received");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(StreamError::Transport(e.to_string()))),
            };
            futures::future::ready(frame)
        });

        Ok(frames.boxed())
    }
}

/// Supervises the feed connection and forwards inserts to the dispatcher.
///
/// Reconnects forever after a fixed delay. There is no stop signal; the task
/// lives until the process exits or its handle is aborted.
pub struct StreamIngest {
    source: Arc<dyn EventSource>,
    dispatcher: Arc<Dispatcher>,
    reconnect_delay: Duration,
}

impl StreamIngest {
    pub fn new(
        source: Arc<dyn EventSource>,
        dispatcher: Arc<Dispatcher>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            source,
            dispatcher,
            reconnect_delay,
        }
    }

    /// Run the supervisor on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Connect, consume, wait, repeat.
    pub async fn run(&self) {
        info!("Release stream ingest started");
        loop {
            if let Err(e) = self.run_session().await {
                error!(error = %e, "Release stream connection failed");
            }

            info!(
                delay_secs = self.reconnect_delay.as_secs_f64(),
                "Reconnecting to release stream"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One connection lifetime. Returns the number of frames read.
    pub async fn run_session(&self) -> Result<usize, StreamError> {
        let mut frames = match self.source.connect().await {
            Ok(frames) => frames,
            Err(e) => {
                STREAM_CONNECTIONS.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };
        STREAM_CONNECTIONS.with_label_values(&["connected"]).inc();
        info!("Connected to release stream");

        let mut count = 0;
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(text) => {
                    count += 1;
                    self.handle_frame(&text).await;
                }
                Err(e) => {
                    STREAM_CONNECTIONS.with_label_values(&["closed"]).inc();
                    warn!(error = %e, frames = count, "Release stream errored");
                    return Err(e);
                }
            }
        }

        STREAM_CONNECTIONS.with_label_values(&["closed"]).inc();
        warn!(frames = count, "Release stream closed");
        Ok(count)
    }

    async fn handle_frame(&self, text: &str) {
        let event = match parse_event(text) {
            Ok(event) => event,
            Err(e) => {
                MALFORMED_EVENTS.inc();
                warn!(error = %e, "Dropping malformed stream payload");
                return;
            }
        };

        if event.is_insert() {
            debug!(release = %event.row.name, "Received insert");
        }
        if let Err(e) = self.dispatcher.handle_event(&event, "stream").await {
            error!(release = %event.row.name, error = %e, "Failed to process release");
        }
    }
}
