//! Scripted release feed.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::ingest::{EventSource, FrameStream, StreamError};

/// What one `connect` call produces.
#[derive(Debug, Clone)]
pub enum Session {
    /// Connection succeeds, yields these frames, then closes.
    Frames(Vec<String>),
    /// Connection succeeds, yields these frames, then errors.
    FramesThenError(Vec<String>, StreamError),
    /// Connection fails.
    Refused(StreamError),
}

/// `EventSource` that plays back scripted sessions in order.
///
/// Once the script runs out, connections succeed and stay open without
/// yielding anything.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEventSource {
    sessions: Arc<Mutex<VecDeque<Session>>>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedEventSource {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions.into())),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `connect` calls so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn connect(&self) -> Result<FrameStream, StreamError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.sessions.lock().unwrap().pop_front();

        match next {
            Some(Session::Frames(frames)) => {
                Ok(futures::stream::iter(frames.into_iter().map(Ok)).boxed())
            }
            Some(Session::FramesThenError(frames, error)) => {
                let items = frames
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error)));
                Ok(futures::stream::iter(items).boxed())
            }
            Some(Session::Refused(error)) => Err(error),
            None => Ok(futures::stream::pending().boxed()),
        }
    }
}
