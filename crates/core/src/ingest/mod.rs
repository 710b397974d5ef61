//! Release ingest: the real-time stream and the fallback poll scheduler.
//!
//! Both feed the same `Dispatcher`. Neither orders its deliveries relative to
//! the other; the per-query watermark is what prevents double notification.

mod poller;
mod stream;

pub use poller::{
    effective_interval_secs, per_request_delay, required_interval_secs, PollError, PollScheduler,
    TickSummary,
};
pub use stream::{stream_url, EventSource, FrameStream, StreamError, StreamIngest, WsEventSource};
