//! Server-sent events.
//!
//! Each `GET /api/realtime` connection subscribes to the [`RealtimeHub`] and receives the events whose topic it asked
//! for, framed as `event: <type>` / `data: <json>`. A comment line is sent every [`KEEP_ALIVE`] so that proxies do not
//! close idle connections.
use std::time::Duration;

use bytes::Bytes;
use cafe_engine::events::{RealtimeEvent, RealtimeHub, TopicFilter};
use futures::{stream, Stream};
use log::*;
use tokio::{
    sync::broadcast::Receiver,
    time::{interval_at, Instant, Interval},
};

pub const KEEP_ALIVE: Duration = Duration::from_secs(15);
const KEEP_ALIVE_FRAME: &str = ": keep-alive\n\n";

pub fn sse_frame(event: &RealtimeEvent) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string(event)?;
    Ok(format!("event: {}\ndata: {data}\n\n", event.event_name()))
}

struct StreamState {
    receiver: Receiver<RealtimeEvent>,
    filter: TopicFilter,
    ticker: Interval,
}

/// Turns a hub subscription into an endless stream of SSE frames. The stream ends when the hub goes away.
pub fn event_stream(
    receiver: Receiver<RealtimeEvent>,
    filter: TopicFilter,
    keep_alive: Duration,
) -> impl Stream<Item = Result<Bytes, actix_web::Error>> {
    let ticker = interval_at(Instant::now() + keep_alive, keep_alive);
    let state = StreamState { receiver, filter, ticker };
    stream::unfold(state, |mut state| async move {
        loop {
            tokio::select! {
                event = RealtimeHub::next_event(&mut state.receiver) => {
                    let event = event?;
                    if !state.filter.matches(&event) {
                        continue;
                    }
                    match sse_frame(&event) {
                        Ok(frame) => return Some((Ok(Bytes::from(frame)), state)),
                        Err(e) => warn!("📬️ Could not serialize {} event. {e}", event.event_name()),
                    }
                },
                _ = state.ticker.tick() => {
                    return Some((Ok(Bytes::from_static(KEEP_ALIVE_FRAME.as_bytes())), state));
                },
            }
        }
    })
}
