//! Server-sent event streams backed by the engine's connection registry.
use std::{convert::Infallible, sync::Arc};

use actix_web::HttpResponse;
use bytes::Bytes;
use famto_engine::notifications::{ConnectionGuard, InMemoryConnectionRegistry, RealtimeMessage, RealtimeSender};
use futures::stream;
use tokio::sync::mpsc;

pub type Registry = InMemoryConnectionRegistry<RealtimeSender>;

/// Events queued for a slow client before new ones are dropped.
const CONNECTION_BUFFER: usize = 64;

/// Registers a connection for `user_id` and returns a response that streams its events. The connection is removed
/// from the registry when the stream is dropped, i.e. when the client disconnects. A second connection for the same
/// user replaces the first, whose stream then ends.
pub fn event_stream(registry: Arc<Registry>, user_id: &str) -> HttpResponse {
    let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
    let guard = ConnectionGuard::register(registry, user_id, tx);
    let events = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let message = rx.recv().await?;
        Some((Ok::<_, Infallible>(sse_frame(&message)), (rx, guard)))
    });
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events)
}

pub fn sse_frame(message: &RealtimeMessage) -> Bytes {
    Bytes::from(format!("event: {}\ndata: {}\n\n", message.event, message.payload))
}
