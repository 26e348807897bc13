use crate::state::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::StreamExt;

/// Workstation UI events. A lagging client gets a `resync` event and
/// reloads its fragments.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("📡 SSE connection established");

    let receiver = state.sessions.read().await.subscribe();

    let stream = receiver.map(|event| {
        let sse_event = match event {
            Ok(event) => Event::default()
                .event(event.event_type())
                .data(event.to_sse_data()),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("SSE client lagged, skipped {} events", skipped);
                Event::default().event("resync").data(skipped.to_string())
            }
        };
        Ok(sse_event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
