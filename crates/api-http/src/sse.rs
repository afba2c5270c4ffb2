// Observer stream -> SSE response

use axum::http::{header, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use batchline_core::application::ObserverStream;
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

/// Turn an observer's receiving half into an event stream.
///
/// The response body owns the receiver: when the client goes away the body is
/// dropped, which the observer side sees as `closed()`.
pub fn sse_response(stream: ObserverStream, keep_alive: Duration) -> Response {
    let events = stream.map(|frame| Ok::<_, Infallible>(Event::default().data(frame)));

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::new().interval(keep_alive).text("keep-alive"))
        .into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    // Only meaningful to HTTP/1.1 clients; hyper drops it on HTTP/2
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}
