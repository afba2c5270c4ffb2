//! Server-Sent Events framing for job streams
//!
//! Parsing is left to `eventsource-stream`; this module keeps only the `data`
//! payloads and maps stream failures into `SdkError`.

use crate::error::{Result, SdkError};
use eventsource_stream::{EventStreamError, Eventsource};
use futures::future;
use futures::stream::{BoxStream, Stream};
use futures::{StreamExt, TryStreamExt};

/// Turn a raw body into the `data` payload of each event.
///
/// Comments (keep-alives) and events without data are skipped.
pub(crate) fn data_frames<S, B, E>(body: S) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<SdkError> + Send + 'static,
{
    body.eventsource()
        .map_ok(|event| event.data)
        .map_err(stream_error)
        .try_filter(|data| future::ready(!data.is_empty()))
        .boxed()
}

fn stream_error<E: Into<SdkError>>(e: EventStreamError<E>) -> SdkError {
    match e {
        EventStreamError::Transport(e) => e.into(),
        EventStreamError::Utf8(e) => {
            SdkError::Transport(format!("invalid UTF-8 in event stream: {}", e))
        }
        EventStreamError::Parser(e) => {
            SdkError::Transport(format!("malformed event stream: {}", e))
        }
    }
}
