//! WebSocket message framing.

use futures_util::stream::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// Turn raw WebSocket messages into text envelopes.
///
/// Text frames pass through and binary frames are read as UTF-8. Control
/// frames are skipped. The stream ends at a `Close` frame, or right after the
/// first error.
pub fn payloads<S, E>(messages: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<Message, E>>,
{
    async_stream::stream! {
        futures_util::pin_mut!(messages);
        while let Some(item) = messages.next().await {
            match item {
                Ok(Message::Text(text)) => yield Ok(text),
                Ok(Message::Binary(bytes)) => {
                    yield Ok(String::from_utf8_lossy(&bytes).into_owned())
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Push channel close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    }
}
