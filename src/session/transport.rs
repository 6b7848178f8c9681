//! Transport seams for a streaming session.
//!
//! A session reads frame messages from a [`FrameSource`] and writes JSON
//! replies to a [`ReplySink`]. WebSocket or HTTP plumbing lives outside the
//! crate; [`channel_transport`] gives an in-process pair.

use crate::error::{Result, SignscribeError};
use tokio::sync::mpsc;

/// Inbound side of a client connection.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Next frame message, or `None` once the client has disconnected.
    async fn next_frame(&mut self) -> Result<Option<String>>;
}

/// Outbound side of a client connection. Shared by both session activities.
#[async_trait::async_trait]
pub trait ReplySink: Send + Sync {
    /// Delivers one reply. An error means the client is gone.
    async fn send_text(&self, text: String) -> Result<()>;
}

/// Frame source backed by a tokio channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

#[async_trait::async_trait]
impl FrameSource for ChannelSource {
    async fn next_frame(&mut self) -> Result<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

/// Reply sink backed by a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

#[async_trait::async_trait]
impl ReplySink for ChannelSink {
    async fn send_text(&self, text: String) -> Result<()> {
        self.tx.send(text).await.map_err(|_| SignscribeError::Transport {
            message: "client disconnected".to_string(),
        })
    }
}

/// The client's half of an in-process transport.
#[derive(Debug)]
pub struct ClientEnd {
    frames: Option<mpsc::Sender<String>>,
    replies: mpsc::Receiver<String>,
}

impl ClientEnd {
    /// Sends one frame message to the session.
    pub async fn send_frame(&self, message: impl Into<String>) -> Result<()> {
        let Some(frames) = &self.frames else {
            return Err(SignscribeError::Transport {
                message: "client already disconnected".to_string(),
            });
        };
        frames.send(message.into()).await.map_err(|_| SignscribeError::Transport {
            message: "session closed".to_string(),
        })
    }

    /// Next reply from the session; `None` after the session dropped its sink.
    pub async fn recv_reply(&mut self) -> Option<String> {
        self.replies.recv().await
    }

    /// Reply already queued, without waiting.
    pub fn try_recv_reply(&mut self) -> Option<String> {
        self.replies.try_recv().ok()
    }

    /// Closes the inbound stream. The session sees `None` from `next_frame`
    /// once queued frames are drained.
    pub fn disconnect(&mut self) {
        self.frames = None;
    }
}

/// Creates a connected in-process transport with `buffer` slots per direction.
pub fn channel_transport(buffer: usize) -> (ClientEnd, ChannelSource, ChannelSink) {
    let buffer = buffer.max(1);
    let (frame_tx, frame_rx) = mpsc::channel(buffer);
    let (reply_tx, reply_rx) = mpsc::channel(buffer);
    (
        ClientEnd {
            frames: Some(frame_tx),
            replies: reply_rx,
        },
        ChannelSource { rx: frame_rx },
        ChannelSink { tx: reply_tx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_to_source() {
        let (client, mut source, _sink) = channel_transport(4);

        client.send_frame("data:,AAAA").await.unwrap();
        assert_eq!(source.next_frame().await.unwrap().as_deref(), Some("data:,AAAA"));
    }

    #[tokio::test]
    async fn test_disconnect_ends_source() {
        let (mut client, mut source, _sink) = channel_transport(4);

        client.send_frame("queued").await.unwrap();
        client.disconnect();

        assert_eq!(source.next_frame().await.unwrap().as_deref(), Some("queued"));
        assert_eq!(source.next_frame().await.unwrap(), None);
        assert!(client.send_frame("late").await.is_err());
    }

    #[tokio::test]
    async fn test_replies_flow_to_client() {
        let (mut client, _source, sink) = channel_transport(4);

        sink.send_text("{}".to_string()).await.unwrap();
        assert_eq!(client.recv_reply().await.as_deref(), Some("{}"));
        assert!(client.try_recv_reply().is_none());
    }

    #[tokio::test]
    async fn test_sink_fails_after_client_dropped() {
        let (client, _source, sink) = channel_transport(4);
        drop(client);

        let err = sink.send_text("x".to_string()).await.unwrap_err();
        assert!(matches!(err, SignscribeError::Transport { .. }));
    }
}
