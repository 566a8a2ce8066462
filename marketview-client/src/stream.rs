//! Event stream for receiving pushed notifications.

use crate::event::PushNotification;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// An async stream of notifications delivered to one subscription.
///
/// Notifications arrive in the order the source published them. The stream
/// ends once the source drops its sending side.
///
/// # Example
///
/// ```rust,ignore
/// let mut subscription = hub.subscribe(AppEventKind::ALL.to_vec()).await?;
///
/// while let Some(notification) = subscription.next().await {
///     println!("Received: {}", notification.event);
/// }
/// ```
pub struct EventStream {
    receiver: mpsc::Receiver<PushNotification>,
}

impl EventStream {
    /// Create a new event stream from a receiver channel.
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<PushNotification>) -> Self {
        Self { receiver }
    }

    /// Receive the next notification.
    ///
    /// Returns `None` if the stream is closed.
    pub async fn next(&mut self) -> Option<PushNotification> {
        self.receiver.recv().await
    }

    /// Try to receive the next notification without waiting.
    pub fn try_next(&mut self) -> Option<PushNotification> {
        self.receiver.try_recv().ok()
    }

    /// Close the stream. Already queued notifications can still be drained.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl Stream for EventStream {
    type Item = PushNotification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AppEventKind;

    #[tokio::test]
    async fn test_event_stream() -> Result<(), Box<dyn std::error::Error>> {
        let (tx, rx) = mpsc::channel(16);
        let mut stream = EventStream::new(rx);

        tx.send(PushNotification::new(AppEventKind::Removed, "giphy"))
            .await?;
        tx.send(PushNotification::new(AppEventKind::Added, "poll"))
            .await?;

        let first = stream.next().await.ok_or("stream ended unexpectedly")?;
        assert_eq!(first.kind(), Some(AppEventKind::Removed));
        let second = stream.try_next().ok_or("second notification missing")?;
        assert_eq!(second.kind(), Some(AppEventKind::Added));

        drop(tx);
        assert!(stream.next().await.is_none());
        Ok(())
    }
}
