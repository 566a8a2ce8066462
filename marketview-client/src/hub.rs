//! Notification sources and the in-process [`NotificationHub`].
//!
//! A listing never reaches for a global listener registry. It is handed a
//! [`NotificationSource`], subscribes once, and gets back a [`Subscription`]
//! whose disposer removes the registration again.

use crate::error::ClientError;
use crate::event::{AppEventKind, PushNotification};
use crate::stream::EventStream;
use crate::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;

/// Callback that removes a subscription from its source.
pub type Disposer = Box<dyn FnOnce() + Send + Sync>;

/// Default per-subscription channel depth.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// A live registration with a notification source.
///
/// The registration is removed exactly once: by [`Subscription::unsubscribe`]
/// or, failing that, when the subscription is dropped.
pub struct Subscription {
    kinds: Vec<AppEventKind>,
    stream: EventStream,
    disposer: Option<Disposer>,
}

impl Subscription {
    /// Pair a stream with the disposer that unregisters it.
    #[must_use]
    pub fn new(kinds: Vec<AppEventKind>, stream: EventStream, disposer: Disposer) -> Self {
        Self {
            kinds,
            stream,
            disposer: Some(disposer),
        }
    }

    /// Kinds this subscription receives.
    #[must_use]
    pub fn kinds(&self) -> &[AppEventKind] {
        &self.kinds
    }

    /// Receive the next notification.
    ///
    /// Returns `None` once the source has closed the stream.
    pub async fn next(&mut self) -> Option<PushNotification> {
        self.stream.next().await
    }

    /// Access the underlying stream, e.g. for `StreamExt` combinators.
    pub fn stream_mut(&mut self) -> &mut EventStream {
        &mut self.stream
    }

    /// Remove the registration from the source.
    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kinds", &self.kinds)
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

/// Anything a listing can subscribe to for app lifecycle notifications.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Register interest in the given kinds.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is refused.
    async fn subscribe(&self, kinds: Vec<AppEventKind>) -> Result<Subscription>;
}

struct Subscriber {
    kinds: HashSet<AppEventKind>,
    sender: mpsc::Sender<PushNotification>,
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    closed: bool,
    subscribers: HashMap<u64, Subscriber>,
}

/// In-process fan-out of push notifications to subscribers.
///
/// Each subscriber gets its own bounded channel, so per-subscriber delivery
/// order equals publication order.
#[derive(Clone)]
pub struct NotificationHub {
    state: Arc<Mutex<HubState>>,
    buffer: usize,
}

fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NotificationHub {
    /// Create a hub whose subscriber channels hold `buffer` notifications.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            buffer: buffer.max(1),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }

    /// Deliver a notification to every subscriber of its kind.
    ///
    /// Returns the number of subscribers that received it. Notifications with
    /// an unknown event name reach nobody.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HubClosed`] after [`NotificationHub::close`].
    pub async fn publish(&self, notification: PushNotification) -> Result<usize> {
        let senders: Vec<mpsc::Sender<PushNotification>> = {
            let state = lock(&self.state);
            if state.closed {
                return Err(ClientError::HubClosed);
            }
            let Some(kind) = notification.kind() else {
                tracing::debug!("No subscribers for unknown event '{}'", notification.event);
                return Ok(0);
            };
            state
                .subscribers
                .values()
                .filter(|s| s.kinds.contains(&kind))
                .map(|s| s.sender.clone())
                .collect()
        };

        let mut delivered = 0;
        for sender in senders {
            if sender.send(notification.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Stop accepting publications and end every subscriber stream.
    ///
    /// Notifications already queued stay readable.
    pub fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.subscribers.clear();
    }

    fn unregister(state: &Weak<Mutex<HubState>>, id: u64) {
        if let Some(state) = state.upgrade()
            && lock(&state).subscribers.remove(&id).is_some()
        {
            tracing::debug!("Subscription {id} removed");
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

#[async_trait]
impl NotificationSource for NotificationHub {
    async fn subscribe(&self, kinds: Vec<AppEventKind>) -> Result<Subscription> {
        if kinds.is_empty() {
            return Err(ClientError::SubscriptionFailed(
                "no event kinds requested".to_string(),
            ));
        }

        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = {
            let mut state = lock(&self.state);
            if state.closed {
                return Err(ClientError::HubClosed);
            }
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.insert(
                id,
                Subscriber {
                    kinds: kinds.iter().copied().collect(),
                    sender,
                },
            );
            id
        };
        tracing::debug!("Subscription {id} registered for {kinds:?}");

        let weak = Arc::downgrade(&self.state);
        Ok(Subscription::new(
            kinds,
            EventStream::new(receiver),
            Box::new(move || Self::unregister(&weak, id)),
        ))
    }
}
