// BroadcastChannelManager: observer fan-out for engine state snapshots
// Single Responsibility: broadcast channel lifecycle and subscription

use futures::{future, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// Fans engine state snapshots out to every attached observer.
///
/// Each engine owns one manager for its snapshot type. Observers attach with
/// [`subscribe`](Self::subscribe) (or [`stream`](Self::stream)) when a UI
/// consumer mounts and detach simply by dropping the receiver on unmount;
/// the underlying channel lives as long as the engine does.
///
/// # Notes
/// - Publishing with no observers attached is not an error
/// - Slow observers lag and skip to the newest snapshots
pub struct BroadcastChannelManager<T> {
    label: &'static str,
    sender: broadcast::Sender<T>,
}

impl<T> BroadcastChannelManager<T>
where
    T: Clone + Send + 'static,
{
    /// Create a manager whose channel buffers `capacity` snapshots.
    pub fn new(label: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { label, sender }
    }

    /// Publish a snapshot, returning how many observers received it.
    pub fn publish(&self, value: T) -> usize {
        match self.sender.send(value) {
            Ok(receivers) => receivers,
            Err(_) => {
                log::trace!("[{}] No observers attached", self.label);
                0
            }
        }
    }

    /// Attach a new observer.
    ///
    /// The receiver only sees snapshots published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Attach a new observer as an async stream.
    ///
    /// Lagged gaps are logged and skipped rather than ending the stream.
    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static {
        let label = self.label;
        BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| {
            future::ready(match item {
                Ok(value) => Some(value),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    log::warn!("[{}] Observer lagged, skipped {} snapshots", label, skipped);
                    None
                }
            })
        })
    }

    /// Number of currently attached observers.
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
