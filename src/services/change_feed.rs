use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use mongodb::bson::Document;
use mongodb::Client;
use tokio::sync::broadcast;

use crate::db::mongo::GARDEN_DB;

/// An invalidation signal: something in `collection` changed. The payload
/// is never inspected; consumers re-fetch from the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal {
    pub collection: &'static str,
}

/// Fan-out of collection change notifications over a broadcast channel.
/// Each watched collection gets its own change-stream task; a failed stream
/// is reopened after a delay rather than taking the feed down.
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeSignal>,
}

const RESTART_DELAY: Duration = Duration::from_secs(5);

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeSignal> {
        self.tx.subscribe()
    }

    pub fn publish(&self, signal: ChangeSignal) {
        // No subscribers is fine; the send result only reports that.
        let _ = self.tx.send(signal);
    }

    /// Watch one collection's change stream and forward every event as an
    /// invalidation signal.
    pub fn watch(&self, client: Arc<Client>, collection: &'static str) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            loop {
                let coll = client
                    .database(GARDEN_DB)
                    .collection::<Document>(collection);
                match coll.watch().await {
                    Ok(mut stream) => {
                        log::info!("Watching {} for changes", collection);
                        while let Some(event) = stream.next().await {
                            match event {
                                Ok(_) => {
                                    let _ = tx.send(ChangeSignal { collection });
                                }
                                Err(err) => {
                                    log::warn!(
                                        "Change stream error on {}: {}",
                                        collection,
                                        err
                                    );
                                    break;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        log::warn!("Failed to open change stream on {}: {}", collection, err);
                    }
                }
                tokio::time::sleep(RESTART_DELAY).await;
            }
        });
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_signals() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();
        feed.publish(ChangeSignal {
            collection: "Accommodations",
        });
        let signal = rx.recv().await.unwrap();
        assert_eq!(signal.collection, "Accommodations");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_a_no_op() {
        let feed = ChangeFeed::new();
        feed.publish(ChangeSignal {
            collection: "SchedulingRules",
        });
        // A late subscriber starts fresh; the earlier signal is gone.
        let mut rx = feed.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
