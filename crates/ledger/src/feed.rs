//! Live wallet snapshots.
//!
//! Subscribers get a `tokio::sync::watch` receiver carrying the latest
//! [`WalletsSnapshot`] for one owner. Watch semantics fit the use case: a
//! late or slow reader only ever sees the newest state, never a backlog of
//! intermediate ones.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::Wallet;

/// Complete wallet state of one owner at a point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WalletsSnapshot {
    pub taken_at: Option<DateTime<Utc>>,
    pub wallets: Vec<Wallet>,
}

impl WalletsSnapshot {
    #[must_use]
    pub fn new(wallets: Vec<Wallet>) -> Self {
        Self {
            taken_at: Some(Utc::now()),
            wallets,
        }
    }
}

/// Per-owner registry of snapshot channels.
///
/// Senders stay registered once created; publication is skipped while an
/// owner has no live receivers, so idle owners cost one map entry and no
/// queries.
#[derive(Default)]
pub(crate) struct WalletFeeds {
    senders: RwLock<HashMap<String, watch::Sender<WalletsSnapshot>>>,
}

impl WalletFeeds {
    /// Registers a receiver for `owner`, seeding the channel with `snapshot`.
    ///
    /// An existing channel is refreshed so the new subscriber starts from
    /// current state rather than the last published one.
    pub(crate) fn subscribe(
        &self,
        owner: &str,
        snapshot: WalletsSnapshot,
    ) -> watch::Receiver<WalletsSnapshot> {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        match senders.get(owner) {
            Some(sender) => {
                sender.send_replace(snapshot);
                sender.subscribe()
            }
            None => {
                let (sender, receiver) = watch::channel(snapshot);
                senders.insert(owner.to_string(), sender);
                receiver
            }
        }
    }

    /// Whether anyone is currently listening for `owner`.
    pub(crate) fn has_subscribers(&self, owner: &str) -> bool {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        senders
            .get(owner)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    /// Replaces the published snapshot for `owner`, if a channel exists.
    pub(crate) fn replace(&self, owner: &str, snapshot: WalletsSnapshot) {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = senders.get(owner) {
            sender.send_replace(snapshot);
        }
    }
}

impl fmt::Debug for WalletFeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletFeeds").finish_non_exhaustive()
    }
}
