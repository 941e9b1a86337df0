//! One live connection per user, presence tracking, and best-effort pushes.
//!
//! Connections are represented by the sending half of an unbounded channel;
//! a writer task on the other end turns [`Outbound`] items into frames.
//! Pushing never blocks and never retries.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::BOT_USER_ID;
use crate::game::UserId;
use crate::matchmaking::MatchQueue;
use crate::protocol::Event;

/// Coarse connectivity shown to other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    Disconnected,
    Connected,
    Playing,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Presence::Disconnected => "Disconnected",
            Presence::Connected => "Connected",
            Presence::Playing => "Playing",
        };
        f.write_str(s)
    }
}

/// Item queued for a connection's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(Event),
    /// Stop writing and close, after sending the reason as an error frame.
    Close(String),
}

pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: u64,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn new() -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue an event. Returns `false` if the writer is gone.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(Outbound::Event(event)).is_ok()
    }

    pub fn close(&self, reason: impl Into<String>) {
        let _ = self.tx.send(Outbound::Close(reason.into()));
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Resolves once the writer side has shut down.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The user already has a live connection.
    AlreadyConnected(UserId),
    /// The id is reserved and cannot connect.
    ReservedUser(UserId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyConnected(user) => write!(f, "User {} is already connected", user),
            RegistryError::ReservedUser(user) => write!(f, "User id {} is reserved", user),
        }
    }
}

impl std::error::Error for RegistryError {}

struct Inner {
    connections: DashMap<UserId, ConnectionHandle>,
    presence: DashMap<UserId, Presence>,
    queue: MatchQueue,
}

/// Shared handle to the registry.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<Inner>,
}

impl ConnectionRegistry {
    /// The queue is needed so a departing user never stays queued.
    pub fn new(queue: MatchQueue) -> Self {
        Self {
            inner: Arc::new(Inner {
                connections: DashMap::new(),
                presence: DashMap::new(),
                queue,
            }),
        }
    }

    /// Record `handle` as `user`'s connection. A second concurrent
    /// registration is refused; the caller closes the new connection.
    pub fn register(&self, user: UserId, handle: ConnectionHandle) -> Result<(), RegistryError> {
        if user == BOT_USER_ID {
            return Err(RegistryError::ReservedUser(user));
        }
        match self.inner.connections.entry(user) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyConnected(user)),
            Entry::Vacant(slot) => {
                slot.insert(handle);
            }
        }
        self.inner.presence.insert(user, Presence::Connected);
        log::info!("user {} connected", user);
        self.broadcast_except(
            user,
            Event::UserStatus {
                user,
                presence: Presence::Connected,
            },
        );
        Ok(())
    }

    /// Drop `user`'s connection if it is still the one with
    /// `connection_id`. Closes it, clears presence and takes the user out of
    /// the matchmaking queue.
    pub fn unregister(&self, user: UserId, connection_id: u64) -> bool {
        let removed = self
            .inner
            .connections
            .remove_if(&user, |_, handle| handle.id() == connection_id);
        let Some((_, handle)) = removed else {
            return false;
        };
        if handle.is_open() {
            handle.close("Connection closed");
        }
        self.inner.presence.remove(&user);
        if self.inner.queue.cancel(user) {
            log::debug!("user {} removed from matchmaking on disconnect", user);
        }
        log::info!("user {} disconnected", user);
        self.broadcast_except(
            user,
            Event::UserStatus {
                user,
                presence: Presence::Disconnected,
            },
        );
        true
    }

    /// Best-effort push to `user`. Unknown users are skipped with a log line.
    pub fn notify(&self, user: UserId, event: Event) {
        let handle = self.inner.connections.get(&user).map(|h| h.value().clone());
        match handle {
            Some(handle) => {
                if !handle.send(event) {
                    log::debug!("connection of user {} is closing, event dropped", user);
                }
            }
            None => {
                if user != BOT_USER_ID {
                    log::debug!("user {} not connected, dropping {}", user, event.name());
                }
            }
        }
    }

    /// Push `event` to every registered user except `user`.
    pub fn broadcast_except(&self, user: UserId, event: Event) {
        let targets: Vec<ConnectionHandle> = self
            .inner
            .connections
            .iter()
            .filter(|entry| *entry.key() != user)
            .map(|entry| entry.value().clone())
            .collect();
        for handle in targets {
            handle.send(event.clone());
        }
    }

    /// Change a connected user's presence and tell everybody else.
    pub fn set_presence(&self, user: UserId, presence: Presence) {
        if !self.inner.connections.contains_key(&user) {
            return;
        }
        let previous = self.inner.presence.insert(user, presence);
        if previous != Some(presence) {
            self.broadcast_except(user, Event::UserStatus { user, presence });
        }
    }

    pub fn presence(&self, user: UserId) -> Presence {
        self.inner
            .presence
            .get(&user)
            .map(|p| *p.value())
            .unwrap_or(Presence::Disconnected)
    }

    pub fn is_connected(&self, user: UserId) -> bool {
        self.inner.connections.contains_key(&user)
    }

    pub fn connected_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.inner.connections.iter().map(|e| *e.key()).collect();
        users.sort_unstable();
        users
    }
}
