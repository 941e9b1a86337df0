//! Process-wide FIFO of users waiting for an opponent.
//!
//! Pure arrival order: no rating, no affinity. The queue is a cloneable
//! handle; every clone sees the same entries.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::game::UserId;

#[derive(Clone, Default)]
pub struct MatchQueue {
    waiting: Arc<Mutex<VecDeque<UserId>>>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<UserId>> {
        self.waiting.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add `user` at the back. Returns `false` if already queued.
    pub fn enqueue(&self, user: UserId) -> bool {
        let mut q = self.lock();
        if q.contains(&user) {
            return false;
        }
        q.push_back(user);
        true
    }

    /// Remove `user` if present, keeping everybody else in order.
    pub fn cancel(&self, user: UserId) -> bool {
        let mut q = self.lock();
        match q.iter().position(|u| *u == user) {
            Some(idx) => {
                q.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Pop pairs, oldest first, until fewer than two users remain. The
    /// first of each pair hosts.
    pub fn drain_pairs(&self) -> Vec<(UserId, UserId)> {
        self.drain_available_pairs(|_| true)
    }

    /// Like [`drain_pairs`](Self::drain_pairs), but users for whom
    /// `available` is false are dropped from the queue instead of paired.
    /// An unpaired leftover keeps its place at the front.
    pub fn drain_available_pairs<F>(&self, available: F) -> Vec<(UserId, UserId)>
    where
        F: Fn(UserId) -> bool,
    {
        let mut q = self.lock();
        let mut pairs = Vec::with_capacity(q.len() / 2);
        let mut host = None;
        while let Some(user) = q.pop_front() {
            if !available(user) {
                log::debug!("user {} left the matchmaking queue while busy", user);
                continue;
            }
            match host.take() {
                None => host = Some(user),
                Some(first) => pairs.push((first, user)),
            }
        }
        if let Some(first) = host {
            q.push_front(first);
        }
        pairs
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.lock().contains(&user)
    }

    /// Zero-based position of `user` in the queue.
    pub fn position(&self, user: UserId) -> Option<usize> {
        self.lock().iter().position(|u| *u == user)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
