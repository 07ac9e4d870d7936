use battle_core::PlayerId;
use std::collections::{HashSet, VecDeque};

/// Players waiting for an opponent, in the order they declared readiness.
#[derive(Default)]
pub struct ReadyQueue {
    order: VecDeque<PlayerId>,
    queued: HashSet<PlayerId>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `player` to the back of the queue. A player already waiting keeps
    /// their place; returns false in that case.
    pub fn declare_ready(&mut self, player: PlayerId) -> bool {
        if !self.queued.insert(player.clone()) {
            return false;
        }
        self.order.push_back(player);
        true
    }

    /// Drop a pending readiness record.
    pub fn remove(&mut self, player: &PlayerId) -> bool {
        if !self.queued.remove(player) {
            return false;
        }
        self.order.retain(|p| p != player);
        true
    }

    /// Take the two longest-waiting players, first-ready first.
    pub fn pop_pair(&mut self) -> Option<(PlayerId, PlayerId)> {
        if self.order.len() < 2 {
            return None;
        }
        let first = self.order.pop_front()?;
        let second = self.order.pop_front()?;
        self.queued.remove(&first);
        self.queued.remove(&second);
        Some((first, second))
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.queued.contains(player)
    }

    pub fn waiting(&self) -> impl Iterator<Item = &PlayerId> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
