use crate::events::ServerEvent;
use crate::types::ConnectionId;
use battle_core::PlayerId;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// The ability to push events to one client.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: UnboundedSender<ServerEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event for the client. Returns false if the client has gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Maps each player to their live connection. Last writer wins.
#[derive(Default)]
pub struct ConnectionRegistry {
    handles: HashMap<PlayerId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` for `player`, returning the handle it superseded.
    /// Re-registering the same connection supersedes nothing.
    pub fn register(
        &mut self,
        player: PlayerId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let id = handle.id();
        self.handles
            .insert(player, handle)
            .filter(|old| old.id() != id)
    }

    /// Remove `player` only if `connection` is their live handle.
    pub fn unregister(&mut self, player: &PlayerId, connection: ConnectionId) -> bool {
        match self.handles.get(player) {
            Some(handle) if handle.id() == connection => {
                self.handles.remove(player);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, player: &PlayerId) -> Option<&ConnectionHandle> {
        self.handles.get(player)
    }

    pub fn is_live(&self, player: &PlayerId, connection: ConnectionId) -> bool {
        self.get(player).is_some_and(|h| h.id() == connection)
    }

    /// Send to `player` if connected. Returns whether the event was queued.
    pub fn send_to(&self, player: &PlayerId, event: ServerEvent) -> bool {
        self.handles
            .get(player)
            .is_some_and(|handle| handle.send(event))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
