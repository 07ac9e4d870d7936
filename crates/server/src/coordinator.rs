use crate::directory::SessionDirectory;
use crate::errors::CoordinatorError;
use crate::events::{BattleWinner, ServerEvent};
use crate::gateway::BroadcastGateway;
use crate::matchmaking::ReadyQueue;
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::types::{BattleInfo, ConnectionId, Overview, ServerConfig};
use battle_core::{
    resolve, Action, ActionOutcome, BattleRules, DamageSource, PlayerId, RandomDamage, SessionId,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::Mutex;

/// Everything the coordinator mutates. Only ever touched with the
/// coordinator's lock held, so each inbound event runs to completion before
/// the next one starts.
struct CoordinatorInner {
    registry: ConnectionRegistry,
    queue: ReadyQueue,
    directory: SessionDirectory,
    dice: Box<dyn DamageSource>,
}

impl CoordinatorInner {
    fn register(&mut self, player: PlayerId, handle: ConnectionHandle) {
        let connection = handle.id();
        if let Some(old) = self.registry.register(player.clone(), handle) {
            tracing::info!(
                "Player {} reconnected: connection {} supersedes {}",
                player,
                connection.0,
                old.id().0
            );
        } else {
            tracing::info!("Player {} registered on connection {}", player, connection.0);
        }
    }

    fn declare_ready(&mut self, player: PlayerId, rules: &BattleRules) -> bool {
        if self.directory.contains_player(&player) {
            tracing::debug!("Player {} is already in a battle; readiness ignored", player);
            return false;
        }
        if self.queue.declare_ready(player.clone()) {
            tracing::debug!("Player {} is ready ({} waiting)", player, self.queue.len());
        }
        self.pair_waiting(rules);
        true
    }

    /// Pair waiting players two at a time until fewer than two remain.
    fn pair_waiting(&mut self, rules: &BattleRules) {
        while let Some((first, second)) = self.queue.pop_pair() {
            match self.directory.create(first, second, rules.max_health) {
                Ok(session) => {
                    let [a, b] = session.participants();
                    tracing::info!("{} started: {} vs {}", session.id(), a.player, b.player);
                    let gateway = BroadcastGateway::new(&self.registry);
                    gateway.notify_battle_start(session);
                    gateway.notify_turn(session);
                }
                Err(e) => tracing::warn!("Could not start battle: {}", e),
            }
        }
    }

    fn submit_action(
        &mut self,
        player: &PlayerId,
        connection: ConnectionId,
        action: Action,
        rules: &BattleRules,
    ) -> Result<Option<ActionOutcome>, CoordinatorError> {
        if !self.registry.is_live(player, connection) {
            tracing::debug!(
                "Dropped {:?} from {}: connection {} is not live",
                action,
                player,
                connection.0
            );
            return Ok(None);
        }
        let Some(session) = self.directory.find_mut(player) else {
            tracing::debug!("Dropped {:?} from {}: no active battle", action, player);
            return Ok(None);
        };
        let session_id = session.id();

        let outcome = match resolve(session, player, action, rules, &mut *self.dice) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                tracing::debug!("Dropped {:?} from {}: not their turn", action, player);
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("{} aborted while resolving {:?}: {}", session_id, action, e);
                self.end_session(session_id, BattleWinner::Aborted);
                return Err(e.into());
            }
        };

        let gateway = BroadcastGateway::new(&self.registry);
        match &outcome.winner {
            None => {
                gateway.notify_turn(session);
                gateway.notify_health(session);
            }
            Some(winner) => {
                gateway.notify_health(session);
                let loser = match session.opponent_of(winner) {
                    Ok(loser) => loser.clone(),
                    Err(e) => {
                        tracing::warn!("{} aborted at knockout: {}", session_id, e);
                        self.end_session(session_id, BattleWinner::Aborted);
                        return Err(e.into());
                    }
                };
                tracing::info!("{} won by {} over {}", session_id, winner, loser);
                self.end_session(session_id, BattleWinner::Player(winner.clone()));
            }
        }

        Ok(Some(outcome))
    }

    /// Destroy a session and tell both participants how it ended.
    fn end_session(&mut self, id: SessionId, winner: BattleWinner) -> bool {
        let Some(session) = self.directory.remove(id) else {
            return false;
        };
        BroadcastGateway::new(&self.registry).notify_battle_end(&session, &winner);
        tracing::info!("{} ended: {}", id, winner);
        true
    }

    fn reset_battle(
        &mut self,
        player: &PlayerId,
        connection: ConnectionId,
    ) -> Result<(), CoordinatorError> {
        if !self.registry.is_live(player, connection) {
            return Err(CoordinatorError::StaleConnection);
        }
        let id = self
            .directory
            .session_id_of(player)
            .ok_or(CoordinatorError::NoActiveSession)?;
        tracing::info!("Player {} reset {}", player, id);
        self.end_session(id, BattleWinner::Reset);
        Ok(())
    }

    fn unregister(&mut self, player: &PlayerId, connection: ConnectionId) -> bool {
        if !self.registry.unregister(player, connection) {
            return false;
        }
        tracing::info!("Player {} disconnected", player);
        if self.queue.remove(player) {
            tracing::debug!("Player {} left the ready queue", player);
        }
        if let Some(id) = self.directory.session_id_of(player) {
            self.end_session(id, BattleWinner::OpponentDisconnected);
        }
        true
    }
}

/// Pairs players, runs their battles and tears sessions down on victory,
/// reset or disconnect.
pub struct BattleCoordinator {
    pub config: ServerConfig,
    inner: Mutex<CoordinatorInner>,
    next_connection_id: AtomicU64,
}

impl BattleCoordinator {
    /// Create a coordinator rolling damage from a `StdRng`, seeded from
    /// `config.seed` when set.
    pub fn new(config: ServerConfig) -> Self {
        let dice = match config.seed {
            Some(seed) => RandomDamage::from_seed(seed),
            None => RandomDamage::from_entropy(),
        };
        Self::with_damage_source(config, Box::new(dice))
    }

    /// Create a coordinator with a caller-supplied damage source.
    pub fn with_damage_source(config: ServerConfig, dice: Box<dyn DamageSource>) -> Self {
        Self {
            config,
            inner: Mutex::new(CoordinatorInner {
                registry: ConnectionRegistry::new(),
                queue: ReadyQueue::new(),
                directory: SessionDirectory::new(),
                dice,
            }),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Open a new client connection. The `connected` event is already queued
    /// on the returned receiver.
    pub fn connect(&self) -> (ConnectionHandle, UnboundedReceiver<ServerEvent>) {
        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = unbounded_channel();
        let handle = ConnectionHandle::new(id, tx);
        handle.send(ServerEvent::Connected);
        tracing::debug!("Connection {} opened", id.0);
        (handle, rx)
    }

    /// Bind `player` to `handle`, replacing any earlier connection.
    pub async fn register(&self, player: PlayerId, handle: ConnectionHandle) {
        let mut inner = self.inner.lock().await;
        inner.register(player, handle);
    }

    /// Queue `player` for a battle and pair anyone waiting.
    /// Returns false if the player is already fighting.
    pub async fn declare_ready(&self, player: PlayerId) -> bool {
        let mut inner = self.inner.lock().await;
        inner.declare_ready(player, &self.config.rules)
    }

    /// Register and declare readiness in one step.
    pub async fn setup(&self, player: PlayerId, handle: ConnectionHandle) -> bool {
        let mut inner = self.inner.lock().await;
        inner.register(player.clone(), handle);
        inner.declare_ready(player, &self.config.rules)
    }

    /// Apply an attack or defend sent by `player` over `connection`.
    ///
    /// `Ok(None)` means the action was dropped: `connection` is not the
    /// player's live connection, the player has no battle, or it is not
    /// their turn. An `Err` means the battle hit an internal fault
    /// and has already been ended for both participants.
    pub async fn submit_action(
        &self,
        player: &PlayerId,
        connection: ConnectionId,
        action: Action,
    ) -> Result<Option<ActionOutcome>, CoordinatorError> {
        let mut inner = self.inner.lock().await;
        inner.submit_action(player, connection, action, &self.config.rules)
    }

    /// End the player's battle with a reset notice to both sides.
    pub async fn reset_battle(
        &self,
        player: &PlayerId,
        connection: ConnectionId,
    ) -> Result<(), CoordinatorError> {
        let mut inner = self.inner.lock().await;
        inner.reset_battle(player, connection)
    }

    /// Tear down `player` if `connection` is still their live connection.
    /// A superseded connection closing changes nothing.
    pub async fn unregister(&self, player: &PlayerId, connection: ConnectionId) -> bool {
        let mut inner = self.inner.lock().await;
        inner.unregister(player, connection)
    }

    /// Snapshot of the battle `player` is in, if any.
    pub async fn battle_of(&self, player: &PlayerId) -> Option<BattleInfo> {
        let inner = self.inner.lock().await;
        inner.directory.find(player).map(BattleInfo::from)
    }

    pub async fn is_waiting(&self, player: &PlayerId) -> bool {
        let inner = self.inner.lock().await;
        inner.queue.contains(player)
    }

    pub async fn overview(&self) -> Overview {
        let inner = self.inner.lock().await;
        let mut battles: Vec<BattleInfo> = inner.directory.iter().map(BattleInfo::from).collect();
        battles.sort_by_key(|b| b.session_id);
        Overview {
            connections: inner.registry.len(),
            waiting: inner.queue.waiting().cloned().collect(),
            battles,
        }
    }
}
