use battle_core::{BattleRules, BattleSession, Health, PlayerId, SessionId, TurnCounter};
use serde::Serialize;

/// Identifies one client connection. Distinguishes a reconnect's new handle
/// from the one it superseded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Configuration for the battle coordinator.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub rules: BattleRules,
    /// Seed for damage rolls. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

/// One participant as shown in a battle snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParticipantInfo {
    pub player: PlayerId,
    pub health: Health,
}

/// Snapshot of an active battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BattleInfo {
    pub session_id: SessionId,
    pub participants: Vec<ParticipantInfo>,
    pub current_turn: PlayerId,
    pub turn_counter: TurnCounter,
}

impl From<&BattleSession> for BattleInfo {
    fn from(session: &BattleSession) -> Self {
        Self {
            session_id: session.id(),
            participants: session
                .participants()
                .iter()
                .map(|p| ParticipantInfo {
                    player: p.player.clone(),
                    health: p.health,
                })
                .collect(),
            current_turn: session.current_turn().clone(),
            turn_counter: session.turn_counter(),
        }
    }
}

/// Snapshot of the whole coordinator.
#[derive(Clone, Debug, Serialize)]
pub struct Overview {
    pub connections: usize,
    pub waiting: Vec<PlayerId>,
    pub battles: Vec<BattleInfo>,
}
