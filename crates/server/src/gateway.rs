//! Pushes session state to the two participants of a session, and only them.

use crate::events::{BattleWinner, ServerEvent};
use crate::registry::ConnectionRegistry;
use battle_core::BattleSession;

/// Sends session-scoped events through the connection registry.
pub struct BroadcastGateway<'a> {
    registry: &'a ConnectionRegistry,
}

impl<'a> BroadcastGateway<'a> {
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self { registry }
    }

    fn to_both(&self, session: &BattleSession, event: ServerEvent) {
        for participant in session.participants() {
            self.registry.send_to(&participant.player, event.clone());
        }
    }

    pub fn notify_battle_start(&self, session: &BattleSession) {
        self.to_both(session, ServerEvent::BattleStart);
    }

    /// The turn counter plus whether it is now the recipient's turn.
    pub fn notify_turn(&self, session: &BattleSession) {
        for participant in session.participants() {
            self.registry.send_to(
                &participant.player,
                ServerEvent::TurnUpdate {
                    current_turn: session.turn_counter(),
                    player_turn: session.is_turn_of(&participant.player),
                },
            );
        }
    }

    /// Own health first, opponent's second, from each recipient's side.
    pub fn notify_health(&self, session: &BattleSession) {
        let [first, second] = session.participants();
        for (me, them) in [(first, second), (second, first)] {
            self.registry.send_to(
                &me.player,
                ServerEvent::HealthUpdate {
                    player_health: me.health,
                    opponent_health: them.health,
                },
            );
        }
    }

    pub fn notify_battle_end(&self, session: &BattleSession, winner: &BattleWinner) {
        self.to_both(
            session,
            ServerEvent::BattleEnd {
                winner: winner.clone(),
            },
        );
    }
}
