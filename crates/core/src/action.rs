use crate::damage::DamageSource;
use crate::errors::ResolveError;
use crate::rules::BattleRules;
use crate::session::BattleSession;
use crate::types::{Health, PlayerId};

/// A move a participant can make on their turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Attack,
    Defend,
}

/// Result of an accepted action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: Action,
    /// Damage dealt for an attack, health restored for a defend.
    pub amount: Health,
    /// Set when this action ended the battle.
    pub winner: Option<PlayerId>,
}

/// Apply `action` from `requester` to `session`.
///
/// Returns `Ok(None)` when the requester does not hold the turn; the session
/// is left untouched. On an accepted action that leaves both participants
/// standing the turn passes to the opponent. An action that ends the battle
/// does not hand off.
pub fn resolve(
    session: &mut BattleSession,
    requester: &PlayerId,
    action: Action,
    rules: &BattleRules,
    dice: &mut dyn DamageSource,
) -> Result<Option<ActionOutcome>, ResolveError> {
    if session.is_over() || !session.is_turn_of(requester) {
        return Ok(None);
    }

    let seat = session.current_seat();
    let amount = match action {
        Action::Attack => {
            let damage = rules.damage.check(dice.roll(rules.damage))?;
            session.apply_damage(seat.other(), damage);
            damage
        }
        Action::Defend => session.apply_heal(seat, rules.heal_amount),
    };

    let winner = session.winner().cloned();
    if winner.is_none() {
        session.hand_off();
    }

    Ok(Some(ActionOutcome {
        action,
        amount,
        winner,
    }))
}
