use crate::damage::DamageRange;
use crate::types::Health;

/// Numbers that govern a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleRules {
    /// Starting and maximum health of each participant.
    pub max_health: Health,
    /// Inclusive damage range of an attack.
    pub damage: DamageRange,
    /// Health restored by a defend, before clamping to `max_health`.
    pub heal_amount: Health,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            max_health: 100,
            damage: DamageRange::default(),
            heal_amount: 10,
        }
    }
}
