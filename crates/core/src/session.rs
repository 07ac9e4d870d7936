use crate::errors::InvariantViolation;
use crate::types::{Health, PlayerId, Seat, SessionId, TurnCounter};

/// One participant and their current health.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub player: PlayerId,
    pub health: Health,
}

/// Authoritative state of a single two-player battle.
///
/// The two participants live in a fixed-size array so a session can never
/// hold any other number of players, and the turn is stored as a seat so it
/// always names one of them.
#[derive(Clone, Debug)]
pub struct BattleSession {
    id: SessionId,
    participants: [Participant; 2],
    current_turn: Seat,
    turn_counter: TurnCounter,
    max_health: Health,
}

impl BattleSession {
    /// Start a battle. `first` moves first; both begin at `max_health`.
    pub fn new(
        id: SessionId,
        first: PlayerId,
        second: PlayerId,
        max_health: Health,
    ) -> Result<Self, InvariantViolation> {
        if first == second {
            return Err(InvariantViolation::DuplicateParticipant(first));
        }
        Ok(Self {
            id,
            participants: [
                Participant {
                    player: first,
                    health: max_health,
                },
                Participant {
                    player: second,
                    health: max_health,
                },
            ],
            current_turn: Seat::First,
            turn_counter: 1,
            max_health,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    pub fn participant(&self, seat: Seat) -> &Participant {
        &self.participants[seat.index()]
    }

    pub fn turn_counter(&self) -> TurnCounter {
        self.turn_counter
    }

    pub fn current_seat(&self) -> Seat {
        self.current_turn
    }

    /// The player who may act next.
    pub fn current_turn(&self) -> &PlayerId {
        &self.participant(self.current_turn).player
    }

    pub fn is_turn_of(&self, player: &PlayerId) -> bool {
        self.current_turn() == player
    }

    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        [Seat::First, Seat::Second]
            .into_iter()
            .find(|&seat| &self.participant(seat).player == player)
    }

    pub fn health_of(&self, player: &PlayerId) -> Option<Health> {
        self.seat_of(player).map(|seat| self.participant(seat).health)
    }

    /// The other participant.
    pub fn opponent_of(&self, player: &PlayerId) -> Result<&PlayerId, InvariantViolation> {
        let seat = self
            .seat_of(player)
            .ok_or_else(|| InvariantViolation::NotParticipant(player.clone()))?;
        Ok(&self.participant(seat.other()).player)
    }

    /// True once either participant is at or below zero health.
    pub fn is_over(&self) -> bool {
        self.participants.iter().any(|p| p.health <= 0)
    }

    /// The winner of a finished battle: strictly greater health wins, and a
    /// tie goes to the first seat. `None` while the battle is still going.
    pub fn winner(&self) -> Option<&PlayerId> {
        if !self.is_over() {
            return None;
        }
        let [first, second] = &self.participants;
        if second.health > first.health {
            Some(&second.player)
        } else {
            Some(&first.player)
        }
    }

    pub(crate) fn apply_damage(&mut self, seat: Seat, amount: Health) {
        self.participants[seat.index()].health -= amount;
    }

    /// Heal up to `amount`, never above `max_health`. Returns the amount
    /// actually restored.
    pub(crate) fn apply_heal(&mut self, seat: Seat, amount: Health) -> Health {
        let max_health = self.max_health;
        let participant = &mut self.participants[seat.index()];
        let healed = amount.min(max_health - participant.health).max(0);
        participant.health += healed;
        healed
    }

    pub(crate) fn hand_off(&mut self) {
        self.current_turn = self.current_turn.other();
        self.turn_counter += 1;
    }

    #[cfg(test)]
    pub(crate) fn set_health(&mut self, seat: Seat, health: Health) {
        self.participants[seat.index()].health = health;
    }
}
