use battle_core::{BattleSession, Health, InvariantViolation, PlayerId, SessionId};
use std::collections::HashMap;

/// Active sessions plus the player → session back-references. Both maps
/// change together; the back-references are never edited on their own.
pub struct SessionDirectory {
    sessions: HashMap<SessionId, BattleSession>,
    by_player: HashMap<PlayerId, SessionId>,
    next_session_id: u64,
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            by_player: HashMap::new(),
            next_session_id: 1,
        }
    }
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for two players, neither of whom may already be in
    /// one.
    pub fn create(
        &mut self,
        first: PlayerId,
        second: PlayerId,
        max_health: Health,
    ) -> Result<&BattleSession, InvariantViolation> {
        for player in [&first, &second] {
            if self.by_player.contains_key(player) {
                return Err(InvariantViolation::DuplicateParticipant(player.clone()));
            }
        }

        let id = SessionId(self.next_session_id);
        let session = BattleSession::new(id, first, second, max_health)?;
        self.next_session_id += 1;

        for participant in session.participants() {
            self.by_player.insert(participant.player.clone(), id);
        }
        Ok(&*self.sessions.entry(id).or_insert(session))
    }

    pub fn session_id_of(&self, player: &PlayerId) -> Option<SessionId> {
        self.by_player.get(player).copied()
    }

    pub fn find(&self, player: &PlayerId) -> Option<&BattleSession> {
        let id = self.by_player.get(player)?;
        self.sessions.get(id)
    }

    pub fn find_mut(&mut self, player: &PlayerId) -> Option<&mut BattleSession> {
        let id = self.by_player.get(player)?;
        self.sessions.get_mut(id)
    }

    pub fn contains_player(&self, player: &PlayerId) -> bool {
        self.by_player.contains_key(player)
    }

    /// Destroy a session and both of its back-references.
    pub fn remove(&mut self, id: SessionId) -> Option<BattleSession> {
        let session = self.sessions.remove(&id)?;
        for participant in session.participants() {
            self.by_player.remove(&participant.player);
        }
        Some(session)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
