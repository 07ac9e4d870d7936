use crate::types::{Health, PlayerId};
use std::fmt;

/// A session was observed in a state its construction rules forbid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Both seats would hold the same player.
    DuplicateParticipant(PlayerId),
    /// The player is not one of the session's two participants.
    NotParticipant(PlayerId),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::DuplicateParticipant(player) => {
                write!(f, "player {} cannot fight themselves", player)
            }
            InvariantViolation::NotParticipant(player) => {
                write!(f, "player {} is not a participant of this session", player)
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// A damage roll fell outside the configured inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutOfRange {
    pub rolled: Health,
    pub min: Health,
    pub max: Health,
}

impl fmt::Display for DamageOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "damage roll {} outside [{}, {}]",
            self.rolled, self.min, self.max
        )
    }
}

impl std::error::Error for DamageOutOfRange {}

/// Damage bounds with `min` above `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDamageRange {
    pub min: Health,
    pub max: Health,
}

impl fmt::Display for InvalidDamageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "damage range [{}, {}] is empty", self.min, self.max)
    }
}

impl std::error::Error for InvalidDamageRange {}

/// Error while resolving an action. Either variant is an internal fault,
/// never a client mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Invariant(InvariantViolation),
    Damage(DamageOutOfRange),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Invariant(e) => write!(f, "invariant violation: {}", e),
            ResolveError::Damage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<InvariantViolation> for ResolveError {
    fn from(e: InvariantViolation) -> Self {
        ResolveError::Invariant(e)
    }
}

impl From<DamageOutOfRange> for ResolveError {
    fn from(e: DamageOutOfRange) -> Self {
        ResolveError::Damage(e)
    }
}
