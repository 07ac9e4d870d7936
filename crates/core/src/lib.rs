pub mod action;
pub mod damage;
pub mod errors;
pub mod rules;
pub mod session;
pub mod types;

pub use action::{resolve, Action, ActionOutcome};
pub use damage::{DamageRange, DamageSource, RandomDamage};
pub use errors::{DamageOutOfRange, InvalidDamageRange, InvariantViolation, ResolveError};
pub use rules::BattleRules;
pub use session::{BattleSession, Participant};
pub use types::{Health, PlayerId, Seat, SessionId, TurnCounter};
